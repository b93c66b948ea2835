//! Mixer configuration module.
//!
//! Contains the runtime configuration for djmix-daemon: uploads directory,
//! toolkit location, analysis windows, and the optional remote mixing
//! endpoint. The configuration is built once at startup and handed to the
//! [`MixOrchestrator`](crate::mixing::MixOrchestrator) explicitly.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default ffmpeg executable, resolved through PATH.
pub const DEFAULT_FFMPEG: &str = "ffmpeg";

/// Markers that identify an unconfigured endpoint copied from a template.
const PLACEHOLDER_MARKERS: &[&str] = &["tu-endpoint", "your-endpoint", "example.com"];

/// Remote mixing service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Endpoint receiving the multipart upload.
    pub endpoint: Option<String>,

    /// Bearer token sent in the Authorization header.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,

    /// Request timeout in seconds.
    /// Default: 120
    pub timeout_sec: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_key: None,
            timeout_sec: 120,
        }
    }
}

impl RemoteConfig {
    /// Returns true when both a key and a non-placeholder endpoint are set.
    pub fn is_usable(&self) -> bool {
        let has_key = self.api_key.as_deref().is_some_and(|k| !k.is_empty());
        has_key && self.endpoint.as_deref().is_some_and(endpoint_looks_valid)
    }
}

/// Returns true if the URL plausibly points at a real HTTP service.
pub fn endpoint_looks_valid(url: &str) -> bool {
    let url = url.trim().to_lowercase();
    if url.is_empty() || url.starts_with('<') || !url.starts_with("http") {
        return false;
    }
    !PLACEHOLDER_MARKERS.iter().any(|m| url.contains(m))
}

/// Bounded analysis windows for the feature extractor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Seconds decoded for tempo estimation. Also bounds the whole decode.
    /// Default: 120
    pub bpm_window_sec: u32,

    /// Seconds (from the start) used for key estimation.
    /// Default: 90
    pub key_window_sec: u32,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            bpm_window_sec: 120,
            key_window_sec: 90,
        }
    }
}

/// Runtime configuration for the mixer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MixConfig {
    /// Directory holding source tracks and the canonical mix.
    /// If None, uses the platform-specific default data location.
    pub uploads_dir: Option<PathBuf>,

    /// ffmpeg executable name or path.
    pub ffmpeg_path: PathBuf,

    /// Prefer the rubberband time-stretch filter when the host has it.
    pub prefer_high_quality: bool,

    /// Analysis windows.
    pub analysis: AnalysisConfig,

    /// Optional remote mixing service.
    pub remote: RemoteConfig,
}

impl Default for MixConfig {
    fn default() -> Self {
        Self {
            uploads_dir: None,
            ffmpeg_path: PathBuf::from(DEFAULT_FFMPEG),
            prefer_high_quality: true,
            analysis: AnalysisConfig::default(),
            remote: RemoteConfig::default(),
        }
    }
}

impl MixConfig {
    /// Creates a new MixConfig with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a MixConfig from environment variables.
    ///
    /// Reads the following environment variables:
    /// - `DJMIX_UPLOADS_DIR` - Directory with tracks and the canonical mix
    /// - `DJMIX_FFMPEG` - ffmpeg executable
    /// - `DJMIX_HIGH_QUALITY` - `0`/`false` disables rubberband
    /// - `DJMIX_BPM_WINDOW` - Seconds decoded for tempo analysis
    /// - `DJMIX_KEY_WINDOW` - Seconds used for key analysis
    /// - `DJMIX_REMOTE_ENDPOINT` - Remote mixing endpoint URL
    /// - `DJMIX_REMOTE_API_KEY` - Remote mixing bearer token
    /// - `DJMIX_REMOTE_TIMEOUT` - Remote request timeout in seconds
    ///
    /// Falls back to defaults for unset or unparsable variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(path) = env_value("DJMIX_UPLOADS_DIR") {
            config.uploads_dir = Some(PathBuf::from(path));
        }

        if let Some(path) = env_value("DJMIX_FFMPEG") {
            config.ffmpeg_path = PathBuf::from(path);
        }

        if let Some(flag) = env_value("DJMIX_HIGH_QUALITY") {
            config.prefer_high_quality = !matches!(flag.to_lowercase().as_str(), "0" | "false" | "no" | "off");
        }

        if let Some(secs) = env_value("DJMIX_BPM_WINDOW").and_then(|s| s.parse::<u32>().ok()) {
            if (10..=600).contains(&secs) {
                config.analysis.bpm_window_sec = secs;
            }
        }

        if let Some(secs) = env_value("DJMIX_KEY_WINDOW").and_then(|s| s.parse::<u32>().ok()) {
            if (10..=600).contains(&secs) {
                config.analysis.key_window_sec = secs;
            }
        }

        config.remote.endpoint = env_value("DJMIX_REMOTE_ENDPOINT");
        config.remote.api_key = env_value("DJMIX_REMOTE_API_KEY");

        if let Some(secs) = env_value("DJMIX_REMOTE_TIMEOUT").and_then(|s| s.parse::<u64>().ok()) {
            if secs > 0 {
                config.remote.timeout_sec = secs;
            }
        }

        config
    }

    /// Returns the effective uploads directory, using platform defaults if not specified.
    pub fn effective_uploads_dir(&self) -> PathBuf {
        if let Some(ref path) = self.uploads_dir {
            path.clone()
        } else {
            default_uploads_path()
        }
    }

    /// Validates the configuration.
    ///
    /// Returns an error message if validation fails, None otherwise.
    pub fn validate(&self) -> Option<String> {
        if self.ffmpeg_path.as_os_str().is_empty() {
            return Some("ffmpeg path cannot be empty".to_string());
        }

        if self.analysis.bpm_window_sec == 0 || self.analysis.key_window_sec == 0 {
            return Some("analysis windows must be > 0 seconds".to_string());
        }

        if self.remote.timeout_sec == 0 {
            return Some("remote timeout must be > 0 seconds".to_string());
        }

        None
    }
}

/// Reads an environment variable, trimming whitespace and surrounding quotes.
///
/// Empty values count as unset.
fn env_value(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| clean_value(&v))
        .filter(|v| !v.is_empty())
}

fn clean_value(raw: &str) -> String {
    raw.trim().trim_matches(|c| c == '\'' || c == '"').to_string()
}

/// Returns the platform-specific default uploads path.
///
/// - macOS: ~/Library/Application Support/djmix/uploads
/// - Linux: ~/.local/share/djmix/uploads
/// - Windows: C:\Users\<user>\AppData\Roaming\djmix\data\uploads
fn default_uploads_path() -> PathBuf {
    if let Some(proj_dirs) = directories::ProjectDirs::from("", "", "djmix") {
        proj_dirs.data_dir().join("uploads")
    } else {
        // Fallback to current directory
        PathBuf::from("./uploads")
    }
}
