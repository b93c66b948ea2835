//! Track reference type.
//!
//! A TrackRef names one caller-provided source file inside the uploads
//! directory. Names are reduced to their base name before resolution so a
//! request can never reach outside that directory.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{MixError, Result};

/// Audio file extensions accepted as mix inputs.
pub const ALLOWED_EXTENSIONS: &[&str] = &["mp3", "wav", "m4a", "flac", "aac", "ogg"];

/// An immutable reference to a source track.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackRef {
    /// Full filesystem path to the source file.
    pub path: PathBuf,

    /// Display name (base name of the file).
    pub name: String,
}

impl TrackRef {
    /// Resolves a caller-supplied name against the uploads directory.
    ///
    /// Fails with NOT_FOUND if the sanitized file does not exist.
    pub fn resolve(uploads_dir: &Path, raw_name: &str) -> Result<Self> {
        let name = sanitize_name(raw_name)
            .ok_or_else(|| MixError::bad_request(format!("Invalid file name: {:?}", raw_name)))?;
        let path = uploads_dir.join(&name);
        if !path.is_file() {
            return Err(MixError::not_found(name));
        }
        Ok(Self { path, name })
    }

    /// Wraps an existing path, e.g. one passed on the command line.
    pub fn from_path(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or_else(|| MixError::bad_request(format!("Invalid file path: {}", path.display())))?;
        if !path.is_file() {
            return Err(MixError::not_found(name));
        }
        Ok(Self { path, name })
    }
}

/// Returns the base-name component of a caller-supplied file name.
///
/// Both `/` and `\` count as separators. Returns None for names that
/// are empty or consist only of `.`/`..` after stripping.
pub fn sanitize_name(raw: &str) -> Option<String> {
    let base = raw.rsplit(['/', '\\']).next().unwrap_or("").trim();
    if base.is_empty() || base == "." || base == ".." {
        return None;
    }
    Some(base.to_string())
}

/// Returns true if the file has one of the allowed audio extensions.
pub fn has_audio_extension(name: &str) -> bool {
    Path::new(name)
        .extension()
        .map(|ext| {
            let ext = ext.to_string_lossy().to_lowercase();
            ALLOWED_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn sanitize_strips_directories() {
        assert_eq!(sanitize_name("song.mp3").as_deref(), Some("song.mp3"));
        assert_eq!(sanitize_name("../../etc/passwd").as_deref(), Some("passwd"));
        assert_eq!(sanitize_name("..\\secret.wav").as_deref(), Some("secret.wav"));
        assert_eq!(sanitize_name("a/b/"), None);
        assert_eq!(sanitize_name(".."), None);
        assert_eq!(sanitize_name(""), None);
    }

    #[test]
    fn audio_extensions() {
        assert!(has_audio_extension("a.mp3"));
        assert!(has_audio_extension("B.FLAC"));
        assert!(!has_audio_extension("notes.txt"));
        assert!(!has_audio_extension("noext"));
    }

    #[test]
    fn resolve_existing_and_missing() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("a.mp3"), b"x").unwrap();

        let track = TrackRef::resolve(dir.path(), "../a.mp3").unwrap();
        assert_eq!(track.name, "a.mp3");
        assert_eq!(track.path, dir.path().join("a.mp3"));

        let err = TrackRef::resolve(dir.path(), "b.mp3").unwrap_err();
        assert_eq!(err.status(), 404);
        assert!(err.message.contains("b.mp3"));
    }
}
