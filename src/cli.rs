//! CLI argument parser.
//!
//! One-shot mixing and analysis without the daemon; flags override the
//! environment-derived [`MixConfig`].

use std::path::PathBuf;

use clap::Parser;

use crate::config::MixConfig;
use crate::types::{MixMode, MixRequest};

/// djmix-daemon: tempo/key-aware DJ mixing over ffmpeg
#[derive(Parser, Debug)]
#[command(name = "djmix-daemon")]
#[command(about = "Tempo and key aware two-track mixing, with an overlay fallback")]
#[command(version)]
pub struct Cli {
    /// Track names (inside the uploads directory) to mix
    #[arg(short, long, num_args = 1..)]
    pub files: Vec<String>,

    /// Mixing mode; "smart" enables the aligned crossfade for two tracks
    #[arg(short, long, default_value = "")]
    pub mode: String,

    /// Directory holding source tracks and the canonical mix
    #[arg(short, long)]
    pub uploads_dir: Option<PathBuf>,

    /// ffmpeg executable
    #[arg(long)]
    pub ffmpeg: Option<PathBuf>,

    /// Print the feature analysis of an audio file as JSON
    #[arg(short, long)]
    pub analyze: Option<PathBuf>,

    /// List mixable tracks in the uploads directory
    #[arg(short, long)]
    pub list: bool,

    /// Never use the rubberband filter
    #[arg(long)]
    pub no_high_quality: bool,

    /// Run in daemon mode (JSON-RPC over stdio)
    #[arg(long)]
    pub daemon: bool,
}

impl Cli {
    /// Parses command-line arguments.
    pub fn parse_args() -> Self {
        Cli::parse()
    }

    /// Returns true if running in daemon mode.
    pub fn is_daemon_mode(&self) -> bool {
        self.daemon
    }

    /// Returns true if a one-shot mix was requested.
    pub fn is_mix_mode(&self) -> bool {
        !self.daemon && !self.files.is_empty()
    }

    /// Builds the mix request from `--files` and `--mode`.
    pub fn mix_request(&self) -> MixRequest {
        MixRequest::new(self.files.clone(), MixMode::parse(&self.mode))
    }

    /// Applies flag overrides on top of `config`.
    pub fn apply_to(&self, mut config: MixConfig) -> MixConfig {
        if let Some(ref dir) = self.uploads_dir {
            config.uploads_dir = Some(dir.clone());
        }
        if let Some(ref ffmpeg) = self.ffmpeg {
            config.ffmpeg_path = ffmpeg.clone();
        }
        if self.no_high_quality {
            config.prefer_high_quality = false;
        }
        config
    }
}
