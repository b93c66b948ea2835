//! djmix-daemon: tempo/key-aware DJ mixing over ffmpeg.
//!
//! Given two or more uploaded tracks, the daemon produces one MP3 in a
//! fixed slot of the uploads directory. Two tracks in smart mode are
//! analyzed, stretched to a shared tempo, transposed to a shared pitch class
//! and crossfaded; anything else goes to an optional remote mixing service
//! or a local overlay.
//!
//! # Modules
//!
//! - [`mixing`]: Orchestrator, planner, renderer, composer, multiplexer
//! - [`analysis`]: Tempo and key estimation
//! - [`toolkit`]: ffmpeg invocation and capability probing
//! - [`types`]: Core data types (TrackRef, PitchClass, MixRequest)
//! - [`config`]: Runtime configuration (MixConfig)
//! - [`error`]: Error types and codes (MixError, ErrorCode)
//!
//! # Example
//!
//! ```rust,ignore
//! use djmix_daemon::{MixConfig, MixMode, MixOrchestrator, MixRequest};
//!
//! let mut config = MixConfig::from_env();
//! config.uploads_dir = Some("./uploads".into());
//!
//! let orchestrator = MixOrchestrator::new(config);
//! let artifact = orchestrator.mix(&MixRequest::new(
//!     vec!["a.mp3".to_string(), "b.mp3".to_string()],
//!     MixMode::Smart,
//! ))?;
//! println!("{} ({})", artifact.path.display(), artifact.strategy);
//! ```

pub mod analysis;
pub mod audio;
pub mod cli;
pub mod config;
pub mod error;
pub mod mixing;
pub mod rpc;
pub mod toolkit;
pub mod types;

#[cfg(test)]
mod test_support;

// Re-export commonly used types at crate root for convenience
pub use config::MixConfig;
pub use error::{ErrorCode, MixError, Result};
pub use mixing::{MixArtifact, MixOrchestrator, MixStrategy, CANONICAL_MIX_NAME};
pub use types::{AudioFeatures, MixMode, MixRequest, PitchClass, TrackRef};
