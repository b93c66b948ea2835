//! Core types for djmix-daemon.
//!
//! This module re-exports the data types shared by the pipeline:
//! - [`TrackRef`]: A caller-provided source file
//! - [`PitchClass`]: One of 12 chroma categories
//! - [`AudioFeatures`] / [`TrackAnalysis`]: Per-request analysis results
//! - [`MixRequest`]: The request contract from the calling layer

mod features;
mod key;
mod request;
mod track;

// Re-export all types at the module level
pub use features::{AudioFeatures, TrackAnalysis, DEFAULT_BPM};
pub use key::PitchClass;
pub use request::{MixMode, MixRequest};
pub use track::{has_audio_extension, sanitize_name, TrackRef, ALLOWED_EXTENSIONS};
