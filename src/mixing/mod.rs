//! Mixing pipeline.
//!
//! - [`planner`]: shared tempo and per-track tempo/pitch adjustments
//! - [`renderer`]: per-track stretch + loudness render with fallback
//! - [`composer`]: two-track crossfade into MP3
//! - [`multiplex`]: equal-weight overlay of N tracks
//! - [`remote`]: optional remote mixing service
//! - [`artifact`]: staging and the canonical output slot
//! - [`orchestrator`]: request state machine tying it together

pub mod artifact;
pub mod composer;
pub mod multiplex;
pub mod orchestrator;
pub mod planner;
pub mod remote;
pub mod renderer;

pub use artifact::{MixArtifact, MixStrategy, CANONICAL_MIX_NAME};
pub use composer::{CrossfadeComposer, CrossfadeWindow};
pub use multiplex::NaiveMultiplexer;
pub use orchestrator::{MixOrchestrator, MixStage, TrackListing};
pub use planner::{plan_alignment, AlignmentPlan, TrackAdjustment};
pub use remote::RemoteMixer;
pub use renderer::{RenderedTrack, StretchMethod, TrackRenderer};
