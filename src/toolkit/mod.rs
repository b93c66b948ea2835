//! External toolkit (ffmpeg) access.
//!
//! Provides blocking invocation and capability probing.

pub mod command;
pub mod probe;

// Re-export commonly used items
pub use command::{InvocationError, Toolkit};
pub use probe::{Capabilities, RUBBERBAND_FILTER};
