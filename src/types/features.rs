//! Per-track analysis results.
//!
//! Both types are derived per request and never cached by the core.

use serde::{Deserialize, Serialize};

use super::key::PitchClass;

/// Fallback tempo when beat tracking yields nothing usable.
pub const DEFAULT_BPM: f64 = 120.0;

/// Tempo and tonal centre of one track.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AudioFeatures {
    /// Estimated tempo, always > 0.
    pub bpm: f64,

    /// Pitch class with maximum mean chroma energy.
    pub key: PitchClass,
}

impl AudioFeatures {
    /// Creates features, replacing a non-positive or non-finite tempo with
    /// [`DEFAULT_BPM`].
    pub fn new(bpm: f64, key: PitchClass) -> Self {
        let bpm = if bpm.is_finite() && bpm > 0.0 { bpm } else { DEFAULT_BPM };
        Self { bpm, key }
    }
}

/// Extended analysis handed to the external feature store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackAnalysis {
    /// Track display name.
    pub name: String,

    pub bpm: f64,

    pub key: PitchClass,

    /// Mean frame RMS relative to the sample peak, in [0, 1].
    pub energy: f32,

    /// Time-averaged chroma profile (C..B).
    pub chroma_mean: [f32; 12],

    /// Duration of the analysed (bounded) sample in seconds.
    pub duration_sec: f32,
}

impl TrackAnalysis {
    /// The subset used by the alignment planner.
    pub fn features(&self) -> AudioFeatures {
        AudioFeatures::new(self.bpm, self.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_positive_bpm_defaults() {
        assert_eq!(AudioFeatures::new(0.0, PitchClass::C).bpm, DEFAULT_BPM);
        assert_eq!(AudioFeatures::new(-3.0, PitchClass::C).bpm, DEFAULT_BPM);
        assert_eq!(AudioFeatures::new(f64::NAN, PitchClass::C).bpm, DEFAULT_BPM);
        assert_eq!(AudioFeatures::new(128.0, PitchClass::A).bpm, 128.0);
    }
}
