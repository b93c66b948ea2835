//! Tempo and pitch alignment planning for two tracks.
//!
//! Track A is the reference: it keeps its pitch and both tracks are
//! stretched to the mean tempo. Track B is transposed onto A's pitch class.

use serde::Serialize;

use crate::types::AudioFeatures;

/// Lower bound of the shared target tempo.
pub const MIN_TARGET_BPM: u32 = 70;

/// Upper bound of the shared target tempo.
pub const MAX_TARGET_BPM: u32 = 180;

/// Tempo/pitch adjustment applied to one track.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrackAdjustment {
    /// Playback speed factor (> 1 speeds up). Always > 0.
    pub tempo_ratio: f64,

    /// Transposition in semitones, in [-6, 6].
    pub semitone_shift: i32,
}

impl TrackAdjustment {
    /// No change.
    pub fn identity() -> Self {
        Self {
            tempo_ratio: 1.0,
            semitone_shift: 0,
        }
    }

    /// Pitch factor corresponding to the semitone shift.
    pub fn pitch_factor(&self) -> f64 {
        2f64.powf(self.semitone_shift as f64 / 12.0)
    }
}

/// Shared tempo and per-track adjustments for a two-track mix.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AlignmentPlan {
    /// Shared tempo, in [70, 180].
    pub target_bpm: u32,

    /// Adjustment for the reference track.
    pub a: TrackAdjustment,

    /// Adjustment for the incoming track.
    pub b: TrackAdjustment,
}

/// Derives the alignment plan from the features of A (reference) and B.
pub fn plan_alignment(a: &AudioFeatures, b: &AudioFeatures) -> AlignmentPlan {
    let target_bpm = target_tempo(a.bpm, b.bpm);

    AlignmentPlan {
        target_bpm,
        a: TrackAdjustment {
            tempo_ratio: tempo_ratio(target_bpm, a.bpm),
            semitone_shift: 0,
        },
        b: TrackAdjustment {
            tempo_ratio: tempo_ratio(target_bpm, b.bpm),
            semitone_shift: b.key.semitones_to(a.key),
        },
    }
}

/// `clamp(round(mean(a, b)), 70, 180)`
pub fn target_tempo(bpm_a: f64, bpm_b: f64) -> u32 {
    let mean = (bpm_a + bpm_b) / 2.0;
    if !mean.is_finite() {
        return MIN_TARGET_BPM;
    }
    (mean.round().max(0.0) as u32).clamp(MIN_TARGET_BPM, MAX_TARGET_BPM)
}

/// `target / bpm`, or 1.0 for a non-positive source tempo.
pub fn tempo_ratio(target_bpm: u32, bpm: f64) -> f64 {
    if bpm > 0.0 && bpm.is_finite() {
        target_bpm as f64 / bpm
    } else {
        1.0
    }
}
