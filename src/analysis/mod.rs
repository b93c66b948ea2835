//! Track analysis module.
//!
//! Estimates tempo and pitch class from a bounded, toolkit-decoded sample:
//! - [`decode`]: bounded decode + resampling to the analysis rate
//! - [`tempo`]: spectral-flux / autocorrelation BPM estimate
//! - [`key`]: chroma-centroid pitch class estimate
//!
//! Results are recomputed on every request and never cached.

pub mod decode;
pub mod key;
pub mod spectrum;
pub mod tempo;

pub use decode::{decode_bounded, ANALYSIS_SAMPLE_RATE};
pub use key::{chroma_mean, dominant_class, estimate_key};
pub use tempo::estimate_bpm;

use crate::config::AnalysisConfig;
use crate::error::Result;
use crate::toolkit::Toolkit;
use crate::types::{AudioFeatures, TrackAnalysis, TrackRef};

const ENERGY_FRAME: usize = 2048;
const ENERGY_HOP: usize = 512;

/// Extracts [`AudioFeatures`] from source tracks.
#[derive(Debug, Clone)]
pub struct FeatureExtractor {
    toolkit: Toolkit,
    config: AnalysisConfig,
}

impl FeatureExtractor {
    pub fn new(toolkit: Toolkit, config: AnalysisConfig) -> Self {
        Self { toolkit, config }
    }

    /// Estimates tempo and key of `track`.
    ///
    /// A decode failure is returned as DECODE_ERROR; a non-positive tempo
    /// estimate is replaced by 120 BPM.
    pub fn extract(&self, track: &TrackRef) -> Result<AudioFeatures> {
        let pcm = decode_bounded(&self.toolkit, track, self.decode_window())?;
        let bpm = estimate_bpm(&pcm.samples, pcm.sample_rate);
        let key = estimate_key(self.key_slice(&pcm.samples), pcm.sample_rate);

        let features = AudioFeatures::new(bpm, key);
        log::info!(
            "{}: {:.1} BPM (raw {:.1}), key {}",
            track.name,
            features.bpm,
            bpm,
            features.key
        );
        Ok(features)
    }

    /// Full analysis for the external feature store.
    pub fn analyze(&self, track: &TrackRef) -> Result<TrackAnalysis> {
        let pcm = decode_bounded(&self.toolkit, track, self.decode_window())?;
        let bpm = estimate_bpm(&pcm.samples, pcm.sample_rate);
        let chroma = chroma_mean(self.key_slice(&pcm.samples), pcm.sample_rate);
        let features = AudioFeatures::new(bpm, dominant_class(&chroma));

        Ok(TrackAnalysis {
            name: track.name.clone(),
            bpm: features.bpm,
            key: features.key,
            energy: relative_energy(&pcm.samples),
            chroma_mean: chroma,
            duration_sec: pcm.duration_sec(),
        })
    }

    fn decode_window(&self) -> u32 {
        self.config.bpm_window_sec.max(self.config.key_window_sec)
    }

    fn key_slice<'a>(&self, samples: &'a [f32]) -> &'a [f32] {
        let len = self.config.key_window_sec as usize * ANALYSIS_SAMPLE_RATE as usize;
        &samples[..len.min(samples.len())]
    }
}

/// Mean frame RMS divided by the absolute peak, clipped to [0, 1].
pub fn relative_energy(samples: &[f32]) -> f32 {
    let peak = samples.iter().fold(0.0f32, |m, s| m.max(s.abs()));
    if peak <= 0.0 {
        return 0.0;
    }

    let frames: Vec<f32> = if samples.len() < ENERGY_FRAME {
        vec![rms(samples)]
    } else {
        samples
            .windows(ENERGY_FRAME)
            .step_by(ENERGY_HOP)
            .map(rms)
            .collect()
    };
    let mean = frames.iter().sum::<f32>() / frames.len() as f32;
    (mean / (peak + 1e-9)).clamp(0.0, 1.0)
}

fn rms(frame: &[f32]) -> f32 {
    if frame.is_empty() {
        return 0.0;
    }
    (frame.iter().map(|s| s * s).sum::<f32>() / frame.len() as f32).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support;
    use crate::types::PitchClass;

    #[test]
    fn energy_of_full_scale_square_is_one() {
        let samples: Vec<f32> = (0..8192).map(|i| if i % 2 == 0 { 1.0 } else { -1.0 }).collect();
        assert!((relative_energy(&samples) - 1.0).abs() < 1e-3);
    }

    #[test]
    fn energy_of_sine_is_inverse_sqrt2() {
        let samples: Vec<f32> = (0..22050)
            .map(|i| 0.5 * (2.0 * std::f32::consts::PI * 440.0 * i as f32 / 22050.0).sin())
            .collect();
        let energy = relative_energy(&samples);
        assert!((energy - std::f32::consts::FRAC_1_SQRT_2).abs() < 0.01, "energy = {}", energy);
    }

    #[test]
    fn energy_of_silence_is_zero() {
        assert_eq!(relative_energy(&[0.0; 4096]), 0.0);
        assert_eq!(relative_energy(&[]), 0.0);
    }

    #[test]
    fn key_slice_is_bounded() {
        let extractor = FeatureExtractor::new(
            Toolkit::new("ffmpeg"),
            AnalysisConfig {
                bpm_window_sec: 120,
                key_window_sec: 1,
            },
        );
        let samples = vec![0.0f32; ANALYSIS_SAMPLE_RATE as usize * 3];
        assert_eq!(extractor.key_slice(&samples).len(), ANALYSIS_SAMPLE_RATE as usize);
        assert_eq!(extractor.key_slice(&samples[..10]).len(), 10);
        assert_eq!(extractor.decode_window(), 120);
    }

    #[test]
    fn missing_toolkit_is_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.wav");
        crate::audio::write_wav(&[0.0; 100], &path, 44100, 1).unwrap();
        let track = TrackRef::from_path(&path).unwrap();

        let extractor =
            FeatureExtractor::new(Toolkit::new("/nonexistent/djmix-ffmpeg"), AnalysisConfig::default());
        let err = extractor.extract(&track).unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::DecodeError);
    }

    #[test]
    fn extracts_click_track_features() {
        if !test_support::ffmpeg_available() {
            eprintln!("Skipping test: ffmpeg not found");
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clicks.wav");
        test_support::write_click_track(&path, 120.0, 440.0, 20.0);
        let track = TrackRef::from_path(&path).unwrap();

        let extractor = FeatureExtractor::new(Toolkit::new("ffmpeg"), AnalysisConfig::default());
        let features = extractor.extract(&track).unwrap();
        assert!((features.bpm - 120.0).abs() < 3.0, "bpm = {}", features.bpm);
        assert_eq!(features.key, PitchClass::A);

        let analysis = extractor.analyze(&track).unwrap();
        assert_eq!(analysis.name, "clicks.wav");
        assert!((analysis.duration_sec - 20.0).abs() < 0.1);
        assert!(analysis.energy > 0.0 && analysis.energy <= 1.0);
    }
}
