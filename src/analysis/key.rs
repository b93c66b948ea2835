//! Pitch-class ("key") estimation.
//!
//! Averages a per-frame chroma profile over time and picks the class with
//! the highest mean energy. This is a centroid heuristic: it does not match
//! key profiles and cannot tell major from minor.

use crate::types::PitchClass;

use super::spectrum::Stft;

const WINDOW_SIZE: usize = 4096;
const HOP_SIZE: usize = 2048;

/// Lowest frequency folded into the chroma (C2).
const MIN_FREQ: f32 = 65.0;
/// Highest frequency folded into the chroma (~C7).
const MAX_FREQ: f32 = 2100.0;

/// Time-averaged chroma profile, index 0 = C.
///
/// Each frame is normalized by its strongest class before averaging so
/// loud passages do not dominate. Silent frames contribute zeros.
pub fn chroma_mean(samples: &[f32], sample_rate: u32) -> [f32; 12] {
    let mut mean = [0.0f32; 12];
    if sample_rate == 0 {
        return mean;
    }

    let stft = Stft::new(WINDOW_SIZE, HOP_SIZE);
    let bin_classes = bin_pitch_classes(stft.window_size(), sample_rate);
    let mut frames = 0usize;

    stft.for_each_frame(samples, |mags| {
        let mut chroma = [0.0f32; 12];
        for (mag, class) in mags.iter().zip(&bin_classes) {
            if let Some(pc) = class {
                chroma[*pc] += mag * mag;
            }
        }

        let peak = chroma.iter().cloned().fold(0.0f32, f32::max);
        if peak > 0.0 {
            for (m, c) in mean.iter_mut().zip(&chroma) {
                *m += c / peak;
            }
        }
        frames += 1;
    });

    if frames > 0 {
        mean.iter_mut().for_each(|m| *m /= frames as f32);
    }
    mean
}

/// Pitch class with maximum mean energy; ties go to the lower index.
///
/// An all-zero profile yields C.
pub fn dominant_class(chroma: &[f32; 12]) -> PitchClass {
    let mut best = 0;
    for (i, &value) in chroma.iter().enumerate() {
        if value > chroma[best] {
            best = i;
        }
    }
    PitchClass::from_index(best)
}

/// Estimates the pitch class of a mono signal.
pub fn estimate_key(samples: &[f32], sample_rate: u32) -> PitchClass {
    dominant_class(&chroma_mean(samples, sample_rate))
}

/// Maps each FFT bin to a pitch class, or None outside the analysed band.
fn bin_pitch_classes(window_size: usize, sample_rate: u32) -> Vec<Option<usize>> {
    (0..=window_size / 2)
        .map(|bin| {
            let hz = bin as f32 * sample_rate as f32 / window_size as f32;
            if !(MIN_FREQ..=MAX_FREQ).contains(&hz) {
                return None;
            }
            let midi = 69.0 + 12.0 * (hz / 440.0).log2();
            Some((midi.round() as i64).rem_euclid(12) as usize)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: u32 = 22050;

    fn tones(partials: &[(f32, f32)], seconds: f32) -> Vec<f32> {
        let len = (seconds * SR as f32) as usize;
        (0..len)
            .map(|i| {
                let t = i as f32 / SR as f32;
                partials
                    .iter()
                    .map(|(f, a)| a * (2.0 * std::f32::consts::PI * f * t).sin())
                    .sum::<f32>()
                    * 0.3
            })
            .collect()
    }

    #[test]
    fn a_octaves_give_a() {
        let samples = tones(&[(220.0, 1.0), (440.0, 0.8), (880.0, 0.5)], 3.0);
        assert_eq!(estimate_key(&samples, SR), PitchClass::A);
    }

    #[test]
    fn c_major_triad_with_strong_root_gives_c() {
        let samples = tones(&[(261.63, 1.0), (329.63, 0.5), (392.0, 0.5), (130.81, 0.7)], 3.0);
        assert_eq!(estimate_key(&samples, SR), PitchClass::C);
    }

    #[test]
    fn d_gives_d() {
        let samples = tones(&[(293.66, 1.0), (146.83, 0.6)], 3.0);
        assert_eq!(estimate_key(&samples, SR), PitchClass::D);
    }

    #[test]
    fn silence_defaults_to_c() {
        let chroma = chroma_mean(&vec![0.0; SR as usize * 2], SR);
        assert!(chroma.iter().all(|&c| c == 0.0));
        assert_eq!(dominant_class(&chroma), PitchClass::C);
    }

    #[test]
    fn chroma_is_frame_normalized() {
        let samples = tones(&[(440.0, 1.0)], 2.0);
        let chroma = chroma_mean(&samples, SR);
        assert!(chroma.iter().all(|&c| (0.0..=1.0 + 1e-6).contains(&c)));
        assert!((chroma[PitchClass::A.index()] - 1.0).abs() < 1e-3);
    }

    #[test]
    fn bins_outside_band_are_ignored() {
        let classes = bin_pitch_classes(WINDOW_SIZE, SR);
        assert_eq!(classes.len(), WINDOW_SIZE / 2 + 1);
        assert_eq!(classes[0], None);
        assert_eq!(classes[WINDOW_SIZE / 2], None);
        // 440 Hz lands on bin ~81.7
        assert_eq!(classes[82], Some(PitchClass::A.index()));
    }
}
