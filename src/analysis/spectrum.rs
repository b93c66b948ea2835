//! Short-time magnitude spectra.

use std::sync::Arc;

use realfft::{RealFftPlanner, RealToComplex};

/// Frame-by-frame magnitude spectrum of a mono signal (Hann window).
pub struct Stft {
    window_size: usize,
    hop_size: usize,
    window: Vec<f32>,
    fft: Arc<dyn RealToComplex<f32>>,
}

impl Stft {
    pub fn new(window_size: usize, hop_size: usize) -> Self {
        let mut planner = RealFftPlanner::<f32>::new();
        let fft = planner.plan_fft_forward(window_size);
        Self {
            window_size,
            hop_size: hop_size.max(1),
            window: hann_window(window_size),
            fft,
        }
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    /// Number of full frames available in `len` samples.
    pub fn frame_count(&self, len: usize) -> usize {
        if len < self.window_size {
            0
        } else {
            (len - self.window_size) / self.hop_size + 1
        }
    }

    /// Calls `on_frame` with the magnitude spectrum (`window_size / 2 + 1`
    /// bins) of every full frame, in order.
    pub fn for_each_frame<F>(&self, samples: &[f32], mut on_frame: F)
    where
        F: FnMut(&[f32]),
    {
        let mut input = self.fft.make_input_vec();
        let mut spectrum = self.fft.make_output_vec();
        let mut magnitudes = vec![0.0f32; spectrum.len()];

        for frame in 0..self.frame_count(samples.len()) {
            let start = frame * self.hop_size;
            let chunk = &samples[start..start + self.window_size];
            for ((dst, &s), &w) in input.iter_mut().zip(chunk).zip(&self.window) {
                *dst = s * w;
            }

            // Lengths come from the planner, so process cannot fail.
            if self.fft.process(&mut input, &mut spectrum).is_err() {
                continue;
            }

            for (mag, c) in magnitudes.iter_mut().zip(&spectrum) {
                *mag = c.norm();
            }
            on_frame(&magnitudes);
        }
    }
}

fn hann_window(size: usize) -> Vec<f32> {
    if size < 2 {
        return vec![1.0; size];
    }
    (0..size)
        .map(|i| {
            0.5 - 0.5 * (2.0 * std::f32::consts::PI * i as f32 / (size - 1) as f32).cos()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_count() {
        let stft = Stft::new(1024, 512);
        assert_eq!(stft.frame_count(100), 0);
        assert_eq!(stft.frame_count(1024), 1);
        assert_eq!(stft.frame_count(2048), 3);
    }

    #[test]
    fn sine_peaks_at_its_bin() {
        let sr = 22050.0;
        let stft = Stft::new(2048, 2048);
        // Exactly bin 100.
        let freq = 100.0 * sr / 2048.0;
        let samples: Vec<f32> = (0..2048)
            .map(|i| (2.0 * std::f32::consts::PI * freq * i as f32 / sr).sin())
            .collect();

        let mut peak = None;
        stft.for_each_frame(&samples, |mags| {
            let (bin, _) = mags
                .iter()
                .enumerate()
                .fold((0, 0.0f32), |best, (i, &m)| if m > best.1 { (i, m) } else { best });
            peak = Some(bin);
        });
        assert_eq!(peak, Some(100));
    }

    #[test]
    fn hann_endpoints() {
        let w = hann_window(8);
        assert!(w[0].abs() < 1e-6);
        assert!(w[7].abs() < 1e-6);
        assert_eq!(hann_window(1), vec![1.0]);
    }
}
