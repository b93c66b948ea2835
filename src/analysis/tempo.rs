// Tempo estimation - spectral-flux onset envelope + autocorrelation
// Periodicity is scored over 60-200 BPM with a log-normal prior around 120 BPM

use super::spectrum::Stft;

/// Configuration for tempo estimation
#[derive(Debug, Clone)]
pub struct TempoConfig {
    /// FFT window size in samples
    pub window_size: usize,

    /// Hop between onset frames in samples
    pub hop_size: usize,

    /// Slowest tempo considered
    pub min_bpm: f64,

    /// Fastest tempo considered
    pub max_bpm: f64,

    /// Centre of the tempo prior
    pub prior_bpm: f64,

    /// Width of the prior in octaves
    pub prior_octaves: f64,
}

impl Default for TempoConfig {
    fn default() -> Self {
        TempoConfig {
            window_size: 2048,
            hop_size: 512,
            min_bpm: 60.0,
            max_bpm: 200.0,
            prior_bpm: 120.0,
            prior_octaves: 1.0,
        }
    }
}

/// Estimate the tempo of a mono signal in BPM.
///
/// Returns 0.0 when the signal has no usable periodic structure; callers
/// substitute the default tempo.
pub fn estimate_bpm(samples: &[f32], sample_rate: u32) -> f64 {
    estimate_bpm_with_config(samples, sample_rate, &TempoConfig::default())
}

pub fn estimate_bpm_with_config(samples: &[f32], sample_rate: u32, config: &TempoConfig) -> f64 {
    if sample_rate == 0 || config.min_bpm <= 0.0 || config.max_bpm <= config.min_bpm {
        return 0.0;
    }

    let envelope = onset_envelope(samples, config);
    let frame_rate = sample_rate as f64 / config.hop_size as f64;

    // Lag range in envelope frames
    let min_lag = (60.0 * frame_rate / config.max_bpm).floor().max(1.0) as usize;
    let max_lag = (60.0 * frame_rate / config.min_bpm).ceil() as usize;
    if envelope.len() < 2 * max_lag + 1 {
        return 0.0;
    }

    let scores: Vec<f64> = (0..=max_lag + 1)
        .map(|lag| {
            if lag < min_lag.saturating_sub(1) {
                0.0
            } else {
                autocorrelation(&envelope, lag)
            }
        })
        .collect();

    let mut best_lag = 0;
    let mut best_score = 0.0;
    for lag in min_lag..=max_lag {
        let bpm = 60.0 * frame_rate / lag as f64;
        let weighted = scores[lag] * tempo_prior(bpm, config);
        if weighted > best_score {
            best_score = weighted;
            best_lag = lag;
        }
    }

    if best_lag == 0 {
        return 0.0;
    }

    let lag = refine_lag(&scores, best_lag);
    if lag <= 0.0 {
        return 0.0;
    }
    60.0 * frame_rate / lag
}

/// Half-wave rectified log-magnitude spectral flux, mean-removed.
fn onset_envelope(samples: &[f32], config: &TempoConfig) -> Vec<f64> {
    let stft = Stft::new(config.window_size, config.hop_size);
    let mut previous: Option<Vec<f32>> = None;
    let mut flux = Vec::with_capacity(stft.frame_count(samples.len()));

    stft.for_each_frame(samples, |mags| {
        let log_mags: Vec<f32> = mags.iter().map(|m| (1.0 + m).ln()).collect();
        let value = match &previous {
            Some(prev) => log_mags
                .iter()
                .zip(prev)
                .map(|(cur, old)| (cur - old).max(0.0) as f64)
                .sum(),
            None => 0.0,
        };
        flux.push(value);
        previous = Some(log_mags);
    });

    if flux.is_empty() {
        return flux;
    }
    let mean = flux.iter().sum::<f64>() / flux.len() as f64;
    flux.iter_mut().for_each(|v| *v -= mean);
    flux
}

/// Unbiased autocorrelation at `lag`.
fn autocorrelation(envelope: &[f64], lag: usize) -> f64 {
    if lag >= envelope.len() {
        return 0.0;
    }
    let n = envelope.len() - lag;
    let sum: f64 = envelope[..n]
        .iter()
        .zip(&envelope[lag..])
        .map(|(a, b)| a * b)
        .sum();
    sum / n as f64
}

/// Log-normal weight centred on the prior tempo
fn tempo_prior(bpm: f64, config: &TempoConfig) -> f64 {
    let octaves = (bpm / config.prior_bpm).log2() / config.prior_octaves;
    (-0.5 * octaves * octaves).exp()
}

/// Parabolic interpolation around an integer peak
fn refine_lag(scores: &[f64], lag: usize) -> f64 {
    if lag == 0 || lag + 1 >= scores.len() {
        return lag as f64;
    }
    let (a, b, c) = (scores[lag - 1], scores[lag], scores[lag + 1]);
    let denom = a - 2.0 * b + c;
    if denom.abs() < f64::EPSILON {
        return lag as f64;
    }
    let offset = 0.5 * (a - c) / denom;
    lag as f64 + offset.clamp(-0.5, 0.5)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: u32 = 22050;

    /// Decaying 1 kHz blips on every beat
    fn click_track(bpm: f64, seconds: f64) -> Vec<f32> {
        let len = (seconds * SR as f64) as usize;
        let period = 60.0 / bpm * SR as f64;
        let blip = (0.03 * SR as f64) as usize;
        let mut samples = vec![0.0f32; len];
        let mut beat = 0.0;
        while (beat as usize) < len {
            let start = beat as usize;
            for i in 0..blip.min(len - start) {
                let t = i as f32 / SR as f32;
                samples[start + i] =
                    0.8 * (-t * 120.0).exp() * (2.0 * std::f32::consts::PI * 1000.0 * t).sin();
            }
            beat += period;
        }
        samples
    }

    #[test]
    fn detects_120_bpm() {
        let bpm = estimate_bpm(&click_track(120.0, 30.0), SR);
        assert!((bpm - 120.0).abs() < 3.0, "bpm = {}", bpm);
    }

    #[test]
    fn detects_100_bpm() {
        let bpm = estimate_bpm(&click_track(100.0, 30.0), SR);
        assert!((bpm - 100.0).abs() < 3.0, "bpm = {}", bpm);
    }

    #[test]
    fn silence_has_no_tempo() {
        assert_eq!(estimate_bpm(&vec![0.0; SR as usize * 10], SR), 0.0);
    }

    #[test]
    fn too_short_has_no_tempo() {
        assert_eq!(estimate_bpm(&click_track(120.0, 0.5), SR), 0.0);
    }

    #[test]
    fn prior_peaks_at_centre() {
        let config = TempoConfig::default();
        assert!((tempo_prior(120.0, &config) - 1.0).abs() < 1e-9);
        assert!(tempo_prior(60.0, &config) < tempo_prior(100.0, &config));
        assert!(tempo_prior(240.0, &config) < tempo_prior(150.0, &config));
    }

    #[test]
    fn parabolic_refinement() {
        let scores = [0.0, 1.0, 3.0, 1.0, 0.0];
        assert_eq!(refine_lag(&scores, 2), 2.0);
        let skewed = [0.0, 1.0, 3.0, 2.0, 0.0];
        assert!(refine_lag(&skewed, 2) > 2.0);
    }
}
