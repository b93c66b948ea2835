//! Sample-rate conversion for analysis input.

use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};

use crate::error::{MixError, Result};

const CHUNK_SIZE: usize = 1024;

/// Resamples mono `input` from `from_rate` to `to_rate` (sinc interpolation).
///
/// Returns the input unchanged when the rates match. The output length is
/// trimmed to `len * to_rate / from_rate`.
pub fn resample_mono(input: &[f32], from_rate: u32, to_rate: u32) -> Result<Vec<f32>> {
    if from_rate == to_rate || input.is_empty() {
        return Ok(input.to_vec());
    }
    if from_rate == 0 || to_rate == 0 {
        return Err(MixError::decode_failed(format!(
            "invalid sample rate conversion {} -> {}",
            from_rate, to_rate
        )));
    }

    let ratio = to_rate as f64 / from_rate as f64;
    let params = SincInterpolationParameters {
        sinc_len: 128,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 128,
        window: WindowFunction::BlackmanHarris2,
    };

    let mut resampler = SincFixedIn::<f32>::new(ratio, 1.0, params, CHUNK_SIZE, 1)
        .map_err(|e| MixError::decode_failed(format!("resampler setup failed: {}", e)))?;

    let expected = (input.len() as f64 * ratio).round() as usize;
    let delay = resampler.output_delay();
    let mut output = Vec::with_capacity(expected + delay + CHUNK_SIZE);

    let mut pos = 0;
    while input.len() - pos >= resampler.input_frames_next() {
        let end = pos + resampler.input_frames_next();
        let out = resampler
            .process(&[&input[pos..end]][..], None)
            .map_err(|e| MixError::decode_failed(format!("resampling failed: {}", e)))?;
        output.extend_from_slice(&out[0]);
        pos = end;
    }

    // Remaining partial chunk, then flush the filter delay with silence.
    let rest = &input[pos..];
    let out = resampler
        .process_partial(Some(&[rest][..]), None)
        .map_err(|e| MixError::decode_failed(format!("resampling failed: {}", e)))?;
    output.extend_from_slice(&out[0]);
    while output.len() < expected + delay {
        let out = resampler
            .process_partial::<&[f32]>(None, None)
            .map_err(|e| MixError::decode_failed(format!("resampling failed: {}", e)))?;
        if out[0].is_empty() {
            break;
        }
        output.extend_from_slice(&out[0]);
    }

    let end = (delay + expected).min(output.len());
    Ok(output[delay.min(end)..end].to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_rate_is_passthrough() {
        let input = vec![0.1f32, 0.2, 0.3];
        assert_eq!(resample_mono(&input, 44100, 44100).unwrap(), input);
    }

    #[test]
    fn halves_length() {
        let input: Vec<f32> = (0..44100)
            .map(|i| (2.0 * std::f32::consts::PI * 440.0 * i as f32 / 44100.0).sin())
            .collect();
        let out = resample_mono(&input, 44100, 22050).unwrap();
        assert_eq!(out.len(), 22050);

        // Energy of a 440 Hz sine survives downsampling.
        let rms = (out[1000..21000].iter().map(|s| s * s).sum::<f32>() / 20000.0).sqrt();
        assert!((rms - std::f32::consts::FRAC_1_SQRT_2).abs() < 0.05, "rms = {}", rms);
    }

    #[test]
    fn zero_rate_rejected() {
        assert!(resample_mono(&[0.0; 10], 0, 22050).is_err());
    }
}
