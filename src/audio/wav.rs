//! WAV file I/O.
//!
//! Reads toolkit-decoded PCM for analysis and writes WAV files using the
//! hound crate.

use std::path::Path;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};

use crate::error::{MixError, Result};

/// Sample rate of rendered intermediates and the final mix.
pub const SAMPLE_RATE: u32 = 44100;

/// Channel count of rendered intermediates (stereo).
pub const CHANNELS: u16 = 2;

/// Mono PCM decoded from a WAV file.
#[derive(Debug, Clone)]
pub struct MonoPcm {
    /// Samples in [-1, 1].
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl MonoPcm {
    /// Duration in seconds.
    pub fn duration_sec(&self) -> f32 {
        samples_to_duration(self.samples.len(), self.sample_rate)
    }
}

/// Reads a WAV file and downmixes it to mono f32.
///
/// Integer formats are scaled to [-1, 1]; float formats are taken as-is.
pub fn read_wav_mono(path: &Path) -> Result<MonoPcm> {
    let reader = WavReader::open(path).map_err(|e| {
        MixError::decode_failed(format!("cannot open {}: {}", path.display(), e))
    })?;
    let spec = reader.spec();
    let channels = spec.channels.max(1) as usize;

    let interleaved: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => reader
            .into_samples::<f32>()
            .collect::<std::result::Result<Vec<f32>, _>>(),
        SampleFormat::Int => {
            let scale = 1.0 / (1i64 << (spec.bits_per_sample.max(1) - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 * scale))
                .collect::<std::result::Result<Vec<f32>, _>>()
        }
    }
    .map_err(|e| MixError::decode_failed(format!("corrupt sample data: {}", e)))?;

    let samples = if channels == 1 {
        interleaved
    } else {
        interleaved
            .chunks_exact(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32)
            .collect()
    };

    Ok(MonoPcm {
        samples,
        sample_rate: spec.sample_rate,
    })
}

/// Writes interleaved samples to a 16-bit PCM WAV file.
///
/// # Example
///
/// ```ignore
/// use djmix_daemon::audio::write_wav;
///
/// let samples = vec![0.0, 0.5, -0.5, 0.0];
/// write_wav(&samples, Path::new("/tmp/test.wav"), 44100, 1)?;
/// ```
pub fn write_wav(samples: &[f32], path: &Path, sample_rate: u32, channels: u16) -> Result<()> {
    let spec = WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut writer = WavWriter::create(path, spec).map_err(|e| {
        MixError::compose_failed(format!("Failed to create WAV file: {}", e))
    })?;

    for sample in samples {
        let value = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
        writer.write_sample(value).map_err(|e| {
            MixError::compose_failed(format!("Failed to write sample: {}", e))
        })?;
    }

    writer.finalize().map_err(|e| {
        MixError::compose_failed(format!("Failed to finalize WAV file: {}", e))
    })?;

    Ok(())
}

/// Calculates the duration of audio in seconds from sample count.
pub fn samples_to_duration(sample_count: usize, sample_rate: u32) -> f32 {
    if sample_rate == 0 {
        return 0.0;
    }
    sample_count as f32 / sample_rate as f32
}
