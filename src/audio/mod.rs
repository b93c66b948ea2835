//! Audio buffer module.
//!
//! Provides WAV file I/O and resampling for analysis input.

pub mod resample;
pub mod wav;

// Re-export commonly used items
pub use resample::resample_mono;
pub use wav::{read_wav_mono, samples_to_duration, write_wav, MonoPcm, CHANNELS, SAMPLE_RATE};
