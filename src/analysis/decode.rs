//! Bounded decode of a source track for analysis.
//!
//! ffmpeg decodes at most `max_sec` seconds to a mono 16-bit WAV in a
//! private temp file; the samples are read back with hound and resampled
//! to [`ANALYSIS_SAMPLE_RATE`].

use std::ffi::OsStr;

use crate::audio::{read_wav_mono, resample_mono, MonoPcm};
use crate::error::{ErrorCode, MixError, Result};
use crate::toolkit::Toolkit;
use crate::types::TrackRef;

/// Sample rate all analysis runs at.
pub const ANALYSIS_SAMPLE_RATE: u32 = 22050;

/// Decodes the first `max_sec` seconds of `track` to mono PCM at the
/// analysis rate.
pub fn decode_bounded(toolkit: &Toolkit, track: &TrackRef, max_sec: u32) -> Result<MonoPcm> {
    let temp = tempfile::Builder::new()
        .prefix("djmix_decode_")
        .suffix(".wav")
        .tempfile()
        .map_err(|e| MixError::io("Failed to create decode temp file", e))?;

    let seconds = max_sec.to_string();
    let args: [&OsStr; 11] = [
        OsStr::new("-y"),
        OsStr::new("-i"),
        track.path.as_os_str(),
        OsStr::new("-t"),
        OsStr::new(&seconds),
        OsStr::new("-vn"),
        OsStr::new("-ac"),
        OsStr::new("1"),
        OsStr::new("-c:a"),
        OsStr::new("pcm_s16le"),
        temp.path().as_os_str(),
    ];

    toolkit.run(args).map_err(|e| {
        let message = format!("Failed to decode {}: {}", track.name, e);
        MixError::with_source(ErrorCode::DecodeError, message, e)
    })?;

    let pcm = read_wav_mono(temp.path())?;
    if pcm.samples.is_empty() {
        return Err(MixError::decode_failed(format!(
            "{} contains no audio",
            track.name
        )));
    }

    let samples = resample_mono(&pcm.samples, pcm.sample_rate, ANALYSIS_SAMPLE_RATE)?;
    log::debug!(
        "decoded {}: {:.1}s at {} Hz",
        track.name,
        pcm.duration_sec(),
        pcm.sample_rate
    );

    Ok(MonoPcm {
        samples,
        sample_rate: ANALYSIS_SAMPLE_RATE,
    })
}
