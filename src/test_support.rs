//! Fixtures shared by unit tests.

use std::path::Path;
use std::process::{Command, Stdio};

use crate::audio::write_wav;

const FIXTURE_RATE: u32 = 44100;

/// True if an `ffmpeg` binary on PATH runs.
pub fn ffmpeg_available() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Writes a mono WAV: a quiet sustained tone at `freq` with a decaying
/// accent of the same pitch on every beat.
pub fn write_click_track(path: &Path, bpm: f64, freq: f32, seconds: f32) {
    let len = (seconds * FIXTURE_RATE as f32) as usize;
    let period = (60.0 / bpm * FIXTURE_RATE as f64) as usize;
    let samples: Vec<f32> = (0..len)
        .map(|i| {
            let t = i as f32 / FIXTURE_RATE as f32;
            let since_beat = (i % period) as f32 / FIXTURE_RATE as f32;
            let accent = 0.7 * (-since_beat * 40.0).exp();
            (0.15 + accent) * (2.0 * std::f32::consts::PI * freq * t).sin()
        })
        .collect();
    write_wav(&samples, path, FIXTURE_RATE, 1).expect("write fixture");
}
