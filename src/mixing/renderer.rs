//! Per-track tempo/pitch/loudness rendering.
//!
//! A track is rendered to a 44.1 kHz stereo WAV in a private temp file.
//! The high-quality path uses ffmpeg's rubberband filter; the approximation
//! shifts pitch by resampling and corrects the tempo with atempo.

use std::ffi::OsStr;
use std::fmt;
use std::path::Path;

use serde::Serialize;
use tempfile::NamedTempFile;

use crate::audio::{CHANNELS, SAMPLE_RATE};
use crate::error::{MixError, Result};
use crate::toolkit::{Capabilities, Toolkit};
use crate::types::TrackRef;

use super::planner::TrackAdjustment;

/// Loudness normalization applied after stretching.
pub const LOUDNORM_FILTER: &str = "loudnorm=I=-14:TP=-1.5:LRA=11";

/// Range ffmpeg's atempo accepts in a single instance.
const ATEMPO_MIN: f64 = 0.5;
const ATEMPO_MAX: f64 = 2.0;

/// Time-stretch method used for one render attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StretchMethod {
    /// rubberband filter: independent tempo and pitch.
    HighQuality,
    /// Resample-based pitch shift plus atempo.
    Approximate,
}

impl StretchMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            StretchMethod::HighQuality => "high_quality",
            StretchMethod::Approximate => "approximate",
        }
    }
}

impl fmt::Display for StretchMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Output of a successful render. The temp file is removed on drop.
#[derive(Debug)]
pub struct RenderedTrack {
    file: NamedTempFile,
    /// Method that produced the file.
    pub method: StretchMethod,
}

impl RenderedTrack {
    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

/// Methods to try, in order.
///
/// High quality is only attempted when preferred AND the filter was probed
/// as present; the approximation always comes last.
pub fn attempt_order(prefer_high_quality: bool, caps: &Capabilities) -> Vec<StretchMethod> {
    if prefer_high_quality && caps.rubberband {
        vec![StretchMethod::HighQuality, StretchMethod::Approximate]
    } else {
        vec![StretchMethod::Approximate]
    }
}

/// rubberband stage. The pitch argument is a frequency ratio.
pub fn high_quality_filter(adj: &TrackAdjustment) -> String {
    format!(
        "rubberband=tempo={:.5}:pitch={:.6}",
        adj.tempo_ratio,
        adj.pitch_factor()
    )
}

/// Resample-based stage.
///
/// `asetrate` raises pitch and speed together by the pitch factor, so the
/// tempo stage applies `ratio / factor`, clamped to atempo's range. The
/// leading `aresample` pins the input rate that `asetrate` reinterprets.
pub fn approximate_filter(adj: &TrackAdjustment) -> String {
    let factor = adj.pitch_factor();
    let shifted_rate = (SAMPLE_RATE as f64 * factor).round() as u32;
    format!(
        "aresample={sr},asetrate={rate},aresample={sr},atempo={tempo:.5}",
        sr = SAMPLE_RATE,
        rate = shifted_rate,
        tempo = approximate_tempo(adj)
    )
}

/// atempo value for the approximation, in [0.5, 2.0].
pub fn approximate_tempo(adj: &TrackAdjustment) -> f64 {
    (adj.tempo_ratio / adj.pitch_factor()).clamp(ATEMPO_MIN, ATEMPO_MAX)
}

/// Full per-track filter chain: stretch, then loudness normalization.
pub fn render_chain(method: StretchMethod, adj: &TrackAdjustment) -> String {
    let stretch = match method {
        StretchMethod::HighQuality => high_quality_filter(adj),
        StretchMethod::Approximate => approximate_filter(adj),
    };
    format!("{},{}", stretch, LOUDNORM_FILTER)
}

/// Renders tracks according to their [`TrackAdjustment`].
#[derive(Debug, Clone)]
pub struct TrackRenderer {
    toolkit: Toolkit,
    prefer_high_quality: bool,
}

impl TrackRenderer {
    pub fn new(toolkit: Toolkit, prefer_high_quality: bool) -> Self {
        Self {
            toolkit,
            prefer_high_quality,
        }
    }

    /// Renders `track` with `adj` applied.
    ///
    /// A failed high-quality attempt is retried once with the approximation.
    /// A failure of the last attempt is a RENDER_ERROR.
    pub fn render(
        &self,
        track: &TrackRef,
        adj: &TrackAdjustment,
        caps: &Capabilities,
    ) -> Result<RenderedTrack> {
        if !caps.toolkit {
            return Err(MixError::toolkit_unavailable(
                self.toolkit.program().display().to_string(),
            ));
        }

        let approx_tempo = adj.tempo_ratio / adj.pitch_factor();
        let mut last_error = None;

        for method in attempt_order(self.prefer_high_quality, caps) {
            if method == StretchMethod::Approximate
                && !(ATEMPO_MIN..=ATEMPO_MAX).contains(&approx_tempo)
            {
                log::warn!(
                    "{}: tempo factor {:.4} outside atempo range, clamped to {:.4}",
                    track.name,
                    approx_tempo,
                    approximate_tempo(adj)
                );
            }

            match self.render_with(track, adj, method) {
                Ok(rendered) => {
                    log::info!(
                        "rendered {} ({}, tempo {:.4}, shift {:+})",
                        track.name,
                        method,
                        adj.tempo_ratio,
                        adj.semitone_shift
                    );
                    return Ok(rendered);
                }
                Err(e) => {
                    log::warn!("{} render of {} failed: {}", method, track.name, e.message);
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| MixError::render_failed(track.name.clone())))
    }

    fn render_with(
        &self,
        track: &TrackRef,
        adj: &TrackAdjustment,
        method: StretchMethod,
    ) -> Result<RenderedTrack> {
        let file = tempfile::Builder::new()
            .prefix("djmix_render_")
            .suffix(".wav")
            .tempfile()
            .map_err(|e| MixError::io("Failed to create render temp file", e))?;

        let chain = render_chain(method, adj);
        let channels = CHANNELS.to_string();
        let rate = SAMPLE_RATE.to_string();
        let args: [&OsStr; 13] = [
            OsStr::new("-y"),
            OsStr::new("-i"),
            track.path.as_os_str(),
            OsStr::new("-vn"),
            OsStr::new("-filter:a"),
            OsStr::new(&chain),
            OsStr::new("-ac"),
            OsStr::new(&channels),
            OsStr::new("-ar"),
            OsStr::new(&rate),
            OsStr::new("-c:a"),
            OsStr::new("pcm_s16le"),
            file.path().as_os_str(),
        ];

        self.toolkit
            .run(args)
            .map_err(|e| MixError::render_failed(format!("{}: {}", track.name, e)))?;

        Ok(RenderedTrack { file, method })
    }
}
