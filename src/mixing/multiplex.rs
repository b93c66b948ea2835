//! Naive multi-track overlay.
//!
//! All inputs start at t=0 and are summed with equal weight; the result runs
//! as long as the longest input and is normalized and limited.

use std::ffi::OsStr;
use std::path::Path;

use crate::error::{MixError, Result};
use crate::toolkit::Toolkit;
use crate::types::TrackRef;

use super::composer::{discard_partial, LIMITER_FILTER, MP3_ENCODE_ARGS};

/// Dynamic normalization applied after summing.
const DYNAUDNORM_FILTER: &str = "dynaudnorm=f=75:g=15";

/// filter_complex graph for `inputs` tracks.
pub fn multiplex_graph(inputs: usize) -> String {
    format!(
        "amix=inputs={}:duration=longest,{},{}",
        inputs, DYNAUDNORM_FILTER, LIMITER_FILTER
    )
}

#[derive(Debug, Clone)]
pub struct NaiveMultiplexer {
    toolkit: Toolkit,
}

impl NaiveMultiplexer {
    pub fn new(toolkit: Toolkit) -> Self {
        Self { toolkit }
    }

    /// Overlays `tracks` into one MP3 at `dest`.
    ///
    /// On failure `dest` is removed and COMPOSE_ERROR is returned.
    pub fn mix(&self, tracks: &[TrackRef], dest: &Path) -> Result<()> {
        if tracks.is_empty() {
            return Err(MixError::compose_failed("no input tracks"));
        }

        let graph = multiplex_graph(tracks.len());
        let mut args: Vec<&OsStr> = vec![OsStr::new("-y")];
        for track in tracks {
            args.push(OsStr::new("-i"));
            args.push(track.path.as_os_str());
        }
        args.push(OsStr::new("-filter_complex"));
        args.push(OsStr::new(&graph));
        args.extend(MP3_ENCODE_ARGS.iter().map(OsStr::new));
        args.push(dest.as_os_str());

        log::info!("overlaying {} tracks", tracks.len());

        if let Err(e) = self.toolkit.run(args) {
            discard_partial(dest);
            return Err(MixError::compose_failed(e.to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn graph_for_three_inputs() {
        assert_eq!(
            multiplex_graph(3),
            "amix=inputs=3:duration=longest,dynaudnorm=f=75:g=15,alimiter=limit=0.95"
        );
    }

    #[test]
    fn empty_input_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mux = NaiveMultiplexer::new(Toolkit::new("ffmpeg"));
        let err = mux.mix(&[], &dir.path().join("out.mp3")).unwrap_err();
        assert_eq!(err.code, ErrorCode::ComposeError);
    }

    #[test]
    fn toolkit_failure_is_compose_error() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("a.wav");
        crate::audio::write_wav(&[0.0; 100], &src, 44100, 1).unwrap();
        let track = TrackRef::from_path(&src).unwrap();
        let dest = dir.path().join("out.mp3");
        std::fs::write(&dest, b"stale").unwrap();

        let mux = NaiveMultiplexer::new(Toolkit::new("/nonexistent/djmix-ffmpeg"));
        let err = mux.mix(&[track.clone(), track], &dest).unwrap_err();
        assert_eq!(err.code, ErrorCode::ComposeError);
        assert!(!dest.exists());
    }
}
