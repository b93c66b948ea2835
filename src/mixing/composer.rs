//! Two-track crossfade composition.

use std::ffi::OsStr;
use std::fs;
use std::path::Path;

use serde::Serialize;

use crate::error::{MixError, Result};
use crate::toolkit::Toolkit;

use super::renderer::RenderedTrack;

/// Crossfade length bounds, in seconds.
const MIN_CROSSFADE_SEC: f64 = 4.0;
const MAX_CROSSFADE_SEC: f64 = 16.0;

/// Beats covered by the crossfade.
const CROSSFADE_BEATS: f64 = 8.0;

/// Minimum portion of A kept before the transition ends.
const MIN_INTRO_SEC: f64 = 30.0;

/// Brickwall limiter applied to every encoded mix.
pub const LIMITER_FILTER: &str = "alimiter=limit=0.95";

/// MP3 encoder arguments shared by all local strategies.
pub const MP3_ENCODE_ARGS: [&str; 6] = ["-c:a", "libmp3lame", "-q:a", "2", "-f", "mp3"];

/// Timing of the A-to-B transition at a given tempo.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CrossfadeWindow {
    /// Length of the overlap.
    pub crossfade_sec: f64,
    /// Length of A kept, crossfade included.
    pub intro_sec: f64,
}

impl CrossfadeWindow {
    /// Eight beats at `target_bpm`, clamped to [4, 16] s.
    /// A is kept for at least 30 s and always 2 s longer than the overlap.
    pub fn for_tempo(target_bpm: u32) -> Self {
        let beat = 60.0 / target_bpm.max(1) as f64;
        let crossfade_sec = (CROSSFADE_BEATS * beat).clamp(MIN_CROSSFADE_SEC, MAX_CROSSFADE_SEC);
        let intro_sec = (crossfade_sec + 2.0).max(MIN_INTRO_SEC);
        Self {
            crossfade_sec,
            intro_sec,
        }
    }

    /// Where A's fade-out starts.
    pub fn fade_out_start(&self) -> f64 {
        self.intro_sec - self.crossfade_sec
    }
}

/// filter_complex graph: trim and fade out A, fade in B, overlap-sum with
/// triangular curves, then limit.
pub fn crossfade_graph(window: &CrossfadeWindow) -> String {
    format!(
        "[0:a]atrim=0:{intro:.3},afade=t=out:st={start:.3}:d={xf:.3}[A];\
         [1:a]afade=t=in:st=0:d={xf:.3}[B];\
         [A][B]acrossfade=d={xf:.3}:curve1=tri:curve2=tri,{limiter}",
        intro = window.intro_sec,
        start = window.fade_out_start(),
        xf = window.crossfade_sec,
        limiter = LIMITER_FILTER
    )
}

/// Joins two rendered tracks into one MP3.
#[derive(Debug, Clone)]
pub struct CrossfadeComposer {
    toolkit: Toolkit,
}

impl CrossfadeComposer {
    pub fn new(toolkit: Toolkit) -> Self {
        Self { toolkit }
    }

    /// Writes the crossfaded mix of `a` and `b` to `dest`.
    ///
    /// On failure `dest` is removed and COMPOSE_ERROR is returned.
    pub fn compose(
        &self,
        a: &RenderedTrack,
        b: &RenderedTrack,
        window: &CrossfadeWindow,
        dest: &Path,
    ) -> Result<()> {
        let graph = crossfade_graph(window);
        let mut args: Vec<&OsStr> = vec![
            OsStr::new("-y"),
            OsStr::new("-i"),
            a.path().as_os_str(),
            OsStr::new("-i"),
            b.path().as_os_str(),
            OsStr::new("-filter_complex"),
            OsStr::new(&graph),
        ];
        args.extend(MP3_ENCODE_ARGS.iter().map(OsStr::new));
        args.push(dest.as_os_str());

        log::debug!(
            "crossfade {:.2}s, intro {:.2}s",
            window.crossfade_sec,
            window.intro_sec
        );

        if let Err(e) = self.toolkit.run(args) {
            discard_partial(dest);
            return Err(MixError::compose_failed(e.to_string()));
        }
        Ok(())
    }
}

/// Removes a partially written output, ignoring a missing file.
pub(crate) fn discard_partial(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => log::debug!("removed partial output {}", path.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => log::warn!("could not remove {}: {}", path.display(), e),
    }
}
