//! Mix request orchestration.
//!
//! One [`MixOrchestrator::mix`] call walks a request through validation,
//! strategy choice, rendering and composition, and finally promotes the
//! staged output into the canonical slot.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use serde::Serialize;

use crate::analysis::FeatureExtractor;
use crate::config::MixConfig;
use crate::error::{MixError, Result};
use crate::toolkit::{Capabilities, Toolkit};
use crate::types::{has_audio_extension, MixMode, MixRequest, TrackAnalysis, TrackRef};

use super::artifact::{
    canonical_path, is_mixer_file, MixArtifact, MixStrategy, StagedMix, CANONICAL_MIX_NAME,
};
use super::composer::{CrossfadeComposer, CrossfadeWindow};
use super::multiplex::NaiveMultiplexer;
use super::planner::plan_alignment;
use super::remote::RemoteMixer;
use super::renderer::TrackRenderer;

static NEXT_MIX_ID: AtomicU64 = AtomicU64::new(1);

/// Lifecycle of a single mix request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MixStage {
    Received,
    Validated,
    Strategizing,
    Rendering,
    Composing,
    Finalizing,
    Done,
    Failed,
}

impl MixStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            MixStage::Received => "received",
            MixStage::Validated => "validated",
            MixStage::Strategizing => "strategizing",
            MixStage::Rendering => "rendering",
            MixStage::Composing => "composing",
            MixStage::Finalizing => "finalizing",
            MixStage::Done => "done",
            MixStage::Failed => "failed",
        }
    }

    /// True for Done and Failed.
    pub fn is_terminal(&self) -> bool {
        matches!(self, MixStage::Done | MixStage::Failed)
    }
}

impl fmt::Display for MixStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Records and logs the stages one request passes through.
#[derive(Debug)]
struct StageTracker {
    id: u64,
    started: Instant,
    history: Vec<MixStage>,
}

impl StageTracker {
    fn new() -> Self {
        let id = NEXT_MIX_ID.fetch_add(1, Ordering::Relaxed);
        log::debug!("mix #{}: {}", id, MixStage::Received);
        Self {
            id,
            started: Instant::now(),
            history: vec![MixStage::Received],
        }
    }

    fn current(&self) -> MixStage {
        self.history.last().copied().unwrap_or(MixStage::Received)
    }

    fn advance(&mut self, next: MixStage) {
        log::debug!(
            "mix #{}: {} -> {} ({:.2}s)",
            self.id,
            self.current(),
            next,
            self.started.elapsed().as_secs_f32()
        );
        self.history.push(next);
    }

    fn fail(&mut self, error: &MixError) {
        log::warn!(
            "mix #{} failed during {}: {}",
            self.id,
            self.current(),
            error.message
        );
        self.history.push(MixStage::Failed);
    }
}

/// Tracks currently available for mixing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrackListing {
    /// Source track names, sorted.
    pub files: Vec<String>,
    /// Name of the canonical mix, if one exists.
    pub mix: Option<String>,
}

/// Entry point for mix, analysis and listing requests.
///
/// Holds only immutable configuration; every call is independent.
#[derive(Debug, Clone)]
pub struct MixOrchestrator {
    config: MixConfig,
    toolkit: Toolkit,
    uploads_dir: PathBuf,
}

impl MixOrchestrator {
    pub fn new(config: MixConfig) -> Self {
        let toolkit = Toolkit::new(config.ffmpeg_path.clone());
        let uploads_dir = config.effective_uploads_dir();
        Self {
            config,
            toolkit,
            uploads_dir,
        }
    }

    pub fn config(&self) -> &MixConfig {
        &self.config
    }

    pub fn uploads_dir(&self) -> &Path {
        &self.uploads_dir
    }

    /// Probes the host toolkit.
    pub fn capabilities(&self) -> Capabilities {
        Capabilities::probe(&self.toolkit)
    }

    /// Produces the canonical mix for `request`.
    ///
    /// On failure the canonical slot keeps its previous contents.
    pub fn mix(&self, request: &MixRequest) -> Result<MixArtifact> {
        let mut stages = StageTracker::new();
        let result = self.run(request, &mut stages);
        match &result {
            Ok(artifact) => {
                stages.advance(MixStage::Done);
                log::info!(
                    "mix #{} done in {:.1}s ({})",
                    stages.id,
                    stages.started.elapsed().as_secs_f32(),
                    artifact.strategy
                );
            }
            Err(e) => stages.fail(e),
        }
        result
    }

    fn run(&self, request: &MixRequest, stages: &mut StageTracker) -> Result<MixArtifact> {
        let tracks = self.validate(request)?;
        stages.advance(MixStage::Validated);

        let caps = self.capabilities();
        if !caps.toolkit {
            return Err(MixError::toolkit_unavailable(
                self.toolkit.program().display().to_string(),
            ));
        }

        stages.advance(MixStage::Strategizing);
        let staged = StagedMix::create(&self.uploads_dir)?;

        let strategy = if request.mode == MixMode::Smart && tracks.len() == 2 {
            log::info!("strategy: smart crossfade of {} and {}", tracks[0].name, tracks[1].name);
            self.smart_mix(&tracks[0], &tracks[1], &caps, staged.path(), stages)?;
            MixStrategy::Smart
        } else {
            if request.mode == MixMode::Smart {
                log::info!(
                    "smart mode needs exactly two tracks, got {}; overlaying instead",
                    tracks.len()
                );
            }
            stages.advance(MixStage::Composing);
            self.overlay(&tracks, staged.path())?
        };

        stages.advance(MixStage::Finalizing);
        staged.finalize(strategy)
    }

    /// Resolves every requested name; at least two are required.
    fn validate(&self, request: &MixRequest) -> Result<Vec<TrackRef>> {
        if request.files.len() < 2 {
            return Err(MixError::bad_request(format!(
                "At least two tracks are required, got {}",
                request.files.len()
            )));
        }
        request
            .files
            .iter()
            .map(|name| TrackRef::resolve(&self.uploads_dir, name))
            .collect()
    }

    fn smart_mix(
        &self,
        a: &TrackRef,
        b: &TrackRef,
        caps: &Capabilities,
        dest: &Path,
        stages: &mut StageTracker,
    ) -> Result<()> {
        let extractor = FeatureExtractor::new(self.toolkit.clone(), self.config.analysis.clone());
        let features_a = extractor.extract(a)?;
        let features_b = extractor.extract(b)?;

        let plan = plan_alignment(&features_a, &features_b);
        log::info!(
            "plan: {} BPM, A x{:.4}, B x{:.4} shift {:+}",
            plan.target_bpm,
            plan.a.tempo_ratio,
            plan.b.tempo_ratio,
            plan.b.semitone_shift
        );

        stages.advance(MixStage::Rendering);
        let renderer = TrackRenderer::new(self.toolkit.clone(), self.config.prefer_high_quality);
        let rendered_a = renderer.render(a, &plan.a, caps)?;
        let rendered_b = renderer.render(b, &plan.b, caps)?;

        stages.advance(MixStage::Composing);
        let window = CrossfadeWindow::for_tempo(plan.target_bpm);
        CrossfadeComposer::new(self.toolkit.clone()).compose(&rendered_a, &rendered_b, &window, dest)
    }

    /// Remote service when configured, local overlay otherwise or on failure.
    fn overlay(&self, tracks: &[TrackRef], dest: &Path) -> Result<MixStrategy> {
        if let Some(remote) = RemoteMixer::from_config(&self.config.remote) {
            log::info!("strategy: remote mix via {}", remote.endpoint());
            match remote.mix(tracks, dest) {
                Ok(()) => return Ok(MixStrategy::Remote),
                Err(e) => log::warn!("{}; falling back to local overlay", e.message),
            }
        } else {
            log::info!("strategy: local overlay of {} tracks", tracks.len());
        }

        NaiveMultiplexer::new(self.toolkit.clone()).mix(tracks, dest)?;
        Ok(MixStrategy::Naive)
    }

    /// Full feature analysis of one uploaded track.
    pub fn analyze(&self, name: &str) -> Result<TrackAnalysis> {
        let track = TrackRef::resolve(&self.uploads_dir, name)?;
        self.analyze_track(&track)
    }

    /// Full feature analysis of an arbitrary file.
    pub fn analyze_track(&self, track: &TrackRef) -> Result<TrackAnalysis> {
        if !self.toolkit.toolkit_available() {
            return Err(MixError::toolkit_unavailable(
                self.toolkit.program().display().to_string(),
            ));
        }
        FeatureExtractor::new(self.toolkit.clone(), self.config.analysis.clone()).analyze(track)
    }

    /// Lists mixable tracks in the uploads directory.
    ///
    /// A missing directory yields an empty listing.
    pub fn list_tracks(&self) -> Result<TrackListing> {
        let entries = match fs::read_dir(&self.uploads_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(TrackListing {
                    files: Vec::new(),
                    mix: None,
                })
            }
            Err(e) => {
                return Err(MixError::io(
                    format!("Failed to list {}", self.uploads_dir.display()),
                    e,
                ))
            }
        };

        let mut files: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().is_file())
            .map(|entry| entry.file_name().to_string_lossy().to_string())
            .filter(|name| has_audio_extension(name) && !is_mixer_file(name))
            .collect();
        files.sort();

        let mix = canonical_path(&self.uploads_dir)
            .is_file()
            .then(|| CANONICAL_MIX_NAME.to_string());

        Ok(TrackListing { files, mix })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RemoteConfig;
    use crate::error::ErrorCode;
    use crate::test_support;
    use tempfile::TempDir;

    fn orchestrator(dir: &TempDir, ffmpeg: &str) -> MixOrchestrator {
        let mut config = MixConfig::new();
        config.uploads_dir = Some(dir.path().to_path_buf());
        config.ffmpeg_path = PathBuf::from(ffmpeg);
        MixOrchestrator::new(config)
    }

    fn silent_wav(dir: &TempDir, name: &str) {
        crate::audio::write_wav(&[0.0; 4410], &dir.path().join(name), 44100, 1).unwrap();
    }

    fn staging_files(dir: &TempDir) -> usize {
        fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().starts_with(".djmix-staging-"))
            .count()
    }

    #[test]
    fn single_track_is_bad_request() {
        let dir = tempfile::tempdir().unwrap();
        silent_wav(&dir, "a.wav");
        let orch = orchestrator(&dir, "ffmpeg");

        let mut stages = StageTracker::new();
        let err = orch
            .run(&MixRequest::new(vec!["a.wav".into()], MixMode::Smart), &mut stages)
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::BadRequest);
        assert_eq!(err.status(), 400);
        assert_eq!(stages.history, vec![MixStage::Received]);
        assert!(!dir.path().join(CANONICAL_MIX_NAME).exists());
    }

    #[test]
    fn missing_track_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        silent_wav(&dir, "a.wav");
        let orch = orchestrator(&dir, "ffmpeg");

        let err = orch
            .mix(&MixRequest::new(
                vec!["a.wav".into(), "../../etc/ghost.mp3".into()],
                MixMode::Simple,
            ))
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
        assert!(err.message.contains("ghost.mp3"));
        assert!(!err.message.contains(".."));
    }

    #[test]
    fn absent_toolkit_fails_every_strategy() {
        let dir = tempfile::tempdir().unwrap();
        silent_wav(&dir, "a.wav");
        silent_wav(&dir, "b.wav");
        fs::write(dir.path().join(CANONICAL_MIX_NAME), b"previous").unwrap();

        let mut orch = orchestrator(&dir, "/nonexistent/djmix-ffmpeg");
        orch.config.remote = RemoteConfig {
            endpoint: Some("http://127.0.0.1:9/mix".into()),
            api_key: Some("key".into()),
            timeout_sec: 2,
        };

        for mode in [MixMode::Smart, MixMode::Simple] {
            let mut stages = StageTracker::new();
            let err = orch
                .run(&MixRequest::new(vec!["a.wav".into(), "b.wav".into()], mode), &mut stages)
                .unwrap_err();
            assert_eq!(err.code, ErrorCode::ToolkitUnavailable);
            assert_eq!(err.status(), 500);
            assert_eq!(stages.current(), MixStage::Validated);
        }
        assert_eq!(fs::read(dir.path().join(CANONICAL_MIX_NAME)).unwrap(), b"previous");
        assert_eq!(staging_files(&dir), 0);
    }

    #[test]
    fn listing_excludes_mix_and_non_audio() {
        let dir = tempfile::tempdir().unwrap();
        silent_wav(&dir, "b.wav");
        silent_wav(&dir, "A.MP3");
        fs::write(dir.path().join("notes.txt"), b"x").unwrap();
        fs::write(dir.path().join(".djmix-staging-abc.mp3"), b"x").unwrap();
        let orch = orchestrator(&dir, "ffmpeg");

        let listing = orch.list_tracks().unwrap();
        assert_eq!(listing.files, vec!["A.MP3".to_string(), "b.wav".to_string()]);
        assert_eq!(listing.mix, None);

        fs::write(dir.path().join(CANONICAL_MIX_NAME), b"mix").unwrap();
        let listing = orch.list_tracks().unwrap();
        assert_eq!(listing.files.len(), 2);
        assert_eq!(listing.mix.as_deref(), Some(CANONICAL_MIX_NAME));
    }

    #[test]
    fn listing_of_missing_dir_is_empty() {
        let mut config = MixConfig::new();
        config.uploads_dir = Some(PathBuf::from("/nonexistent/djmix/uploads"));
        let listing = MixOrchestrator::new(config).list_tracks().unwrap();
        assert!(listing.files.is_empty());
        assert!(listing.mix.is_none());
    }

    #[test]
    fn stage_names() {
        assert_eq!(MixStage::Strategizing.as_str(), "strategizing");
        assert!(MixStage::Done.is_terminal());
        assert!(MixStage::Failed.is_terminal());
        assert!(!MixStage::Rendering.is_terminal());
    }

    #[test]
    fn three_tracks_are_overlaid() {
        if !test_support::ffmpeg_available() {
            eprintln!("Skipping test: ffmpeg not found");
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        for (name, freq) in [("a.wav", 220.0), ("b.wav", 330.0), ("c.wav", 440.0)] {
            test_support::write_click_track(&dir.path().join(name), 120.0, freq, 3.0);
        }
        let orch = orchestrator(&dir, "ffmpeg");

        let mut stages = StageTracker::new();
        let artifact = orch
            .run(
                &MixRequest::new(vec!["a.wav".into(), "b.wav".into(), "c.wav".into()], MixMode::Smart),
                &mut stages,
            )
            .unwrap();
        assert_eq!(artifact.strategy, MixStrategy::Naive);
        assert_eq!(artifact.name, CANONICAL_MIX_NAME);
        assert!(artifact.size_bytes > 0);
        assert!(artifact.path.is_file());
        assert_eq!(
            stages.history,
            vec![
                MixStage::Received,
                MixStage::Validated,
                MixStage::Strategizing,
                MixStage::Composing,
                MixStage::Finalizing,
            ]
        );
        assert_eq!(staging_files(&dir), 0);
    }

    #[test]
    fn failing_remote_falls_back_to_overlay() {
        if !test_support::ffmpeg_available() {
            eprintln!("Skipping test: ffmpeg not found");
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        test_support::write_click_track(&dir.path().join("a.wav"), 100.0, 220.0, 3.0);
        test_support::write_click_track(&dir.path().join("b.wav"), 120.0, 440.0, 3.0);

        let mut orch = orchestrator(&dir, "ffmpeg");
        orch.config.remote = RemoteConfig {
            endpoint: Some("http://127.0.0.1:9/mix".into()),
            api_key: Some("key".into()),
            timeout_sec: 2,
        };

        let artifact = orch
            .mix(&MixRequest::new(vec!["a.wav".into(), "b.wav".into()], MixMode::Simple))
            .unwrap();
        assert_eq!(artifact.strategy, MixStrategy::Naive);
        assert!(dir.path().join(CANONICAL_MIX_NAME).is_file());
    }

    #[test]
    fn smart_mix_of_two_tracks() {
        if !test_support::ffmpeg_available() {
            eprintln!("Skipping test: ffmpeg not found");
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        test_support::write_click_track(&dir.path().join("a.wav"), 120.0, 261.63, 10.0);
        test_support::write_click_track(&dir.path().join("b.wav"), 130.0, 293.66, 10.0);
        let orch = orchestrator(&dir, "ffmpeg");

        let mut stages = StageTracker::new();
        let artifact = orch
            .run(
                &MixRequest::new(vec!["a.wav".into(), "b.wav".into()], MixMode::Smart),
                &mut stages,
            )
            .unwrap();
        assert_eq!(artifact.strategy, MixStrategy::Smart);
        assert!(artifact.size_bytes > 0);
        assert!(stages.history.contains(&MixStage::Rendering));
        assert_eq!(staging_files(&dir), 0);
    }

    #[test]
    fn analyze_uploaded_track() {
        if !test_support::ffmpeg_available() {
            eprintln!("Skipping test: ffmpeg not found");
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        test_support::write_click_track(&dir.path().join("a.wav"), 120.0, 440.0, 12.0);
        let orch = orchestrator(&dir, "ffmpeg");

        let analysis = orch.analyze("a.wav").unwrap();
        assert_eq!(analysis.name, "a.wav");
        assert!((analysis.bpm - 120.0).abs() < 3.0);

        assert_eq!(orch.analyze("missing.wav").unwrap_err().code, ErrorCode::NotFound);
    }
}
