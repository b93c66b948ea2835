//! djmix-daemon: tempo/key-aware DJ mixing over ffmpeg.
//!
//! This binary can run in three modes:
//! - Mix mode: one mix request from `--files`, result printed as JSON
//! - Analysis mode: feature analysis of `--analyze FILE`
//! - Daemon mode: JSON-RPC server over stdio

use anyhow::{bail, Context, Result};

use djmix_daemon::cli::Cli;
use djmix_daemon::config::MixConfig;
use djmix_daemon::mixing::MixOrchestrator;
use djmix_daemon::rpc::{run_server, MixResponse, ServerState};
use djmix_daemon::types::TrackRef;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run() {
        log::error!("{:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse_args();
    let config = cli.apply_to(MixConfig::from_env());
    if let Some(problem) = config.validate() {
        bail!("invalid configuration: {}", problem);
    }

    if cli.is_daemon_mode() {
        run_daemon_mode(config)
    } else if let Some(ref path) = cli.analyze {
        run_analyze(config, path)
    } else if cli.list {
        run_list(config)
    } else if cli.is_mix_mode() {
        run_mix(config, &cli)
    } else {
        print_usage();
        Ok(())
    }
}

/// Runs one mix and prints the response contract to stdout.
fn run_mix(config: MixConfig, cli: &Cli) -> Result<()> {
    let orchestrator = MixOrchestrator::new(config);
    let request = cli.mix_request();
    log::info!(
        "mixing {} tracks from {} (mode {})",
        request.files.len(),
        orchestrator.uploads_dir().display(),
        request.mode.as_str()
    );

    let result = orchestrator.mix(&request);
    let response = MixResponse::from_result(&result);
    println!(
        "{}",
        serde_json::to_string_pretty(&response).context("serializing mix response")?
    );

    match result {
        Ok(artifact) => {
            log::info!("wrote {}", artifact.path.display());
            Ok(())
        }
        Err(e) => Err(anyhow::Error::new(e).context("mix failed")),
    }
}

/// Prints the analysis of a single file.
fn run_analyze(config: MixConfig, path: &std::path::Path) -> Result<()> {
    let orchestrator = MixOrchestrator::new(config);
    let track = TrackRef::from_path(path)
        .with_context(|| format!("cannot analyze {}", path.display()))?;
    let analysis = orchestrator.analyze_track(&track)?;
    println!("{}", serde_json::to_string_pretty(&analysis)?);
    Ok(())
}

fn run_list(config: MixConfig) -> Result<()> {
    let orchestrator = MixOrchestrator::new(config);
    let listing = orchestrator.list_tracks()?;
    println!("{}", serde_json::to_string_pretty(&listing)?);
    Ok(())
}

/// Runs the daemon mode (JSON-RPC server).
fn run_daemon_mode(config: MixConfig) -> Result<()> {
    let state = ServerState::new(config);

    let caps = state.orchestrator.capabilities();
    if caps.toolkit {
        log::info!(
            "ffmpeg available (rubberband: {})",
            if caps.rubberband { "yes" } else { "no" }
        );
    } else {
        log::warn!("ffmpeg not available; mix requests will fail until it is installed");
    }
    if state.orchestrator.config().remote.is_usable() {
        log::info!("remote mixing enabled");
    }

    run_server(state)?;
    Ok(())
}

/// Prints usage information.
fn print_usage() {
    eprintln!("djmix-daemon: tempo/key-aware DJ mixing over ffmpeg");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  Smart two-track mix:");
    eprintln!("    djmix-daemon --uploads-dir ./uploads --files a.mp3 b.mp3 --mode smart");
    eprintln!();
    eprintln!("  Overlay any number of tracks:");
    eprintln!("    djmix-daemon --files a.mp3 b.mp3 c.mp3");
    eprintln!();
    eprintln!("  Analyze one file:");
    eprintln!("    djmix-daemon --analyze song.mp3");
    eprintln!();
    eprintln!("  Daemon mode (JSON-RPC server):");
    eprintln!("    djmix-daemon --daemon");
    eprintln!();
    eprintln!("Run 'djmix-daemon --help' for full options.");
}
