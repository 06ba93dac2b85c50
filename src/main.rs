//! Headless front end
//!
//! Registers the given streams, drives the capture tick at ~60 Hz, and
//! records every camera until the timer runs out or Ctrl-C arrives.

use anyhow::Context;
use camgrid::{Container, SessionConfig, SessionController};
use clap::Parser;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Capture cadence of the tick loop (~60 Hz, matching the reference GUI timer)
const TICK_PERIOD: Duration = Duration::from_millis(16);

#[derive(Parser)]
#[command(name = "camgrid", version, about = "Record multiple RTSP camera streams")]
struct Cli {
    /// Stream URIs to register, one camera slot each
    #[arg(required = true)]
    uris: Vec<String>,

    /// JSON session config file; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory recordings are written to
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Target recording frame rate
    #[arg(long)]
    fps: Option<u32>,

    /// Output container: "mjpeg" (AVI) or "h264" (MP4)
    #[arg(long)]
    container: Option<String>,

    /// Stop recording after this many seconds (default: run until Ctrl-C)
    #[arg(long)]
    record_secs: Option<u64>,
}

fn parse_container(name: &str) -> anyhow::Result<Container> {
    match name.to_ascii_lowercase().as_str() {
        "mjpeg" | "avi" => Ok(Container::Mjpeg),
        "h264" | "mp4" => Ok(Container::H264),
        other => anyhow::bail!("unknown container '{other}' (expected mjpeg or h264)"),
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "camgrid=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => SessionConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => SessionConfig::default(),
    };
    if let Some(dir) = cli.output_dir {
        config.output_dir = dir;
    }
    if let Some(fps) = cli.fps {
        config.record_fps = fps;
    }
    if let Some(name) = &cli.container {
        config.container = parse_container(name)?;
    }

    let mut session = SessionController::new(config);
    for uri in &cli.uris {
        if let Err(e) = session.register_camera(uri) {
            tracing::warn!("Skipping {}: {}", uri, e);
        }
    }
    if session.slot_count() == 0 {
        anyhow::bail!("no cameras could be opened");
    }

    let running = Arc::new(AtomicBool::new(true));
    {
        let running = running.clone();
        ctrlc::set_handler(move || running.store(false, Ordering::Relaxed))
            .context("failed to install Ctrl-C handler")?;
    }

    for (slot, e) in session.start_recording_all() {
        tracing::warn!("Slot {} is not recording: {}", slot, e);
    }

    let deadline = cli.record_secs.map(|s| Instant::now() + Duration::from_secs(s));
    while running.load(Ordering::Relaxed)
        && deadline.map_or(true, |d| Instant::now() < d)
    {
        session.tick();
        std::thread::sleep(TICK_PERIOD);
    }

    let summaries = session.stop_recording_all();
    session.shutdown();

    for (_, summary) in &summaries {
        println!("{}", serde_json::to_string_pretty(summary)?);
    }
    Ok(())
}
