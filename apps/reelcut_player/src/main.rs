//! Headless player: lays the given files end to end on a timeline and plays
//! them through mpv until the end or Ctrl-C.

use anyhow::{bail, Context};
use reelcut_core::payload::DragPayload;
use reelcut_core::settings::EditorSettings;
use reelcut_core::transport::TickOutcome;
use reelcut_media::probe::import_asset;
use reelcut_media::FfprobeResolver;
use reelcut_preview::clock::FrameClock;
use reelcut_preview::mpv::{MpvOutput, MpvRole};
use reelcut_preview::EditorSession;
use tokio::sync::mpsc;

const SETTINGS_ENV: &str = "REELCUT_SETTINGS";

fn check_dependencies() {
    let deps = [
        ("ffprobe", "media file analysis", "sudo apt install ffmpeg"),
        ("mpv", "preview output", "sudo apt install mpv"),
    ];

    let mut missing = Vec::new();
    for (bin, purpose, install) in &deps {
        if std::process::Command::new(bin)
            .arg("--version")
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .status()
            .is_err()
        {
            missing.push((*bin, *purpose, *install));
        }
    }

    if !missing.is_empty() {
        eprintln!("\n=== ReelCut: Missing required dependencies ===\n");
        for (bin, purpose, install) in &missing {
            eprintln!("  ✗ {bin} -- {purpose}");
            eprintln!("    Install: {install}\n");
        }
        std::process::exit(1);
    }
}

fn load_settings() -> anyhow::Result<EditorSettings> {
    match std::env::var_os(SETTINGS_ENV) {
        Some(path) => EditorSettings::load_from_file(&path)
            .with_context(|| format!("loading settings from {}", path.to_string_lossy())),
        None => Ok(EditorSettings::default()),
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "reelcut=info".into()),
        )
        .init();

    let paths: Vec<String> = std::env::args().skip(1).collect();
    if paths.is_empty() {
        bail!("usage: reelcut-player <media>...");
    }
    check_dependencies();

    let settings = load_settings()?;
    let video = MpvOutput::spawn(MpvRole::Video)?;
    let audio = MpvOutput::spawn(MpvRole::Audio)?;
    let mut session = EditorSession::new(&settings, video, audio);
    let resolver = FfprobeResolver::new();

    for path in &paths {
        let asset = match import_asset(path).await {
            Ok(asset) => asset,
            Err(e) => {
                tracing::warn!(file = %path, error = %e, "Skipping file");
                continue;
            }
        };
        let asset_id = session.add_asset(asset);
        let payload = DragPayload::library(asset_id).to_json()?;
        // Drop each file where the previous one ends.
        let x = session.surface().scale().time_to_x(session.timeline().end());
        if let Err(e) = session.drop_payload(&resolver, &payload, x).await {
            tracing::warn!(file = %path, error = %e, "Could not place file");
        }
    }

    if session.timeline().is_empty() {
        bail!("nothing to play");
    }
    for clip in session.timeline().clips() {
        tracing::info!(
            media = %clip.media_ref,
            start = %clip.start_time,
            end = %clip.end_time(),
            "Clip"
        );
    }

    let (tx, mut rx) = mpsc::unbounded_channel();
    session.attach_clock(FrameClock::new(settings.frame_rate), tx);
    session.toggle_play();

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    loop {
        tokio::select! {
            Some(tick) = rx.recv() => {
                if session.on_tick(tick) == TickOutcome::ReachedEnd {
                    tracing::info!("Reached end of timeline");
                    break;
                }
            }
            _ = &mut ctrl_c => {
                tracing::info!(playhead = %session.transport().playhead(), "Interrupted");
                break;
            }
        }
    }

    session.teardown();
    Ok(())
}
