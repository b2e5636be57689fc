use reelcut_core::types::{Asset, MediaKind, TimeUs};
use serde::Deserialize;
use std::path::Path;

use crate::error::{MediaError, Result};

// ---------------------------------------------------------------------------
// ffprobe JSON output structures
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    streams: Vec<FfprobeStream>,
    format: FfprobeFormat,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: String,
    width: Option<u32>,
    height: Option<u32>,
    channels: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

/// The parts of an ffprobe report the editor cares about.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeResult {
    pub duration: Option<TimeUs>,
    pub has_video: bool,
    pub has_audio: bool,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Run ffprobe on a file path or URL.
pub async fn probe_media(media_ref: &str) -> Result<ProbeResult> {
    let output = tokio::process::Command::new("ffprobe")
        .args([
            "-v",
            "quiet",
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
        ])
        .arg(media_ref)
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|e| MediaError::FfprobeExec(e.to_string()))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(MediaError::FfprobeFailed(stderr.into_owned()));
    }

    parse_probe_json(&output.stdout)
}

/// Import a local media file: probe it and create a library asset with its
/// duration already known.
pub async fn import_asset(path: impl AsRef<Path>) -> Result<Asset> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(MediaError::FileNotFound(path.to_path_buf()));
    }
    let media_ref = path.to_string_lossy().into_owned();
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "unknown".to_string());

    if let Some(MediaKind::Image) = kind_from_extension(path) {
        return Ok(Asset::new(name, media_ref, MediaKind::Image));
    }

    let probe = probe_media(&media_ref).await?;
    let kind = detect_media_kind(path, &probe);
    tracing::info!(file = %name, %kind, duration = ?probe.duration, "Imported asset");

    let mut asset = Asset::new(name, media_ref, kind);
    if kind != MediaKind::Image {
        asset.duration = probe.duration;
    }
    Ok(asset)
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn parse_probe_json(bytes: &[u8]) -> Result<ProbeResult> {
    let probe: FfprobeOutput = serde_json::from_slice(bytes)?;
    Ok(parse_probe_output(&probe))
}

fn parse_probe_output(probe: &FfprobeOutput) -> ProbeResult {
    let duration = probe
        .format
        .duration
        .as_deref()
        .and_then(|d| d.parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d > 0.0)
        .map(TimeUs::from_seconds);

    let has_video = probe
        .streams
        .iter()
        .any(|s| s.codec_type == "video" && s.width.unwrap_or(0) > 0 && s.height.unwrap_or(0) > 0);
    let has_audio = probe
        .streams
        .iter()
        .any(|s| s.codec_type == "audio" && s.channels.unwrap_or(1) > 0);

    ProbeResult {
        duration,
        has_video,
        has_audio,
    }
}

fn kind_from_extension(path: &Path) -> Option<MediaKind> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match ext.as_str() {
        "png" | "jpg" | "jpeg" | "gif" | "bmp" | "webp" | "tiff" | "svg" => Some(MediaKind::Image),
        "mp3" | "wav" | "flac" | "aac" | "ogg" | "m4a" | "wma" => Some(MediaKind::Audio),
        "mp4" | "mkv" | "webm" | "mov" | "avi" => Some(MediaKind::Video),
        _ => None,
    }
}

/// Detect media kind from the extension, falling back to stream data.
fn detect_media_kind(path: &Path, probe: &ProbeResult) -> MediaKind {
    if let Some(kind) = kind_from_extension(path) {
        return kind;
    }
    if probe.has_video {
        MediaKind::Video
    } else if probe.has_audio {
        MediaKind::Audio
    } else {
        MediaKind::Video
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
