use reelcut_core::types::TimeUs;
use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::os::unix::net::UnixStream;
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::time::Duration;

use crate::error::{PreviewError, Result};
use crate::output::OutputElement;

/// Which output an mpv instance stands in for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MpvRole {
    Video,
    Audio,
}

impl MpvRole {
    fn name(self) -> &'static str {
        match self {
            MpvRole::Video => "video",
            MpvRole::Audio => "audio",
        }
    }
}

/// An output element backed by an mpv process, driven over its JSON IPC socket.
pub struct MpvOutput {
    role: MpvRole,
    process: Option<Child>,
    socket_path: PathBuf,
    source: Option<String>,
    paused: bool,
}

impl MpvOutput {
    /// Launch an idle, paused mpv for `role`. Audio instances never open a window.
    pub fn spawn(role: MpvRole) -> Result<Self> {
        let socket_path = std::env::temp_dir().join(format!(
            "reelcut-mpv-{}-{}",
            role.name(),
            std::process::id()
        ));
        let _ = std::fs::remove_file(&socket_path);

        let mut args = vec![
            "--idle=yes".to_string(),
            "--keep-open=yes".to_string(),
            "--pause".to_string(),
            "--osc=no".to_string(),
            "--osd-level=0".to_string(),
            format!("--title=reelcut-{}", role.name()),
            format!("--input-ipc-server={}", socket_path.display()),
        ];
        match role {
            MpvRole::Video => {
                args.push("--force-window=yes".into());
                args.push("--image-display-duration=inf".into());
            }
            MpvRole::Audio => {
                args.push("--vid=no".into());
                args.push("--force-window=no".into());
            }
        }

        tracing::info!(role = role.name(), socket = %socket_path.display(), "Starting mpv");
        let child = Command::new("mpv")
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| PreviewError::Spawn(e.to_string()))?;

        let mut output = Self {
            role,
            process: Some(child),
            socket_path,
            source: None,
            paused: true,
        };

        for _ in 0..50 {
            if output.socket_path.exists() {
                return Ok(output);
            }
            std::thread::sleep(Duration::from_millis(100));
        }
        output.shutdown();
        Err(PreviewError::Spawn("mpv socket did not appear".into()))
    }

    pub fn role(&self) -> MpvRole {
        self.role
    }

    fn send_command(&self, command: serde_json::Value) -> Result<serde_json::Value> {
        let mut stream = UnixStream::connect(&self.socket_path)
            .map_err(|e| PreviewError::Ipc(format!("connect: {}", e)))?;
        stream.set_read_timeout(Some(Duration::from_secs(2)))?;

        let msg = format!("{}\n", command);
        stream.write_all(msg.as_bytes())?;

        // Event notifications can arrive ahead of the reply; skip them.
        let reader = BufReader::new(stream);
        for line in reader.lines() {
            let line = line?;
            let value: serde_json::Value = serde_json::from_str(&line)?;
            if value.get("event").is_some() {
                continue;
            }
            return match value.get("error").and_then(|e| e.as_str()) {
                Some("success") | None => Ok(value),
                Some(err) => Err(PreviewError::Rejected(err.to_string())),
            };
        }
        Err(PreviewError::Ipc("connection closed without reply".into()))
    }

    fn set_pause(&mut self, paused: bool) -> Result<()> {
        self.send_command(json!({ "command": ["set_property", "pause", paused] }))?;
        self.paused = paused;
        Ok(())
    }

    fn shutdown(&mut self) {
        if let Some(mut child) = self.process.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
        let _ = std::fs::remove_file(&self.socket_path);
    }
}

impl OutputElement for MpvOutput {
    fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    fn load(&mut self, media_ref: &str) -> Result<()> {
        self.send_command(json!({ "command": ["loadfile", media_ref, "replace"] }))?;
        self.source = Some(media_ref.to_string());
        tracing::debug!(role = self.role.name(), media = media_ref, "Loaded");
        Ok(())
    }

    fn position(&self) -> Result<TimeUs> {
        let resp = self.send_command(json!({ "command": ["get_property", "time-pos"] }))?;
        resp.get("data")
            .and_then(|d| d.as_f64())
            .map(TimeUs::from_seconds)
            .ok_or_else(|| PreviewError::Ipc("no position data".into()))
    }

    fn seek(&mut self, position: TimeUs) -> Result<()> {
        self.send_command(json!({ "command": ["seek", position.as_seconds(), "absolute"] }))?;
        Ok(())
    }

    fn play(&mut self) -> Result<()> {
        self.set_pause(false)
    }

    fn pause(&mut self) -> Result<()> {
        self.set_pause(true)
    }

    fn is_paused(&self) -> bool {
        self.paused
    }
}

impl Drop for MpvOutput {
    fn drop(&mut self) {
        self.shutdown();
    }
}
