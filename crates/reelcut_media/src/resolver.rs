use reelcut_core::resolve::DurationResolver;
use reelcut_core::types::{MediaKind, TimeUs, IMAGE_DURATION};
use reelcut_core::CoreError;
use std::time::Duration;

use crate::error::MediaError;
use crate::probe::probe_media;

/// Resolves durations by asking ffprobe, bounded by a timeout so a stalled
/// remote source fails instead of hanging the drop.
#[derive(Debug, Clone)]
pub struct FfprobeResolver {
    timeout: Duration,
}

impl Default for FfprobeResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl FfprobeResolver {
    pub fn new() -> Self {
        Self {
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self { timeout }
    }

    async fn probe_duration(&self, media_ref: &str) -> Result<TimeUs, MediaError> {
        let probe = tokio::time::timeout(self.timeout, probe_media(media_ref))
            .await
            .map_err(|_| MediaError::FfprobeFailed(format!("timed out after {:?}", self.timeout)))??;
        probe
            .duration
            .ok_or_else(|| MediaError::NoDuration(media_ref.to_string()))
    }
}

impl DurationResolver for FfprobeResolver {
    async fn resolve_duration(&self, media_ref: &str, kind: MediaKind) -> reelcut_core::Result<TimeUs> {
        if kind == MediaKind::Image {
            return Ok(IMAGE_DURATION);
        }
        self.probe_duration(media_ref).await.map_err(|e| {
            tracing::warn!(media = media_ref, error = %e, "Duration resolution failed");
            CoreError::DurationResolution {
                media_ref: media_ref.to_string(),
                reason: e.to_string(),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn images_do_not_probe() {
        let resolver = FfprobeResolver::new();
        let d = resolver
            .resolve_duration("/nowhere/still.png", MediaKind::Image)
            .await
            .unwrap();
        assert_eq!(d, IMAGE_DURATION);
    }

    #[tokio::test]
    async fn unreadable_media_is_a_resolution_error() {
        let resolver = FfprobeResolver::with_timeout(Duration::from_secs(5));
        let err = resolver
            .resolve_duration("/tmp/does_not_exist_reelcut_resolver.mp4", MediaKind::Video)
            .await
            .unwrap_err();
        match err {
            CoreError::DurationResolution { media_ref, .. } => {
                assert_eq!(media_ref, "/tmp/does_not_exist_reelcut_resolver.mp4");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
