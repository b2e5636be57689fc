//! Asynchronous collaborators: duration probing and asset generation.
//!
//! Nothing here borrows the timeline across an await. Placement is split in
//! two: resolve the duration first, then commit the clip synchronously.

use crate::error::{CoreError, Result};
use crate::timeline::Timeline;
use crate::types::*;
use std::future::Future;

/// Determines how long a piece of media plays for.
pub trait DurationResolver {
    /// Fails with `CoreError::DurationResolution` when metadata cannot load.
    fn resolve_duration(&self, media_ref: &str, kind: MediaKind) -> impl Future<Output = Result<TimeUs>>;
}

/// Duration to use for `asset`: images get the fixed nominal length, known
/// durations are reused, everything else is probed.
pub async fn resolved_duration<R: DurationResolver>(resolver: &R, asset: &Asset) -> Result<TimeUs> {
    if asset.kind == MediaKind::Image {
        return Ok(IMAGE_DURATION);
    }
    let duration = match asset.duration {
        Some(d) => d,
        None => resolver.resolve_duration(&asset.media_ref, asset.kind).await?,
    };
    if duration <= MIN_CLIP_DURATION {
        return Err(CoreError::DurationResolution {
            media_ref: asset.media_ref.clone(),
            reason: format!("duration {} is too short to place", duration),
        });
    }
    Ok(duration)
}

/// A drop that is waiting on duration resolution. Holds its own copy of the
/// asset so the editor stays usable while it resolves.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaceRequest {
    pub asset: Asset,
    pub start_time: TimeUs,
}

/// A drop whose duration is known and can be committed.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedPlacement {
    pub asset: Asset,
    pub duration: TimeUs,
    pub start_time: TimeUs,
}

impl PlaceRequest {
    pub async fn resolve<R: DurationResolver>(self, resolver: &R) -> Result<ResolvedPlacement> {
        let duration = resolved_duration(resolver, &self.asset).await?;
        Ok(ResolvedPlacement {
            asset: self.asset,
            duration,
            start_time: self.start_time,
        })
    }
}

/// Resolve and place in one step. The clip only exists once resolution
/// succeeded; on failure the timeline is untouched.
pub async fn place<R: DurationResolver>(
    timeline: &mut Timeline,
    resolver: &R,
    asset: &Asset,
    start_time: TimeUs,
) -> Result<Clip> {
    let duration = resolved_duration(resolver, asset).await?;
    Ok(timeline.place(asset, duration, start_time).clone())
}

// ---------------------------------------------------------------------------
// Generation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub kind: MediaKind,
}

/// What a generator hands back: somewhere to play it from and its type.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedMedia {
    pub media_ref: String,
    pub kind: MediaKind,
    pub duration: Option<TimeUs>,
}

pub trait AssetGenerator {
    fn generate(&self, request: &GenerationRequest) -> impl Future<Output = Result<GeneratedMedia>>;
}

/// Run a generator and wrap its output as a library asset named after the prompt.
pub async fn generate_asset<G: AssetGenerator>(generator: &G, request: &GenerationRequest) -> Result<Asset> {
    let media = generator.generate(request).await?;
    let name: String = request.prompt.chars().take(40).collect();
    let mut asset = Asset::new(name, media.media_ref, media.kind);
    asset.duration = media.duration;
    tracing::info!(asset = %asset.id, kind = %asset.kind, "Generated asset ready");
    Ok(asset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct FixedResolver {
        seconds: f64,
        calls: Cell<u32>,
    }

    impl FixedResolver {
        fn new(seconds: f64) -> Self {
            Self { seconds, calls: Cell::new(0) }
        }
    }

    impl DurationResolver for FixedResolver {
        async fn resolve_duration(&self, _media_ref: &str, _kind: MediaKind) -> Result<TimeUs> {
            self.calls.set(self.calls.get() + 1);
            Ok(TimeUs::from_seconds(self.seconds))
        }
    }

    struct BrokenResolver;

    impl DurationResolver for BrokenResolver {
        async fn resolve_duration(&self, media_ref: &str, _kind: MediaKind) -> Result<TimeUs> {
            Err(CoreError::DurationResolution {
                media_ref: media_ref.to_string(),
                reason: "metadata failed to load".into(),
            })
        }
    }

    struct EchoGenerator;

    impl AssetGenerator for EchoGenerator {
        async fn generate(&self, request: &GenerationRequest) -> Result<GeneratedMedia> {
            Ok(GeneratedMedia {
                media_ref: "blob:generated".into(),
                kind: request.kind,
                duration: None,
            })
        }
    }

    #[tokio::test]
    async fn images_skip_the_resolver() {
        let resolver = BrokenResolver;
        let asset = Asset::new("a.png", "/a.png", MediaKind::Image);
        assert_eq!(resolved_duration(&resolver, &asset).await.unwrap(), IMAGE_DURATION);
    }

    #[tokio::test]
    async fn known_duration_is_reused() {
        let resolver = FixedResolver::new(3.0);
        let asset = Asset::new("a.mp4", "/a.mp4", MediaKind::Video).with_duration(TimeUs::from_seconds(8.0));
        assert_eq!(resolved_duration(&resolver, &asset).await.unwrap(), TimeUs::from_seconds(8.0));
        assert_eq!(resolver.calls.get(), 0);
    }

    #[tokio::test]
    async fn unknown_duration_is_probed() {
        let resolver = FixedResolver::new(3.0);
        let asset = Asset::new("a.mp4", "/a.mp4", MediaKind::Video);
        assert_eq!(resolved_duration(&resolver, &asset).await.unwrap(), TimeUs::from_seconds(3.0));
        assert_eq!(resolver.calls.get(), 1);
    }

    #[tokio::test]
    async fn too_short_media_is_rejected() {
        let resolver = FixedResolver::new(0.05);
        let asset = Asset::new("blip.wav", "/blip.wav", MediaKind::Audio);
        let err = resolved_duration(&resolver, &asset).await.unwrap_err();
        assert!(matches!(err, CoreError::DurationResolution { .. }));
    }

    #[tokio::test]
    async fn place_adds_clip_after_resolution() {
        let resolver = FixedResolver::new(10.0);
        let mut tl = Timeline::new();
        let asset = Asset::new("a.mp4", "/a.mp4", MediaKind::Video);

        let clip = place(&mut tl, &resolver, &asset, TimeUs::ZERO).await.unwrap();
        assert_eq!(clip.intrinsic_duration, TimeUs::from_seconds(10.0));
        assert_eq!(tl.len(), 1);
    }

    #[tokio::test]
    async fn failed_resolution_leaves_timeline_untouched() {
        let mut tl = Timeline::new();
        let asset = Asset::new("bad.mp4", "/bad.mp4", MediaKind::Video);

        let result = place(&mut tl, &BrokenResolver, &asset, TimeUs::ZERO).await;
        assert!(matches!(result, Err(CoreError::DurationResolution { .. })));
        assert!(tl.is_empty());
    }

    #[tokio::test]
    async fn place_request_resolves_without_timeline() {
        let resolver = FixedResolver::new(6.0);
        let request = PlaceRequest {
            asset: Asset::new("a.mp3", "/a.mp3", MediaKind::Audio),
            start_time: TimeUs::from_seconds(2.0),
        };
        let resolved = request.resolve(&resolver).await.unwrap();
        assert_eq!(resolved.duration, TimeUs::from_seconds(6.0));
        assert_eq!(resolved.start_time, TimeUs::from_seconds(2.0));
    }

    #[tokio::test]
    async fn generated_media_becomes_library_asset() {
        let request = GenerationRequest {
            prompt: "a lighthouse at dusk".into(),
            kind: MediaKind::Image,
        };
        let asset = generate_asset(&EchoGenerator, &request).await.unwrap();
        assert_eq!(asset.kind, MediaKind::Image);
        assert_eq!(asset.media_ref, "blob:generated");
        assert_eq!(asset.name, "a lighthouse at dusk");
    }
}
