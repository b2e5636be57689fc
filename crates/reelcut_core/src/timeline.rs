use crate::error::{CoreError, Result};
use crate::types::*;
use uuid::Uuid;

/// Single-track, time-ordered clip collection.
///
/// Clips are always sorted by `start_time` (stable, so clips sharing a start
/// keep their insertion order). Overlap is tolerated; the active-clip
/// resolver picks the first match.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Timeline {
    clips: Vec<Clip>,
}

impl Timeline {
    pub fn new() -> Self {
        Self { clips: vec![] }
    }

    /// Clips in canonical (start time) order.
    pub fn clips(&self) -> &[Clip] {
        &self.clips
    }

    pub fn len(&self) -> usize {
        self.clips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }

    pub fn clip(&self, timeline_id: Uuid) -> Option<&Clip> {
        self.clips.iter().find(|c| c.timeline_id == timeline_id)
    }

    /// Place an asset whose duration is already known. A fresh timeline id is
    /// assigned and both trims start at zero. Negative start times clamp to 0.
    pub fn place(&mut self, asset: &Asset, intrinsic_duration: TimeUs, start_time: TimeUs) -> &Clip {
        let clip = Clip {
            timeline_id: Uuid::new_v4(),
            source_id: asset.id,
            kind: asset.kind,
            media_ref: asset.media_ref.clone(),
            intrinsic_duration,
            start_time: start_time.max(TimeUs::ZERO),
            trim_start: TimeUs::ZERO,
            trim_end: TimeUs::ZERO,
        };
        let id = clip.timeline_id;
        tracing::debug!(clip = %id, source = %asset.id, start = %clip.start_time, "Clip placed");
        self.clips.push(clip);
        self.sort();
        // Just inserted, so the lookup cannot miss.
        let idx = self
            .clips
            .iter()
            .position(|c| c.timeline_id == id)
            .unwrap_or(self.clips.len() - 1);
        &self.clips[idx]
    }

    /// Merge `patch` into the named clip and restore ordering. No invariant
    /// checks happen here; gestures guard their own edits.
    pub fn update(&mut self, timeline_id: Uuid, patch: ClipPatch) -> Result<()> {
        let clip = self
            .clips
            .iter_mut()
            .find(|c| c.timeline_id == timeline_id)
            .ok_or(CoreError::ClipNotFound(timeline_id))?;
        patch.apply(clip);
        self.sort();
        Ok(())
    }

    /// Remove a clip. Returns `None` when the id is unknown.
    pub fn remove(&mut self, timeline_id: Uuid) -> Option<Clip> {
        let pos = self.clips.iter().position(|c| c.timeline_id == timeline_id)?;
        let removed = self.clips.remove(pos);
        tracing::debug!(clip = %timeline_id, "Clip removed");
        Some(removed)
    }

    /// Latest clip end, or zero for an empty timeline.
    pub fn end(&self) -> TimeUs {
        self.clips
            .iter()
            .map(Clip::end_time)
            .max()
            .unwrap_or(TimeUs::ZERO)
    }

    /// Playable length: the latest clip end, never below the 15 second floor.
    pub fn total_duration(&self) -> TimeUs {
        self.end().max(MIN_TIMELINE_DURATION)
    }

    fn sort(&mut self) {
        self.clips.sort_by_key(|c| c.start_time);
    }
}
