//! Active-clip resolution: which media drives the preview right now.

use crate::types::*;
use uuid::Uuid;

/// The media currently driving the preview output, and why.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ActiveClip<'a> {
    /// A timeline clip the user explicitly picked for inspection.
    Selected(&'a Clip),
    /// The clip under the playhead.
    Playhead { clip: &'a Clip, source_offset: TimeUs },
    /// A library asset being previewed outside the timeline.
    Library(&'a Asset),
}

impl<'a> ActiveClip<'a> {
    pub fn media_ref(&self) -> &'a str {
        match self {
            ActiveClip::Selected(clip) => &clip.media_ref,
            ActiveClip::Playhead { clip, .. } => &clip.media_ref,
            ActiveClip::Library(asset) => &asset.media_ref,
        }
    }

    pub fn kind(&self) -> MediaKind {
        match self {
            ActiveClip::Selected(clip) => clip.kind,
            ActiveClip::Playhead { clip, .. } => clip.kind,
            ActiveClip::Library(asset) => asset.kind,
        }
    }

    /// In-source offset, only known when resolved from the playhead.
    pub fn source_offset(&self) -> Option<TimeUs> {
        match self {
            ActiveClip::Playhead { source_offset, .. } => Some(*source_offset),
            _ => None,
        }
    }

    pub fn timeline_id(&self) -> Option<Uuid> {
        match self {
            ActiveClip::Selected(clip) => Some(clip.timeline_id),
            ActiveClip::Playhead { clip, .. } => Some(clip.timeline_id),
            ActiveClip::Library(_) => None,
        }
    }
}

/// Resolve the active clip.
///
/// Priority: the selected timeline clip, then the first clip (in start order)
/// containing the playhead, then the library preview asset. Overlapping clips
/// resolve to whichever sorts first.
pub fn resolve_active<'a>(
    playhead: TimeUs,
    clips: &'a [Clip],
    selected: Option<Uuid>,
    library_preview: Option<&'a Asset>,
) -> Option<ActiveClip<'a>> {
    if let Some(clip) = selected.and_then(|id| clips.iter().find(|c| c.timeline_id == id)) {
        return Some(ActiveClip::Selected(clip));
    }

    if let Some(clip) = clips.iter().find(|c| c.contains(playhead)) {
        return Some(ActiveClip::Playhead {
            clip,
            source_offset: clip.source_offset_at(playhead),
        });
    }

    library_preview.map(ActiveClip::Library)
}
