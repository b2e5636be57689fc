//! Interactive editing surface: time/pixel mapping, drop handling, edge trims
//! and playhead scrubbing.
//!
//! Gestures are modelled as an explicit session. Pointer-move and pointer-up
//! only do anything while a session is open, and `cancel` (surface teardown)
//! closes it without touching state.

use crate::error::Result;
use crate::payload::DragPayload;
use crate::timeline::Timeline;
use crate::transport::Transport;
use crate::types::*;
use uuid::Uuid;

pub const MIN_ZOOM: f64 = 0.1;
pub const MAX_ZOOM: f64 = 5.0;
pub const ZOOM_STEP: f64 = 0.1;
/// Floor for the base scale; keeps pixel/time conversion finite.
pub const MIN_PIXELS_PER_SECOND: f64 = 1.0;

// ---------------------------------------------------------------------------
// TimeScale
// ---------------------------------------------------------------------------

/// Maps timeline time to horizontal viewport pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeScale {
    pixels_per_second: f64,
    zoom: f64,
    scroll_offset: f64,
}

impl TimeScale {
    pub fn new(pixels_per_second: f64, zoom: f64) -> Self {
        let pixels_per_second = if pixels_per_second.is_finite() {
            pixels_per_second.max(MIN_PIXELS_PER_SECOND)
        } else {
            MIN_PIXELS_PER_SECOND
        };
        Self {
            pixels_per_second,
            zoom: clamp_zoom(zoom),
            scroll_offset: 0.0,
        }
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    /// Continuous zoom control. Clamped to `[MIN_ZOOM, MAX_ZOOM]`.
    pub fn set_zoom(&mut self, zoom: f64) {
        self.zoom = clamp_zoom(zoom);
    }

    pub fn zoom_in(&mut self) {
        self.set_zoom(round_step(self.zoom + ZOOM_STEP));
    }

    pub fn zoom_out(&mut self) {
        self.set_zoom(round_step(self.zoom - ZOOM_STEP));
    }

    pub fn scroll_offset(&self) -> f64 {
        self.scroll_offset
    }

    pub fn set_scroll_offset(&mut self, px: f64) {
        self.scroll_offset = px.max(0.0);
    }

    /// Effective pixels per second at the current zoom.
    pub fn pixels_per_second(&self) -> f64 {
        self.pixels_per_second * self.zoom
    }

    /// Viewport x to timeline time: `(x + scroll) / (pps * zoom)`.
    pub fn x_to_time(&self, x: f64) -> TimeUs {
        TimeUs::from_seconds((x + self.scroll_offset) / self.pixels_per_second())
    }

    pub fn time_to_x(&self, t: TimeUs) -> f64 {
        t.as_seconds() * self.pixels_per_second() - self.scroll_offset
    }

    /// Pointer delta to time delta; scroll does not apply.
    pub fn dx_to_dt(&self, dx: f64) -> TimeUs {
        TimeUs::from_seconds(dx / self.pixels_per_second())
    }
}

fn clamp_zoom(z: f64) -> f64 {
    if z.is_nan() {
        return 1.0;
    }
    z.clamp(MIN_ZOOM, MAX_ZOOM)
}

// Button steps land on tenths so threshold comparisons stay exact.
fn round_step(z: f64) -> f64 {
    (z * 10.0).round() / 10.0
}

/// Where a clip is drawn, in viewport pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipGeometry {
    pub left: f64,
    pub width: f64,
}

pub fn clip_geometry(clip: &Clip, scale: &TimeScale) -> ClipGeometry {
    ClipGeometry {
        left: scale.time_to_x(clip.start_time),
        width: clip.effective_duration().as_seconds() * scale.pixels_per_second(),
    }
}

// ---------------------------------------------------------------------------
// Trim rules
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrimEdge {
    Left,
    Right,
}

/// Left-edge trim by `dt`. Moves the start along with the head trim. `None`
/// when the clip would start before 0 or end up no longer than the minimum.
pub fn trim_left(clip: &Clip, dt: TimeUs) -> Option<ClipPatch> {
    let trim_start = (clip.trim_start + dt).max(TimeUs::ZERO);
    let start_time = clip.start_time + dt;
    let remaining = clip.intrinsic_duration - trim_start - clip.trim_end;
    if start_time < TimeUs::ZERO || remaining <= MIN_CLIP_DURATION {
        return None;
    }
    Some(ClipPatch {
        start_time: Some(start_time),
        trim_start: Some(trim_start),
        ..ClipPatch::default()
    })
}

/// Right-edge trim by `dt` (positive extends, negative shortens).
pub fn trim_right(clip: &Clip, dt: TimeUs) -> Option<ClipPatch> {
    let trim_end = (clip.trim_end - dt).max(TimeUs::ZERO);
    let remaining = clip.intrinsic_duration - clip.trim_start - trim_end;
    if remaining <= MIN_CLIP_DURATION {
        return None;
    }
    Some(ClipPatch {
        trim_end: Some(trim_end),
        ..ClipPatch::default()
    })
}

// ---------------------------------------------------------------------------
// Drops
// ---------------------------------------------------------------------------

/// What a drop on the timeline asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropAction {
    /// Place a new clip of a library asset.
    Place { source_id: Uuid, start_time: TimeUs },
    /// Move an existing clip.
    Reposition { timeline_id: Uuid, start_time: TimeUs },
}

/// Move a clip so it starts at `start_time` (clamped to 0).
pub fn reposition(timeline: &mut Timeline, timeline_id: Uuid, start_time: TimeUs) -> Result<()> {
    timeline.update(timeline_id, ClipPatch::start_time(start_time.max(TimeUs::ZERO)))
}

// ---------------------------------------------------------------------------
// Gesture sessions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct TrimSession {
    pub timeline_id: Uuid,
    pub edge: TrimEdge,
    origin_x: f64,
    /// Clip as it was on pointer-down; every frame trims from here.
    origin: Clip,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Gesture {
    Trim(TrimSession),
    Scrub,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EditingSurface {
    scale: TimeScale,
    gesture: Option<Gesture>,
}

impl EditingSurface {
    pub fn new(scale: TimeScale) -> Self {
        Self { scale, gesture: None }
    }

    pub fn scale(&self) -> &TimeScale {
        &self.scale
    }

    pub fn scale_mut(&mut self) -> &mut TimeScale {
        &mut self.scale
    }

    pub fn gesture(&self) -> Option<&Gesture> {
        self.gesture.as_ref()
    }

    pub fn is_dragging(&self) -> bool {
        self.gesture.is_some()
    }

    /// Interpret a raw drop payload at viewport x. Malformed payloads are
    /// logged and ignored.
    pub fn drop_action(&self, raw_payload: &str, x: f64) -> Option<DropAction> {
        let payload = match DragPayload::parse(raw_payload) {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring drop");
                return None;
            }
        };
        let start_time = self.scale.x_to_time(x).max(TimeUs::ZERO);
        Some(match payload {
            DragPayload::LibraryAsset { source_id } => DropAction::Place { source_id, start_time },
            DragPayload::TimelineAsset { timeline_id, .. } => DropAction::Reposition { timeline_id, start_time },
        })
    }

    /// Pointer-down on a clip's edge handle.
    pub fn begin_trim(&mut self, clip: &Clip, edge: TrimEdge, x: f64) {
        tracing::debug!(clip = %clip.timeline_id, ?edge, "Trim started");
        self.gesture = Some(Gesture::Trim(TrimSession {
            timeline_id: clip.timeline_id,
            edge,
            origin_x: x,
            origin: clip.clone(),
        }));
    }

    /// Pointer-down on the playhead. Seeks immediately.
    pub fn begin_scrub(&mut self, x: f64, transport: &mut Transport) {
        self.gesture = Some(Gesture::Scrub);
        transport.seek(self.scale.x_to_time(x));
    }

    /// Pointer-move. Returns whether anything changed.
    pub fn pointer_move(&mut self, x: f64, timeline: &mut Timeline, transport: &mut Transport) -> bool {
        match &self.gesture {
            None => false,
            Some(Gesture::Scrub) => {
                let before = transport.playhead();
                transport.seek(self.scale.x_to_time(x));
                transport.playhead() != before
            }
            Some(Gesture::Trim(session)) => {
                let dt = self.scale.dx_to_dt(x - session.origin_x);
                let patch = match session.edge {
                    TrimEdge::Left => trim_left(&session.origin, dt),
                    TrimEdge::Right => trim_right(&session.origin, dt),
                };
                let Some(patch) = patch else {
                    return false;
                };
                let id = session.timeline_id;
                if timeline.clip(id).is_some_and(|c| patch_is_noop(c, &patch)) {
                    return false;
                }
                match timeline.update(id, patch) {
                    Ok(()) => true,
                    Err(e) => {
                        tracing::debug!(error = %e, "Trimmed clip disappeared, ending gesture");
                        self.gesture = None;
                        false
                    }
                }
            }
        }
    }

    /// Pointer-up: apply the final position and close the session.
    pub fn pointer_up(&mut self, x: f64, timeline: &mut Timeline, transport: &mut Transport) -> bool {
        let changed = self.pointer_move(x, timeline, transport);
        if self.gesture.take().is_some() {
            tracing::debug!("Gesture ended");
        }
        changed
    }

    /// Drop any open session without applying it, e.g. when the surface goes away.
    pub fn cancel(&mut self) {
        self.gesture = None;
    }
}

fn patch_is_noop(clip: &Clip, patch: &ClipPatch) -> bool {
    let mut patched = clip.clone();
    patch.apply(&mut patched);
    patched == *clip
}
