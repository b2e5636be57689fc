use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// TimeUs
// ---------------------------------------------------------------------------

/// Signed microseconds. Arithmetic saturates at the `i64` bounds.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeUs(pub i64);

impl TimeUs {
    pub const ZERO: Self = Self(0);

    /// Convert seconds to microseconds, rounding to the nearest microsecond.
    /// Out-of-range values saturate and NaN maps to zero.
    pub fn from_seconds(s: f64) -> Self {
        Self((s * 1_000_000.0).round() as i64)
    }

    pub fn from_millis(ms: i64) -> Self {
        Self(ms.saturating_mul(1_000))
    }

    pub fn as_seconds(&self) -> f64 {
        self.0 as f64 / 1_000_000.0
    }

    pub fn abs(self) -> Self {
        Self(self.0.saturating_abs())
    }
}

impl Add for TimeUs {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for TimeUs {
    fn add_assign(&mut self, rhs: Self) {
        self.0 = self.0.saturating_add(rhs.0);
    }
}

impl Sub for TimeUs {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self(self.0.saturating_sub(rhs.0))
    }
}

impl Neg for TimeUs {
    type Output = Self;
    fn neg(self) -> Self {
        Self(self.0.saturating_neg())
    }
}

impl Mul<i64> for TimeUs {
    type Output = Self;
    fn mul(self, rhs: i64) -> Self {
        Self(self.0.saturating_mul(rhs))
    }
}

impl Div<i64> for TimeUs {
    type Output = Self;
    fn div(self, rhs: i64) -> Self {
        Self(self.0.saturating_div(rhs))
    }
}

impl fmt::Display for TimeUs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total_us = self.0.unsigned_abs();
        let total_ms = total_us / 1_000;
        let ms = total_ms % 1_000;
        let total_secs = total_ms / 1_000;
        let secs = total_secs % 60;
        let total_mins = total_secs / 60;
        let mins = total_mins % 60;
        let hours = total_mins / 60;
        if self.0 < 0 {
            write!(f, "-{:02}:{:02}:{:02}.{:03}", hours, mins, secs, ms)
        } else {
            write!(f, "{:02}:{:02}:{:02}.{:03}", hours, mins, secs, ms)
        }
    }
}

// ---------------------------------------------------------------------------
// Timing constants
// ---------------------------------------------------------------------------

/// Shortest effective duration an edit may leave a clip with (exclusive).
pub const MIN_CLIP_DURATION: TimeUs = TimeUs(100_000);

/// Nominal duration given to still images.
pub const IMAGE_DURATION: TimeUs = TimeUs(5_000_000);

/// Floor for the timeline's total duration.
pub const MIN_TIMELINE_DURATION: TimeUs = TimeUs(15_000_000);

/// Rate of the logical transport clock.
pub const FRAME_RATE: u32 = 60;

/// One 60Hz tick, truncated to 16_666us. `Transport::tick` carries the
/// remainder, so this is only the nominal length.
pub const FRAME_INTERVAL: TimeUs = TimeUs(1_000_000 / FRAME_RATE as i64);

// ---------------------------------------------------------------------------
// MediaKind
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
    Audio,
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaKind::Image => f.write_str("image"),
            MediaKind::Video => f.write_str("video"),
            MediaKind::Audio => f.write_str("audio"),
        }
    }
}

// ---------------------------------------------------------------------------
// Asset
// ---------------------------------------------------------------------------

/// A library asset: imported or generated media that can be placed on the
/// timeline any number of times.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Asset {
    pub id: Uuid,
    pub name: String,
    pub media_ref: String,
    pub kind: MediaKind,
    /// Unknown until probed; images never need probing.
    pub duration: Option<TimeUs>,
}

impl Asset {
    pub fn new(name: impl Into<String>, media_ref: impl Into<String>, kind: MediaKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            media_ref: media_ref.into(),
            kind,
            duration: None,
        }
    }

    pub fn with_duration(mut self, duration: TimeUs) -> Self {
        self.duration = Some(duration);
        self
    }
}

// ---------------------------------------------------------------------------
// Clip
// ---------------------------------------------------------------------------

/// A placed, trimmed instance of an asset on the timeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Clip {
    pub timeline_id: Uuid,
    pub source_id: Uuid,
    pub kind: MediaKind,
    pub media_ref: String,
    pub intrinsic_duration: TimeUs,
    pub start_time: TimeUs,
    pub trim_start: TimeUs,
    pub trim_end: TimeUs,
}

impl Clip {
    pub fn effective_duration(&self) -> TimeUs {
        self.intrinsic_duration - self.trim_start - self.trim_end
    }

    pub fn end_time(&self) -> TimeUs {
        self.start_time + self.effective_duration()
    }

    /// Half-open containment: `start <= t < end`.
    pub fn contains(&self, t: TimeUs) -> bool {
        self.start_time <= t && t < self.end_time()
    }

    /// Position inside the untrimmed source that corresponds to the global
    /// timeline position `t`.
    pub fn source_offset_at(&self, t: TimeUs) -> TimeUs {
        t - self.start_time + self.trim_start
    }
}

/// Partial update merged into a clip by `Timeline::update`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ClipPatch {
    pub start_time: Option<TimeUs>,
    pub trim_start: Option<TimeUs>,
    pub trim_end: Option<TimeUs>,
    pub intrinsic_duration: Option<TimeUs>,
}

impl ClipPatch {
    pub fn start_time(t: TimeUs) -> Self {
        Self {
            start_time: Some(t),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub(crate) fn apply(&self, clip: &mut Clip) {
        if let Some(t) = self.start_time {
            clip.start_time = t;
        }
        if let Some(t) = self.trim_start {
            clip.trim_start = t;
        }
        if let Some(t) = self.trim_end {
            clip.trim_end = t;
        }
        if let Some(t) = self.intrinsic_duration {
            clip.intrinsic_duration = t;
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
