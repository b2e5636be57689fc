use crate::surface::TimeScale;
use crate::types::TimeUs;

/// Sub-ticks are drawn only above this zoom.
pub const SUBTICK_ZOOM: f64 = 0.8;

/// Sub-ticks per major interval.
pub const SUBDIVISIONS: i64 = 4;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RulerTick {
    pub time: TimeUs,
    /// Viewport x.
    pub x: f64,
    pub major: bool,
}

impl RulerTick {
    /// `m:ss` for major ticks.
    pub fn label(&self) -> Option<String> {
        if !self.major {
            return None;
        }
        let secs = self.time.0 / 1_000_000;
        Some(format!("{}:{:02}", secs / 60, secs % 60))
    }
}

/// Spacing of labelled ticks for a zoom level.
pub fn major_interval(zoom: f64) -> TimeUs {
    if zoom > 0.5 {
        TimeUs(1_000_000)
    } else if zoom > 0.2 {
        TimeUs(5_000_000)
    } else {
        TimeUs(10_000_000)
    }
}

/// Lazy tick sequence covering `[0, total]`. Cloning restarts it.
#[derive(Debug, Clone)]
pub struct RulerTicks {
    scale: TimeScale,
    interval: TimeUs,
    step: TimeUs,
    total: TimeUs,
    index: i64,
}

impl Iterator for RulerTicks {
    type Item = RulerTick;

    fn next(&mut self) -> Option<RulerTick> {
        let time = self.step * self.index;
        if time > self.total {
            return None;
        }
        self.index += 1;
        Some(RulerTick {
            time,
            x: self.scale.time_to_x(time),
            major: time.0 % self.interval.0 == 0,
        })
    }
}

pub fn ruler_ticks(total: TimeUs, scale: &TimeScale) -> RulerTicks {
    let interval = major_interval(scale.zoom());
    let step = if scale.zoom() > SUBTICK_ZOOM {
        interval / SUBDIVISIONS
    } else {
        interval
    };
    RulerTicks {
        scale: *scale,
        interval,
        step,
        total,
        index: 0,
    }
}
