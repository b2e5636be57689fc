//! Transport: the single playhead and its run state.

use crate::types::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransportState {
    #[default]
    Stopped,
    Running,
}

/// What a clock tick did to the transport.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// Transport was stopped; nothing moved.
    Idle,
    /// Playhead moved forward by one frame.
    Advanced,
    /// The frame would have reached the end: transport stopped and rewound to 0.
    ReachedEnd,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Transport {
    state: TransportState,
    playhead: TimeUs,
    total_duration: TimeUs,
    frame_rate: u32,
    /// Sub-microsecond remainder carried between ticks, in 1/frame_rate us.
    carry: i64,
}

impl Default for Transport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport {
    /// Stopped at 0 with the minimum timeline length and a 60Hz frame.
    pub fn new() -> Self {
        Self::with_frame_rate(FRAME_RATE)
    }

    pub fn with_frame_rate(frame_rate: u32) -> Self {
        Self {
            state: TransportState::Stopped,
            playhead: TimeUs::ZERO,
            total_duration: MIN_TIMELINE_DURATION,
            frame_rate: frame_rate.max(1),
            carry: 0,
        }
    }

    pub fn state(&self) -> TransportState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == TransportState::Running
    }

    pub fn playhead(&self) -> TimeUs {
        self.playhead
    }

    pub fn total_duration(&self) -> TimeUs {
        self.total_duration
    }

    pub fn frame_rate(&self) -> u32 {
        self.frame_rate
    }

    /// Nominal frame length, truncated to whole microseconds. Ticks carry the
    /// truncated remainder, so `frame_rate` ticks always advance exactly 1s.
    pub fn frame(&self) -> TimeUs {
        TimeUs(1_000_000 / i64::from(self.frame_rate))
    }

    pub fn play(&mut self) {
        if self.state != TransportState::Running {
            self.state = TransportState::Running;
            tracing::debug!(time = %self.playhead, "Transport running");
        }
    }

    pub fn stop(&mut self) {
        if self.state != TransportState::Stopped {
            self.state = TransportState::Stopped;
            tracing::debug!(time = %self.playhead, "Transport stopped");
        }
    }

    pub fn toggle_play(&mut self) {
        match self.state {
            TransportState::Running => self.stop(),
            TransportState::Stopped => self.play(),
        }
    }

    /// Move the playhead to `t`, clamped to `[0, total_duration]`. Run state
    /// is left alone.
    pub fn seek(&mut self, t: TimeUs) {
        self.playhead = t.clamp(TimeUs::ZERO, self.total_duration);
        self.carry = 0;
    }

    /// Called whenever the clip collection changes. Pulls the playhead back
    /// inside the new range if it shrank.
    pub fn set_total_duration(&mut self, total: TimeUs) {
        self.total_duration = total.max(TimeUs::ZERO);
        if self.playhead > self.total_duration {
            self.playhead = self.total_duration;
        }
    }

    /// Advance one frame if running. Reaching the end stops the transport and
    /// rewinds to 0 rather than looping.
    pub fn tick(&mut self) -> TickOutcome {
        if self.state != TransportState::Running {
            return TickOutcome::Idle;
        }
        let rate = i64::from(self.frame_rate);
        let numerator = 1_000_000 + self.carry;
        let next = self.playhead + TimeUs(numerator / rate);
        if next >= self.total_duration {
            self.state = TransportState::Stopped;
            self.playhead = TimeUs::ZERO;
            self.carry = 0;
            tracing::debug!(total = %self.total_duration, "End of timeline, rewound");
            TickOutcome::ReachedEnd
        } else {
            self.playhead = next;
            self.carry = numerator % rate;
            TickOutcome::Advanced
        }
    }
}
