//! Player configuration

use std::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::timeline::{TimelineBuilder, COUNTDOWN_BEATS, TAP_NS};

/// Default offset step for one nudge: 5ms
pub const NUDGE_STEP_NS: i64 = 5_000_000;

/// Default time a stop request waits for the loop to exit
pub const STOP_WAIT_MS: u64 = 100;

/// Tunables for timeline construction and playback control
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PlayerConfig {
    /// Pre-roll before the first tile, in beats
    pub countdown_beats: f64,
    /// Press length for taps, in nanoseconds (fixed, not tempo-relative)
    pub tap_ns: i64,
    /// Offset change per nudge signal
    pub nudge_step_ns: i64,
    /// How long stop waits for the loop before forcing idle
    pub stop_wait_ms: u64,
    /// Offset in effect before any nudges
    pub offset_ns: i64,
}

impl PlayerConfig {
    pub fn new() -> Self {
        Self {
            countdown_beats: COUNTDOWN_BEATS,
            tap_ns: TAP_NS,
            nudge_step_ns: NUDGE_STEP_NS,
            stop_wait_ms: STOP_WAIT_MS,
            offset_ns: 0,
        }
    }

    pub fn countdown_beats(mut self, beats: f64) -> Self {
        self.countdown_beats = beats;
        self
    }

    pub fn tap_ns(mut self, tap_ns: i64) -> Self {
        self.tap_ns = tap_ns;
        self
    }

    pub fn nudge_step_ns(mut self, step_ns: i64) -> Self {
        self.nudge_step_ns = step_ns;
        self
    }

    pub fn stop_wait(mut self, wait: Duration) -> Self {
        self.stop_wait_ms = wait.as_millis() as u64;
        self
    }

    pub fn offset_ns(mut self, offset_ns: i64) -> Self {
        self.offset_ns = offset_ns;
        self
    }

    pub fn stop_wait_duration(&self) -> Duration {
        Duration::from_millis(self.stop_wait_ms)
    }

    /// Timeline builder carrying this config's countdown and tap length
    pub fn timeline_builder(&self) -> TimelineBuilder {
        TimelineBuilder::new()
            .countdown_beats(self.countdown_beats)
            .tap_ns(self.tap_ns)
    }
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self::new()
    }
}
