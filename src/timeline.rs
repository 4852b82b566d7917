//! Timeline - beat-based chart to absolute press/release schedule
//!
//! The builder walks the chart once, placing a press at every tile's beat and
//! a matching release either at the end of its hold or a fixed tap length
//! later. The whole schedule is then shifted by the pre-roll countdown and
//! stably sorted, so equal timestamps keep their construction order.

use crate::chart::ChartProvider;
use crate::error::ChartError;

/// Beats of pre-roll the game plays before the first tile
pub const COUNTDOWN_BEATS: f64 = 4.0;

/// Contact time for a tap, long enough to register as a discrete hit
pub const TAP_NS: i64 = 10_000_000;

const NS_PER_SECOND: f64 = 1_000_000_000.0;

/// What the injector should do at an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Press,
    Release,
}

/// A single input action at an absolute time from playback start
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledEvent {
    /// Nanoseconds from playback start, before any user offset
    pub timestamp_ns: i64,
    pub kind: EventKind,
}

impl ScheduledEvent {
    pub fn press(timestamp_ns: i64) -> Self {
        Self {
            timestamp_ns,
            kind: EventKind::Press,
        }
    }

    pub fn release(timestamp_ns: i64) -> Self {
        Self {
            timestamp_ns,
            kind: EventKind::Release,
        }
    }
}

/// Immutable, time-ordered schedule of input events
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Timeline {
    events: Vec<ScheduledEvent>,
}

impl Timeline {
    /// Wrap hand-made events, stably sorting them by timestamp
    pub fn from_events(mut events: Vec<ScheduledEvent>) -> Self {
        events.sort_by_key(|e| e.timestamp_ns);
        Self { events }
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ScheduledEvent> {
        self.events.get(index)
    }

    pub fn events(&self) -> &[ScheduledEvent] {
        &self.events
    }

    pub fn iter(&self) -> impl Iterator<Item = &ScheduledEvent> {
        self.events.iter()
    }

    /// Timestamp of the last event (0 for an empty timeline)
    pub fn duration_ns(&self) -> i64 {
        self.events.last().map_or(0, |e| e.timestamp_ns)
    }

    /// Number of press events
    pub fn presses(&self) -> usize {
        self.events
            .iter()
            .filter(|e| e.kind == EventKind::Press)
            .count()
    }
}

impl<'a> IntoIterator for &'a Timeline {
    type Item = &'a ScheduledEvent;
    type IntoIter = std::slice::Iter<'a, ScheduledEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}

/// Builds a [`Timeline`] from a chart
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimelineBuilder {
    countdown_beats: f64,
    tap_ns: i64,
}

impl TimelineBuilder {
    pub fn new() -> Self {
        Self {
            countdown_beats: COUNTDOWN_BEATS,
            tap_ns: TAP_NS,
        }
    }

    /// Set the pre-roll length in beats
    pub fn countdown_beats(mut self, beats: f64) -> Self {
        self.countdown_beats = beats;
        self
    }

    /// Set the press length used for taps
    pub fn tap_ns(mut self, tap_ns: i64) -> Self {
        self.tap_ns = tap_ns;
        self
    }

    /// Walk the chart and produce the sorted schedule
    ///
    /// Never mutates the chart; the same chart always yields the same timeline.
    pub fn build(&self, chart: &dyn ChartProvider) -> Result<Timeline, ChartError> {
        let tiles = chart.tiles();
        let mut events = Vec::with_capacity(tiles.len() * 2);
        let mut beat_cursor = 0.0;

        for (i, tile) in tiles.iter().enumerate() {
            let hit_ns = seconds_to_ns(chart.time_at_beat(beat_cursor)?);
            events.push(ScheduledEvent::press(hit_ns));

            let release_ns = if tile.hold_duration > 0.0 {
                seconds_to_ns(chart.time_at_beat(beat_cursor + tile.hold_duration)?)
            } else {
                hit_ns.saturating_add(self.tap_ns)
            };
            events.push(ScheduledEvent::release(release_ns));

            // the last tile has no successor, so its span is never asked for
            if i + 1 < tiles.len() {
                beat_cursor += chart.beat_span_of_tile(i)?;
            }
        }

        if !events.is_empty() {
            let countdown_ns = seconds_to_ns(chart.time_at_beat(self.countdown_beats)?);
            // far-future times pin at i64::MAX rather than wrapping
            for event in &mut events {
                event.timestamp_ns = event.timestamp_ns.saturating_add(countdown_ns);
            }
        }

        // stable sort: presses stay ahead of releases at equal times
        Ok(Timeline::from_events(events))
    }
}

impl Default for TimelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Build a timeline with the default countdown and tap length
pub fn build(chart: &dyn ChartProvider) -> Result<Timeline, ChartError> {
    TimelineBuilder::new().build(chart)
}

/// Seconds to nanoseconds, truncating toward zero
fn seconds_to_ns(seconds: f64) -> i64 {
    (seconds * NS_PER_SECOND) as i64
}
