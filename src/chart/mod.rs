//! Chart data as seen by the timeline builder.
//!
//! A chart is an ordered run of tiles plus two pure functions: where a beat
//! lands in seconds, and how many beats separate a tile from its successor.

#[cfg(feature = "serde")]
pub mod file;
pub mod tempo;

use crate::error::ChartError;

pub use tempo::{TempoChart, TempoChartBuilder};

/// A single tile of a chart.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tile {
    /// Position in the chart (0-based)
    pub index: usize,
    /// Hold length in beats (0 = tap, >0 = sustained press)
    pub hold_duration: f64,
}

impl Tile {
    pub fn tap(index: usize) -> Self {
        Self {
            index,
            hold_duration: 0.0,
        }
    }

    pub fn hold(index: usize, beats: f64) -> Self {
        Self {
            index,
            hold_duration: beats,
        }
    }

    pub fn is_hold(&self) -> bool {
        self.hold_duration > 0.0
    }
}

/// Source of tiles and beat-to-time mapping for one loaded chart.
///
/// Implementations must be deterministic: the same arguments always produce
/// the same answers for as long as the chart is loaded.
pub trait ChartProvider: Send + Sync {
    fn tiles(&self) -> &[Tile];

    /// Seconds from the first tile to the given beat.
    fn time_at_beat(&self, beat: f64) -> Result<f64, ChartError>;

    /// Beats between tile `index` and the tile after it.
    fn beat_span_of_tile(&self, index: usize) -> Result<f64, ChartError>;

    /// Display name for the status surface
    fn title(&self) -> &str {
        "untitled"
    }
}
