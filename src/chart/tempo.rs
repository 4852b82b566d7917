//! Tempo Chart - piecewise-constant BPM keyed by beat
//!
//! Each tile advances the beat cursor by its span (plus any pause). A tile may
//! change the tempo; the change takes effect at that tile's beat.

use super::{ChartProvider, Tile};
use crate::error::ChartError;

/// One constant-tempo stretch of the chart.
#[derive(Clone, Debug, PartialEq)]
struct TempoSegment {
    start_beat: f64,
    start_s: f64,
    bpm: f64,
}

impl TempoSegment {
    fn time_at(&self, beat: f64) -> f64 {
        self.start_s + (beat - self.start_beat) * 60.0 / self.bpm
    }
}

/// Per-tile layout before the tempo map is resolved.
#[derive(Clone, Debug, PartialEq)]
struct TileLayout {
    span: f64,
    pause: f64,
}

/// A chart with per-tile spans, holds, pauses and tempo changes.
#[derive(Clone, Debug)]
pub struct TempoChart {
    title: String,
    tiles: Vec<Tile>,
    layout: Vec<TileLayout>,
    segments: Vec<TempoSegment>,
}

impl TempoChart {
    /// Start building a chart at the given initial tempo
    pub fn builder(bpm: f64) -> TempoChartBuilder {
        TempoChartBuilder::new(bpm)
    }

    /// Tempo in effect at a beat
    pub fn bpm_at_beat(&self, beat: f64) -> f64 {
        self.segment_at(beat).bpm
    }

    /// Number of tempo changes, counting the initial tempo
    pub fn tempo_segments(&self) -> usize {
        self.segments.len()
    }

    fn segment_at(&self, beat: f64) -> &TempoSegment {
        // segments are sorted by start_beat and never empty
        let idx = self
            .segments
            .partition_point(|s| s.start_beat <= beat)
            .saturating_sub(1);
        &self.segments[idx]
    }
}

impl ChartProvider for TempoChart {
    fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    fn time_at_beat(&self, beat: f64) -> Result<f64, ChartError> {
        if !beat.is_finite() {
            return Err(ChartError::NonFiniteBeat { beat });
        }
        Ok(self.segment_at(beat).time_at(beat))
    }

    fn beat_span_of_tile(&self, index: usize) -> Result<f64, ChartError> {
        self.layout
            .get(index)
            .map(|l| l.span + l.pause)
            .ok_or(ChartError::TileOutOfRange {
                index,
                len: self.layout.len(),
            })
    }

    fn title(&self) -> &str {
        &self.title
    }
}

/// Pending tile description inside the builder.
#[derive(Clone, Debug)]
struct PendingTile {
    span: f64,
    hold: f64,
    pause: f64,
    bpm: Option<f64>,
}

/// Builder for [`TempoChart`] with a fluent API
#[derive(Clone, Debug)]
pub struct TempoChartBuilder {
    title: String,
    bpm: f64,
    tiles: Vec<PendingTile>,
}

impl TempoChartBuilder {
    fn new(bpm: f64) -> Self {
        Self {
            title: "untitled".to_string(),
            bpm,
            tiles: Vec::new(),
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Add a tap tile followed by `span` beats
    pub fn tap(self, span: f64) -> Self {
        self.tile(span, 0.0)
    }

    /// Add a hold tile of `hold` beats followed by `span` beats
    pub fn hold(self, span: f64, hold: f64) -> Self {
        self.tile(span, hold)
    }

    /// Add a tile with explicit span and hold
    pub fn tile(mut self, span: f64, hold: f64) -> Self {
        self.tiles.push(PendingTile {
            span,
            hold,
            pause: 0.0,
            bpm: None,
        });
        self
    }

    /// Add extra beats after the most recently added tile
    pub fn pause(mut self, beats: f64) -> Self {
        if let Some(last) = self.tiles.last_mut() {
            last.pause += beats;
        }
        self
    }

    /// Change tempo at the most recently added tile
    pub fn bpm(mut self, bpm: f64) -> Self {
        match self.tiles.last_mut() {
            Some(last) => last.bpm = Some(bpm),
            None => self.bpm = bpm,
        }
        self
    }

    /// Resolve the tempo map and validate every tempo
    pub fn build(self) -> Result<TempoChart, ChartError> {
        check_bpm(0.0, self.bpm)?;

        let mut segments = Vec::new();
        let mut current = TempoSegment {
            start_beat: 0.0,
            start_s: 0.0,
            bpm: self.bpm,
        };
        let mut tiles = Vec::with_capacity(self.tiles.len());
        let mut layout = Vec::with_capacity(self.tiles.len());
        let mut beat = 0.0;

        for (index, pending) in self.tiles.into_iter().enumerate() {
            if let Some(bpm) = pending.bpm {
                check_bpm(beat, bpm)?;
                let next = TempoSegment {
                    start_beat: beat,
                    start_s: current.time_at(beat),
                    bpm,
                };
                // a zero-length segment is simply replaced
                if current.start_beat < beat {
                    segments.push(current);
                }
                current = next;
            }

            tiles.push(Tile {
                index,
                hold_duration: pending.hold,
            });
            layout.push(TileLayout {
                span: pending.span,
                pause: pending.pause,
            });
            beat += pending.span + pending.pause;
        }
        segments.push(current);

        Ok(TempoChart {
            title: self.title,
            tiles,
            layout,
            segments,
        })
    }
}

fn check_bpm(beat: f64, bpm: f64) -> Result<(), ChartError> {
    if bpm.is_finite() && bpm > 0.0 {
        Ok(())
    } else {
        Err(ChartError::InvalidTempo { beat, bpm })
    }
}
