//! JSON chart files.
//!
//! ```json
//! { "title": "demo", "bpm": 120.0,
//!   "tiles": [ { "span": 1.0 }, { "span": 0.5, "hold": 1.0 }, { "span": 1.0, "bpm": 180.0 } ] }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{ChartProvider, TempoChart};
use crate::error::ChartError;

/// On-disk chart description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartFile {
    #[serde(default)]
    pub title: Option<String>,
    pub bpm: f64,
    #[serde(default)]
    pub tiles: Vec<TileEntry>,
}

/// One tile as written in a chart file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileEntry {
    /// Beats to the next tile
    pub span: f64,
    #[serde(default)]
    pub hold: f64,
    #[serde(default)]
    pub pause: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bpm: Option<f64>,
}

impl ChartFile {
    pub fn from_json(text: &str) -> Result<Self, ChartError> {
        serde_json::from_str(text).map_err(|e| ChartError::Parse(e.to_string()))
    }

    pub fn into_chart(self) -> Result<TempoChart, ChartError> {
        let mut builder = TempoChart::builder(self.bpm);
        if let Some(title) = self.title {
            builder = builder.title(title);
        }
        for tile in self.tiles {
            builder = builder.tile(tile.span, tile.hold).pause(tile.pause);
            if let Some(bpm) = tile.bpm {
                builder = builder.bpm(bpm);
            }
        }
        builder.build()
    }
}

/// Parse a chart from JSON text
pub fn parse_chart(text: &str) -> Result<TempoChart, ChartError> {
    ChartFile::from_json(text)?.into_chart()
}

/// Load a chart file; the file stem becomes the title when none is given
pub fn load_chart<P: AsRef<Path>>(path: P) -> Result<TempoChart, ChartError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| ChartError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let mut file = ChartFile::from_json(&text)?;
    if file.title.is_none() {
        file.title = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned());
    }

    let chart = file.into_chart()?;
    log::info!("loaded chart {} from {}", chart.title(), path.display());
    Ok(chart)
}
