use std::path::PathBuf;

use thiserror::Error;

/// Failures raised by a chart provider.
#[derive(Debug, Error)]
pub enum ChartError {
    #[error("tile {index} out of range (chart has {len} tiles)")]
    TileOutOfRange { index: usize, len: usize },

    #[error("beat position is not finite: {beat}")]
    NonFiniteBeat { beat: f64 },

    #[error("invalid tempo {bpm} BPM at beat {beat}")]
    InvalidTempo { beat: f64, bpm: f64 },

    #[error("failed to read chart file: {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse chart: {0}")]
    Parse(String),
}

/// Failures raised by an input injector.
#[derive(Debug, Error)]
pub enum InjectError {
    #[error("input device unavailable: {0}")]
    Unavailable(String),

    #[error("input event rejected: {0}")]
    Rejected(String),
}

/// Anything that aborts a playback attempt, before or during the session.
#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error("chart error: {0}")]
    Chart(#[from] ChartError),

    #[error("injector error: {0}")]
    Inject(#[from] InjectError),

    #[error("injector lock poisoned by an earlier session")]
    InjectorPoisoned,

    #[error("failed to spawn playback thread")]
    Spawn(#[source] std::io::Error),
}

/// Errors surfaced by the player's control entry points.
#[derive(Debug, Error)]
pub enum PlayerError {
    #[error("no chart loaded")]
    ChartUnavailable,

    #[error(transparent)]
    Playback(#[from] PlaybackError),
}
