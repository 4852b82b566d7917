pub mod chart; // Tiles and beat-to-time mapping
pub mod clock;
pub mod config;
pub mod error;
pub mod inject;
pub mod offset;
pub mod player; // Start/stop state machine
pub mod scheduler; // Real-time dispatch loop
pub mod status;
pub mod timeline; // Chart to absolute event schedule

pub use chart::{ChartProvider, TempoChart, Tile};
pub use clock::{Clock, ManualClock, MonotonicClock};
pub use config::PlayerConfig;
pub use error::{ChartError, InjectError, PlaybackError, PlayerError};
pub use inject::{InputInjector, RecordingInjector};
pub use offset::OffsetController;
pub use player::{ControlMessage, Player, PlayerState};
pub use scheduler::{CancellationToken, SessionReport};
pub use status::{Status, StatusSink};
pub use timeline::{EventKind, ScheduledEvent, Timeline, TimelineBuilder};
