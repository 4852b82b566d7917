//! Status surface - human-readable notifications for whatever displays them

use std::fmt;
use std::sync::{Arc, Mutex};

#[cfg(feature = "rtrb")]
use rtrb::Producer;

use crate::scheduler::SessionReport;

/// Notifications emitted by the player, from the control thread or the loop
#[derive(Debug, Clone, PartialEq)]
pub enum Status {
    ChartLoaded { title: String, tiles: usize },
    ChartUnavailable,
    Started { events: usize },
    Progress { dispatched: usize, total: usize },
    OffsetChanged { offset_ns: i64 },
    Stopped,
    Finished(SessionReport),
    Error(String),
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::ChartLoaded { title, tiles } => {
                write!(f, "Chart loaded: {title} ({tiles} tiles)")
            }
            Status::ChartUnavailable => write!(f, "Select a chart first"),
            Status::Started { events } => write!(f, "Running... ({events} events)"),
            Status::Progress { dispatched, total } => write!(f, "{dispatched}/{total}"),
            Status::OffsetChanged { offset_ns } => {
                write!(f, "Offset: {:+.0}ms", *offset_ns as f64 / 1e6)
            }
            Status::Stopped => write!(f, "Stopped"),
            Status::Finished(report) => {
                write!(f, "Finished ({} events", report.dispatched)?;
                if report.max_late_ns > 0 {
                    write!(f, ", worst lateness {:.1}ms", report.max_late_ns as f64 / 1e6)?;
                }
                write!(f, ")")
            }
            Status::Error(message) => write!(f, "Playback error: {message}"),
        }
    }
}

/// Receiver of status notifications.
///
/// Called from the control thread and from the dispatch loop, so it must
/// never block for long.
pub trait StatusSink: Send {
    fn push(&mut self, status: Status);
}

impl StatusSink for Vec<Status> {
    fn push(&mut self, status: Status) {
        Vec::push(self, status);
    }
}

impl<S: StatusSink + ?Sized> StatusSink for Box<S> {
    fn push(&mut self, status: Status) {
        (**self).push(status);
    }
}

/// Shared sinks let a test (or a UI) read what the player pushed
impl<S: StatusSink + ?Sized> StatusSink for Arc<Mutex<S>> {
    fn push(&mut self, status: Status) {
        let mut sink = self.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        sink.push(status);
    }
}

/// Discards every notification
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl StatusSink for NullSink {
    fn push(&mut self, _status: Status) {}
}

#[cfg(feature = "rtrb")]
impl StatusSink for Producer<Status> {
    fn push(&mut self, status: Status) {
        // a full ring means the display is behind; it only needs the latest
        if Producer::push(self, status).is_err() {
            log::trace!("status ring full, dropping notification");
        }
    }
}
