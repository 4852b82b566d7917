//! Display state folded from player status notifications

use std::collections::VecDeque;

use autocat::Status;

/// Number of status lines kept for the history panel
pub const HISTORY_LEN: usize = 64;

/// Tone of the headline message, mapped to a color by the widgets
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tone {
    Ok,
    Busy,
    Adjust,
    Halt,
}

/// Everything the UI shows that arrives through the status ring
#[derive(Clone, Debug)]
pub struct UiState {
    /// Loaded chart name and tile count
    pub chart: Option<(String, usize)>,
    /// Events dispatched in the current session
    pub dispatched: usize,
    /// Events in the current session's timeline
    pub total: usize,
    /// Last offset the player reported
    pub offset_ns: i64,
    /// Latest human-readable message
    pub headline: String,
    pub tone: Tone,
    /// Recent messages, newest last
    pub history: VecDeque<String>,
}

impl UiState {
    pub fn new(offset_ns: i64) -> Self {
        Self {
            chart: None,
            dispatched: 0,
            total: 0,
            offset_ns,
            headline: "No chart selected".to_string(),
            tone: Tone::Halt,
            history: VecDeque::with_capacity(HISTORY_LEN),
        }
    }

    /// Fold one notification into the display state
    pub fn apply(&mut self, status: Status) {
        let tone = match &status {
            Status::ChartLoaded { title, tiles } => {
                self.chart = Some((title.clone(), *tiles));
                Tone::Ok
            }
            Status::Started { events } => {
                self.dispatched = 0;
                self.total = *events;
                Tone::Busy
            }
            Status::Progress { dispatched, total } => {
                // progress is too chatty for the headline
                self.dispatched = *dispatched;
                self.total = *total;
                return;
            }
            Status::OffsetChanged { offset_ns } => {
                self.offset_ns = *offset_ns;
                Tone::Adjust
            }
            Status::Finished(_) => Tone::Ok,
            Status::ChartUnavailable | Status::Stopped | Status::Error(_) => Tone::Halt,
        };

        self.note(status.to_string(), tone);
    }

    /// Show a message that did not come from the player
    pub fn note(&mut self, message: String, tone: Tone) {
        if self.history.len() == HISTORY_LEN {
            self.history.pop_front();
        }
        self.history.push_back(message.clone());
        self.headline = message;
        self.tone = tone;
    }

    /// Fraction of the session dispatched (0.0 - 1.0)
    pub fn progress(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.dispatched as f64 / self.total as f64
        }
    }
}
