//! Scheduler - drift-corrected real-time dispatch of a timeline
//!
//! Every wait is computed against the session's start instant rather than
//! the previous event, so sleep overshoot never accumulates. The offset is
//! sampled once per event: a nudge moves every event not yet dispatched and
//! never touches the ones already sent.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::clock::Clock;
use crate::error::PlaybackError;
use crate::inject::InputInjector;
use crate::offset::OffsetController;
use crate::timeline::{EventKind, Timeline};

/// Cooperative stop signal for one playback session
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// Summary of a finished or cancelled session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionReport {
    /// Events handed to the injector
    pub dispatched: usize,
    /// Events in the timeline
    pub total: usize,
    /// Whether the session stopped before the end of the timeline
    pub cancelled: bool,
    /// Worst lateness seen when an event's target had already passed
    pub max_late_ns: i64,
}

impl SessionReport {
    pub fn completed(&self) -> bool {
        !self.cancelled && self.dispatched == self.total
    }
}

/// Play a timeline against a clock until it ends or is cancelled
pub fn run(
    timeline: &Timeline,
    offset: &OffsetController,
    cancel: &CancellationToken,
    clock: &dyn Clock,
    injector: &mut dyn InputInjector,
) -> Result<SessionReport, PlaybackError> {
    run_observed(timeline, offset, cancel, clock, injector, |_, _| {})
}

/// Like [`run`], calling `on_dispatch(index, kind)` after each injected event
pub fn run_observed<F>(
    timeline: &Timeline,
    offset: &OffsetController,
    cancel: &CancellationToken,
    clock: &dyn Clock,
    injector: &mut dyn InputInjector,
    mut on_dispatch: F,
) -> Result<SessionReport, PlaybackError>
where
    F: FnMut(usize, EventKind),
{
    let mut report = SessionReport {
        total: timeline.len(),
        ..SessionReport::default()
    };
    let start_ns = clock.now_ns();

    for (event_idx, event) in timeline.iter().enumerate() {
        if cancel.is_cancelled() {
            report.cancelled = true;
            break;
        }

        let target_ns = event.timestamp_ns.saturating_add(offset.current());
        let elapsed_ns = clock.now_ns() - start_ns;
        let wait_ns = target_ns.saturating_sub(elapsed_ns);

        if wait_ns > 0 {
            clock.sleep_ns(wait_ns);
        } else if wait_ns < 0 {
            // already late: fire now, never drop
            let late_ns = -wait_ns;
            report.max_late_ns = report.max_late_ns.max(late_ns);
            log::debug!("event {event_idx} late by {:.3}ms", late_ns as f64 / 1e6);
        }

        // a stop may have arrived while we slept
        if cancel.is_cancelled() {
            report.cancelled = true;
            break;
        }

        injector.inject(event.kind)?;
        report.dispatched += 1;
        on_dispatch(event_idx, event.kind);
    }

    Ok(report)
}
