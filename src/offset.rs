//! Offset Controller - live latency correction shared with the dispatch loop
//!
//! One signed nanosecond value, written by the control side and sampled by
//! the scheduler once per event. Nudges only land while a session is armed.

use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;

#[derive(Debug, Default)]
struct OffsetInner {
    offset_ns: AtomicI64,
    armed: AtomicBool,
}

/// Shared handle to the global playback offset; clones see the same value
#[derive(Debug, Clone, Default)]
pub struct OffsetController {
    inner: Arc<OffsetInner>,
}

impl OffsetController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a controller with a starting offset
    pub fn with_offset(offset_ns: i64) -> Self {
        let controller = Self::new();
        controller.inner.offset_ns.store(offset_ns, Ordering::Relaxed);
        controller
    }

    /// Shift the offset by `delta_ns` if a session is active.
    ///
    /// Unbounded in both directions. Returns the new offset when applied.
    pub fn nudge(&self, delta_ns: i64) -> Option<i64> {
        if !self.is_armed() {
            return None;
        }
        let previous = self.inner.offset_ns.fetch_add(delta_ns, Ordering::Relaxed);
        Some(previous.wrapping_add(delta_ns))
    }

    /// Latest offset in nanoseconds
    pub fn current(&self) -> i64 {
        self.inner.offset_ns.load(Ordering::Relaxed)
    }

    pub fn is_armed(&self) -> bool {
        self.inner.armed.load(Ordering::Acquire)
    }

    /// Allow nudges; called when a session begins
    pub(crate) fn arm(&self) {
        self.inner.armed.store(true, Ordering::Release);
    }

    /// Ignore nudges again; called when a session ends
    pub(crate) fn disarm(&self) {
        self.inner.armed.store(false, Ordering::Release);
    }
}
