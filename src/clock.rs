use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Abstraction over monotonic time sources.
/// Implementations: MonotonicClock (production), ManualClock (testing).
pub trait Clock: Send + Sync {
    /// Current time in nanoseconds from an arbitrary epoch.
    fn now_ns(&self) -> i64;

    /// Suspend the calling thread for roughly `ns` nanoseconds.
    fn sleep_ns(&self, ns: i64);
}

/// Monotonic clock backed by std::time::Instant.
///
/// Immune to wall-clock adjustments during a run.
pub struct MonotonicClock {
    start: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now_ns(&self) -> i64 {
        self.start.elapsed().as_nanos() as i64
    }

    fn sleep_ns(&self, ns: i64) {
        if ns > 0 {
            std::thread::sleep(Duration::from_nanos(ns as u64));
        }
    }
}

/// Virtual clock for deterministic testing.
///
/// Sleeping advances virtual time instantly. Clones share the same time.
#[derive(Clone, Default)]
pub struct ManualClock {
    current_ns: Arc<AtomicI64>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_time(&self, ns: i64) {
        self.current_ns.store(ns, Ordering::SeqCst);
    }

    pub fn advance(&self, delta_ns: i64) {
        self.current_ns.fetch_add(delta_ns, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ns(&self) -> i64 {
        self.current_ns.load(Ordering::SeqCst)
    }

    fn sleep_ns(&self, ns: i64) {
        if ns > 0 {
            self.advance(ns);
        }
    }
}
