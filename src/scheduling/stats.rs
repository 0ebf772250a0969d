//! Scheduler Statistics Module
//!
//! Counters updated by the scheduler thread and read by the stats endpoint.

use std::sync::atomic::{AtomicU64, Ordering};

// == Scheduler Stats ==
/// Alert delivery counters.
#[derive(Debug, Default)]
pub struct SchedulerStats {
    /// Tasks fired and removed from the index
    fired: AtomicU64,
    /// Fired tasks whose notifier returned an error or panicked
    notify_failures: AtomicU64,
}

impl SchedulerStats {
    /// Creates a new SchedulerStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Increments the fired counter.
    pub fn record_fired(&self) {
        self.fired.fetch_add(1, Ordering::Relaxed);
    }

    /// Increments the notifier failure counter.
    pub fn record_failure(&self) {
        self.notify_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn fired(&self) -> u64 {
        self.fired.load(Ordering::Relaxed)
    }

    pub fn notify_failures(&self) -> u64 {
        self.notify_failures.load(Ordering::Relaxed)
    }
}
