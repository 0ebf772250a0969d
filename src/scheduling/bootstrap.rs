//! Bootstrap Loader
//!
//! Seeds the expiry index once at startup, before the scheduler thread runs.
//! This is the only path by which tasks from a previous process re-enter the
//! index.

use chrono::{DateTime, Utc};
use tracing::info;

use crate::alerts::{ExpiryIndex, ScheduledTask};

/// Storage that can list the tasks still waiting to expire.
pub trait PendingTaskSource {
    /// Returns every task whose expiry is strictly after `now`, in any order.
    fn pending_tasks(&self, now: DateTime<Utc>) -> Vec<ScheduledTask>;
}

/// Loads all pending tasks from `source` into `index`.
///
/// Returns the number of tasks loaded.
pub fn seed_index<S>(index: &ExpiryIndex, source: &S, now: DateTime<Utc>) -> usize
where
    S: PendingTaskSource + ?Sized,
{
    let loaded = index.load(source.pending_tasks(now));
    info!("Expiry index seeded with {} pending tasks", loaded);
    loaded
}
