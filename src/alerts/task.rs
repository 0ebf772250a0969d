//! Scheduled Task Module
//!
//! The (id, title, expiry) triple tracked by the expiry index.

use chrono::{DateTime, Utc};

/// Task identifier assigned by the task store.
pub type TaskId = i64;

// == Scheduled Task ==
/// A task that carries an expiry and is waiting for its alert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledTask {
    /// Task id
    pub id: TaskId,
    /// Task title, passed through to the notifier
    pub title: String,
    /// Moment the task expires
    pub expiry: DateTime<Utc>,
}

impl ScheduledTask {
    /// Creates a new ScheduledTask.
    pub fn new(id: TaskId, title: impl Into<String>, expiry: DateTime<Utc>) -> Self {
        Self {
            id,
            title: title.into(),
            expiry,
        }
    }

    // == Due Check ==
    /// Returns true once `now` is within `threshold` of the expiry.
    ///
    /// Boundary condition: a task whose remaining time equals the threshold
    /// exactly is due. Already expired tasks are always due.
    pub fn is_due(&self, now: DateTime<Utc>, threshold: chrono::Duration) -> bool {
        self.expiry - now <= threshold
    }

    /// Returns true if the expiry is strictly after `now`.
    pub fn is_pending(&self, now: DateTime<Utc>) -> bool {
        self.expiry > now
    }
}
