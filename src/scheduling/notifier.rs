//! Notifier Module
//!
//! Delivery side of an alert. The scheduler calls the notifier once per fired
//! task on its own thread, so implementations must return promptly.

use chrono::{DateTime, Utc};
use tracing::info;

use crate::alerts::ScheduledTask;

/// Receives one call per fired task.
///
/// An `Err` is logged by the scheduler and the task is still treated as
/// delivered.
pub trait Notifier: Send + Sync {
    /// Delivers the alert for `task`. `now` is the scheduler's clock reading
    /// at the moment the task was found due.
    fn notify(&self, task: &ScheduledTask, now: DateTime<Utc>) -> anyhow::Result<()>;
}

impl<F> Notifier for F
where
    F: Fn(&ScheduledTask, DateTime<Utc>) -> anyhow::Result<()> + Send + Sync,
{
    fn notify(&self, task: &ScheduledTask, now: DateTime<Utc>) -> anyhow::Result<()> {
        self(task, now)
    }
}

// == Log Notifier ==
/// Notifier that writes the alert to the application log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl LogNotifier {
    /// Formats the alert line for `task`.
    pub fn message(task: &ScheduledTask, now: DateTime<Utc>) -> String {
        if task.is_pending(now) {
            format!(
                "Your task (id:{},title:\"{}\") will be expired at {}!",
                task.id,
                task.title,
                task.expiry.to_rfc3339()
            )
        } else {
            format!(
                "Your task (id:{},title:\"{}\") is expired already at {}!",
                task.id,
                task.title,
                task.expiry.to_rfc3339()
            )
        }
    }
}

impl Notifier for LogNotifier {
    fn notify(&self, task: &ScheduledTask, now: DateTime<Utc>) -> anyhow::Result<()> {
        info!(task_id = task.id, "{}", Self::message(task, now));
        Ok(())
    }
}
