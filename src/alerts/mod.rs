//! Alerts Module
//!
//! In-memory expiry index ordering tracked tasks by (expiry, id), plus the
//! clock abstraction the scheduler reads "now" from.

mod clock;
mod index;
mod task;


// Re-export public types
pub use clock::{Clock, ManualClock, SystemClock};
pub use index::ExpiryIndex;
pub use task::{ScheduledTask, TaskId};

// == Public Constants ==
/// Default window before expiry in which a task is alerted (15 minutes)
pub const DEFAULT_ALERT_THRESHOLD_SECS: u64 = 15 * 60;

/// Largest accepted alert window (366 days)
pub const MAX_ALERT_THRESHOLD_SECS: u64 = 366 * 24 * 60 * 60;

/// Default scheduler poll interval in milliseconds
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 100;
