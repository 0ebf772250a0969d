//! Scheduling Module
//!
//! Background machinery that turns the expiry index into alerts.
//!
//! # Parts
//! - Scheduler: dedicated thread polling the index and firing due tasks
//! - Notifier: pluggable delivery of a fired alert
//! - Bootstrap: one-time seeding of the index from the task store

pub mod bootstrap;
mod notifier;
mod scheduler;
mod stats;

pub use bootstrap::{seed_index, PendingTaskSource};
pub use notifier::{LogNotifier, Notifier};
pub use scheduler::{ExpiryScheduler, SchedulerHandle};
pub use stats::SchedulerStats;
