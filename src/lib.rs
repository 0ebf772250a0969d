//! Task Man - A task service with expiry alerts
//!
//! Keeps an in-memory index of tasks ordered by expiry and fires a one-time
//! alert for each task shortly before it expires.

pub mod alerts;
pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod scheduling;
pub mod store;

pub use alerts::ExpiryIndex;
pub use api::AppState;
pub use config::Config;
pub use scheduling::{ExpiryScheduler, SchedulerHandle};
