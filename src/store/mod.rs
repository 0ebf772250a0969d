//! Task Store Module
//!
//! Source of truth for tasks. Records live in memory and can be mirrored to a
//! JSON snapshot file so they survive a restart; the expiry index is rebuilt
//! from here at startup.

mod record;
mod repository;

pub use record::{TaskFields, TaskRecord};
pub use repository::{write_snapshot, TaskStore};
