//! Task Record Module

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::alerts::{ScheduledTask, TaskId};

// == Task Record ==
/// A stored task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub id: TaskId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Expiry timestamp, RFC 3339 on the wire
    #[serde(default)]
    pub expiry_dt: Option<DateTime<Utc>>,
}

impl TaskRecord {
    /// Builds a record from its id and fields.
    pub fn new(id: TaskId, fields: TaskFields) -> Self {
        Self {
            id,
            title: fields.title,
            description: fields.description,
            expiry_dt: fields.expiry_dt,
        }
    }

    /// Returns the expiry-index view of this task, if it has an expiry.
    pub fn schedule(&self) -> Option<ScheduledTask> {
        self.expiry_dt
            .map(|expiry| ScheduledTask::new(self.id, self.title.clone(), expiry))
    }
}

// == Task Fields ==
/// Caller-supplied task contents, without an id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskFields {
    pub title: String,
    pub description: Option<String>,
    pub expiry_dt: Option<DateTime<Utc>>,
}

impl TaskFields {
    pub fn new(title: impl Into<String>, expiry_dt: Option<DateTime<Utc>>) -> Self {
        Self {
            title: title.into(),
            description: None,
            expiry_dt,
        }
    }
}
