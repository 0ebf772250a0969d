//! Request DTOs for the task API
//!
//! Defines the structure of incoming HTTP request bodies and query strings.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::alerts::TaskId;
use crate::store::TaskFields;

/// Maximum allowed title length in characters
pub const MAX_TITLE_LENGTH: usize = 256;

/// Request body for creating or replacing a task
/// (POST /v1/tasks, PUT /v1/tasks/:id)
///
/// # Fields
/// - `title`: Task title, required and non-empty
/// - `description`: Optional free text
/// - `expiry_dt`: Optional RFC 3339 timestamp; omitted means no expiry
#[derive(Debug, Clone, Deserialize)]
pub struct TaskRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub expiry_dt: Option<DateTime<Utc>>,
}

impl TaskRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        validate_title(&self.title)
    }
}

impl From<TaskRequest> for TaskFields {
    fn from(req: TaskRequest) -> Self {
        Self {
            title: req.title,
            description: req.description,
            expiry_dt: req.expiry_dt,
        }
    }
}

/// One entry of a bulk update
#[derive(Debug, Clone, Deserialize)]
pub struct BulkTaskUpdate {
    pub id: TaskId,
    #[serde(flatten)]
    pub task: TaskRequest,
}

/// Request body for PUT /v1/tasks
#[derive(Debug, Clone, Deserialize)]
pub struct BulkUpdateRequest {
    pub tasks: Vec<BulkTaskUpdate>,
}

impl BulkUpdateRequest {
    /// Validates every entry, reporting the first failure.
    pub fn validate(&self) -> Option<String> {
        self.tasks.iter().find_map(|entry| {
            entry
                .task
                .validate()
                .map(|msg| format!("Task {}: {}", entry.id, msg))
        })
    }
}

/// Query string for GET /v1/tasks
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListTasksQuery {
    /// Maximum number of tasks to return
    pub limit: Option<usize>,
    /// Number of tasks to skip
    pub offset: Option<usize>,
}

fn validate_title(title: &str) -> Option<String> {
    if title.trim().is_empty() {
        return Some("Title cannot be empty".to_string());
    }
    if title.chars().count() > MAX_TITLE_LENGTH {
        return Some(format!(
            "Title exceeds maximum length of {} characters",
            MAX_TITLE_LENGTH
        ));
    }
    None
}
