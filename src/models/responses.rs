//! Response DTOs for the task API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::store::TaskRecord;

/// Response body for task listings (GET /v1/tasks, PUT /v1/tasks)
#[derive(Debug, Clone, Serialize)]
pub struct TaskListResponse {
    pub tasks: Vec<TaskRecord>,
}

impl TaskListResponse {
    pub fn new(tasks: Vec<TaskRecord>) -> Self {
        Self { tasks }
    }
}

/// Response body for deletions (DELETE /v1/tasks, DELETE /v1/tasks/:id)
#[derive(Debug, Clone, Serialize)]
pub struct DeleteResponse {
    /// Success message
    pub message: String,
    /// Number of tasks deleted
    pub deleted: usize,
}

impl DeleteResponse {
    /// Creates a new DeleteResponse
    pub fn new(deleted: usize) -> Self {
        Self {
            message: format!("Deleted {} task(s)", deleted),
            deleted,
        }
    }
}

/// Response body for the stats endpoint (GET /v1/stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    /// Tasks currently waiting for an alert
    pub tracked: usize,
    /// Alerts fired since startup
    pub fired: u64,
    /// Fired alerts whose delivery failed
    pub notify_failures: u64,
}

/// Response body for the health endpoint (GET /v1/health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    /// Creates a new ErrorResponse
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::TaskFields;

    #[test]
    fn test_task_list_serialize() {
        let resp = TaskListResponse::new(vec![TaskRecord::new(1, TaskFields::new("a", None))]);
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["tasks"][0]["id"], 1);
        assert_eq!(json["tasks"][0]["title"], "a");
        assert!(json["tasks"][0]["expiry_dt"].is_null());
    }

    #[test]
    fn test_delete_response_serialize() {
        let resp = DeleteResponse::new(3);
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("\"deleted\":3"));
    }

    #[test]
    fn test_health_response_serialize() {
        let resp = HealthResponse::healthy();
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("healthy"));
        assert!(json.contains("timestamp"));
    }

    #[test]
    fn test_error_response_serialize() {
        let resp = ErrorResponse::new("Something went wrong");
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("error"));
        assert!(json.contains("Something went wrong"));
    }
}
