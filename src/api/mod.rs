//! API Module
//!
//! HTTP handlers and routing for the task service REST API.
//!
//! # Endpoints
//! - `GET /v1/tasks` - List tasks (`limit`, `offset`)
//! - `POST /v1/tasks` - Create a task (JSON or urlencoded form)
//! - `PUT /v1/tasks` - Bulk update tasks
//! - `DELETE /v1/tasks` - Delete all tasks
//! - `GET /v1/tasks/:id` - Get one task
//! - `PUT /v1/tasks/:id` - Replace one task
//! - `DELETE /v1/tasks/:id` - Delete one task
//! - `GET /v1/stats` - Expiry alert statistics
//! - `GET /v1/health` - Health check endpoint

pub mod extract;
pub mod handlers;
pub mod routes;

pub use extract::JsonOrForm;
pub use handlers::*;
pub use routes::create_router;
