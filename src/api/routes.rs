//! API Routes
//!
//! Configures the Axum router with all task service endpoints.

use axum::{routing::get, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    bulk_update_tasks, create_task, delete_all_tasks, delete_task, get_task, health_handler,
    list_tasks, stats_handler, update_task, AppState,
};

/// Path prefix shared by every endpoint
pub const API_PREFIX: &str = "/v1";

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET|POST|PUT|DELETE /v1/tasks` - List, create, bulk update, delete all
/// - `GET|PUT|DELETE /v1/tasks/:id` - Read, replace, delete one task
/// - `GET /v1/stats` - Expiry alert statistics
/// - `GET /v1/health` - Health check endpoint
///
/// # Middleware
/// - CORS: Allows any origin
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let v1 = Router::new()
        .route(
            "/tasks",
            get(list_tasks)
                .post(create_task)
                .put(bulk_update_tasks)
                .delete(delete_all_tasks),
        )
        .route(
            "/tasks/:id",
            get(get_task).put(update_task).delete(delete_task),
        )
        .route("/stats", get(stats_handler))
        .route("/health", get(health_handler));

    Router::new()
        .nest(API_PREFIX, v1)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
