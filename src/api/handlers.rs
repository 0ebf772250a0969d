//! API Handlers
//!
//! HTTP request handlers for the task endpoints. Every handler that changes a
//! task's expiry keeps the expiry index in step with the store.

use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use tracing::{error, warn};

use crate::alerts::{ExpiryIndex, TaskId};
use crate::api::extract::JsonOrForm;
use crate::error::{Result, TaskError};
use crate::models::{
    BulkUpdateRequest, DeleteResponse, HealthResponse, ListTasksQuery, StatsResponse,
    TaskListResponse, TaskRequest,
};
use crate::scheduling::SchedulerStats;
use crate::store::{write_snapshot, TaskFields, TaskRecord, TaskStore};

/// Application state shared across all handlers.
///
/// The store sits behind an async RwLock; the index carries its own lock.
/// Handlers mutate both while holding the store write lock so the index sees
/// changes in the same order as the store.
#[derive(Clone)]
pub struct AppState {
    /// Task store
    pub store: Arc<RwLock<TaskStore>>,
    /// Expiry index shared with the scheduler thread
    pub index: Arc<ExpiryIndex>,
    /// Counters published by the scheduler
    pub stats: Arc<SchedulerStats>,
    /// Snapshot file rewritten after each change
    pub data_file: Option<PathBuf>,
}

impl AppState {
    /// Creates a new AppState around a store and index.
    pub fn new(store: TaskStore, index: Arc<ExpiryIndex>) -> Self {
        Self {
            store: Arc::new(RwLock::new(store)),
            index,
            stats: Arc::new(SchedulerStats::new()),
            data_file: None,
        }
    }

    /// Publishes the given scheduler counters on /v1/stats.
    pub fn with_stats(mut self, stats: Arc<SchedulerStats>) -> Self {
        self.stats = stats;
        self
    }

    /// Enables snapshot persistence to `path`.
    pub fn with_data_file(mut self, path: Option<PathBuf>) -> Self {
        self.data_file = path;
        self
    }

    /// Points the index at the record's current expiry.
    fn sync_index(&self, record: &TaskRecord) {
        match record.expiry_dt {
            Some(expiry) => self
                .index
                .add_or_replace(record.id, record.title.clone(), Some(expiry)),
            None => {
                self.index.remove(record.id);
            }
        }
    }

    /// Applies `change` to the store only once it has been written to the
    /// snapshot file.
    ///
    /// With a data file configured, the change runs on a copy of the store;
    /// the copy replaces the live store after the snapshot write succeeds.
    /// On any error the live store is left untouched. Callers update the
    /// index only after this returns `Ok`.
    async fn commit<T, F>(&self, store: &mut TaskStore, change: F) -> Result<T>
    where
        F: FnOnce(&mut TaskStore) -> Result<T>,
    {
        let Some(path) = &self.data_file else {
            return change(store);
        };

        let mut staged = store.clone();
        let outcome = change(&mut staged)?;
        write_snapshot(path, &staged.snapshot())
            .await
            .map_err(|err| {
                error!("Failed to save tasks to {}: {}", path.display(), err);
                err
            })?;

        *store = staged;
        Ok(outcome)
    }
}

/// Handler for GET /v1/tasks
///
/// Lists tasks in id order, paged by optional `offset` and `limit`.
pub async fn list_tasks(
    State(state): State<AppState>,
    Query(query): Query<ListTasksQuery>,
) -> Json<TaskListResponse> {
    let store = state.store.read().await;
    let tasks = store.list(query.offset.unwrap_or(0), query.limit);

    Json(TaskListResponse::new(tasks))
}

/// Handler for POST /v1/tasks
///
/// Creates a task and schedules its alert when it has an expiry. Accepts a
/// JSON body or an `application/x-www-form-urlencoded` form.
pub async fn create_task(
    State(state): State<AppState>,
    JsonOrForm(req): JsonOrForm<TaskRequest>,
) -> Result<Json<TaskRecord>> {
    if let Some(error_msg) = req.validate() {
        return Err(TaskError::InvalidRequest(error_msg));
    }

    let fields = TaskFields::from(req);
    let mut store = state.store.write().await;
    let record = state
        .commit(&mut store, move |store| Ok(store.insert(fields)))
        .await?;
    state.sync_index(&record);

    Ok(Json(record))
}

/// Handler for PUT /v1/tasks
///
/// Replaces several tasks at once. Entries with unknown ids are skipped; the
/// response lists the tasks that were updated.
pub async fn bulk_update_tasks(
    State(state): State<AppState>,
    Json(req): Json<BulkUpdateRequest>,
) -> Result<Json<TaskListResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(TaskError::InvalidRequest(error_msg));
    }

    let mut store = state.store.write().await;
    let updated = state
        .commit(&mut store, move |store| {
            let mut updated = Vec::with_capacity(req.tasks.len());
            for entry in req.tasks {
                match store.update(entry.id, entry.task.into()) {
                    Ok(record) => updated.push(record),
                    Err(TaskError::NotFound(_)) => {
                        warn!("Bulk update skipped unknown task {}", entry.id);
                    }
                    Err(err) => return Err(err),
                }
            }
            Ok(updated)
        })
        .await?;

    for record in &updated {
        state.sync_index(record);
    }

    Ok(Json(TaskListResponse::new(updated)))
}

/// Handler for DELETE /v1/tasks
///
/// Deletes every task and drops every pending alert.
pub async fn delete_all_tasks(State(state): State<AppState>) -> Result<Json<DeleteResponse>> {
    let mut store = state.store.write().await;
    let deleted = state
        .commit(&mut store, |store| Ok(store.clear()))
        .await?;
    state.index.clear();

    Ok(Json(DeleteResponse::new(deleted)))
}

/// Handler for GET /v1/tasks/:id
pub async fn get_task(
    State(state): State<AppState>,
    Path(id): Path<TaskId>,
) -> Result<Json<TaskRecord>> {
    let store = state.store.read().await;
    let record = store.get(id)?;

    Ok(Json(record))
}

/// Handler for PUT /v1/tasks/:id
///
/// Replaces a task. Omitting `expiry_dt` cancels any pending alert.
pub async fn update_task(
    State(state): State<AppState>,
    Path(id): Path<TaskId>,
    Json(req): Json<TaskRequest>,
) -> Result<Json<TaskRecord>> {
    if let Some(error_msg) = req.validate() {
        return Err(TaskError::InvalidRequest(error_msg));
    }

    let fields = TaskFields::from(req);
    let mut store = state.store.write().await;
    let record = state
        .commit(&mut store, move |store| store.update(id, fields))
        .await?;
    state.sync_index(&record);

    Ok(Json(record))
}

/// Handler for DELETE /v1/tasks/:id
pub async fn delete_task(
    State(state): State<AppState>,
    Path(id): Path<TaskId>,
) -> Result<Json<DeleteResponse>> {
    let mut store = state.store.write().await;
    state
        .commit(&mut store, |store| store.delete(id))
        .await?;
    state.index.remove(id);

    Ok(Json(DeleteResponse::new(1)))
}

/// Handler for GET /v1/stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse {
        tracked: state.index.len(),
        fired: state.stats.fired(),
        notify_failures: state.stats.notify_failures(),
    })
}

/// Handler for GET /v1/health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
