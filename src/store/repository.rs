//! Task Repository
//!
//! In-memory task table with store-assigned ids and a JSON snapshot format.

use std::collections::BTreeMap;
use std::io;
use std::path::Path;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::alerts::{ScheduledTask, TaskId};
use crate::error::{Result, TaskError};
use crate::scheduling::PendingTaskSource;
use crate::store::{TaskFields, TaskRecord};

// == Task Store ==
/// Task table keyed by id, iterated in id order.
#[derive(Debug, Clone)]
pub struct TaskStore {
    tasks: BTreeMap<TaskId, TaskRecord>,
    /// Id handed to the next inserted task
    next_id: TaskId,
}

impl Default for TaskStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskStore {
    // == Constructor ==
    /// Creates an empty store. Ids start at 1.
    pub fn new() -> Self {
        Self {
            tasks: BTreeMap::new(),
            next_id: 1,
        }
    }

    /// Creates a store holding `records`; new ids continue after the highest.
    pub fn from_records(records: Vec<TaskRecord>) -> Self {
        let tasks: BTreeMap<TaskId, TaskRecord> = records
            .into_iter()
            .map(|record| (record.id, record))
            .collect();
        let next_id = tasks.keys().next_back().map_or(1, |max| max + 1);
        Self { tasks, next_id }
    }

    // == Load ==
    /// Reads a snapshot written by [`write_snapshot`]. A missing file yields
    /// an empty store.
    ///
    /// # Errors
    /// Fails if the file exists but cannot be read or parsed.
    pub async fn load(path: &Path) -> Result<Self> {
        let json = match tokio::fs::read_to_string(path).await {
            Ok(json) => json,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                info!("No task snapshot at {}, starting empty", path.display());
                return Ok(Self::new());
            }
            Err(err) => return Err(err.into()),
        };
        let records: Vec<TaskRecord> = serde_json::from_str(&json)?;
        info!("Loaded {} tasks from {}", records.len(), path.display());
        Ok(Self::from_records(records))
    }

    // == Insert ==
    /// Stores a new task under a fresh id.
    pub fn insert(&mut self, fields: TaskFields) -> TaskRecord {
        let id = self.next_id;
        self.next_id += 1;

        let record = TaskRecord::new(id, fields);
        self.tasks.insert(id, record.clone());
        record
    }

    // == Get ==
    /// Returns the task with `id`.
    pub fn get(&self, id: TaskId) -> Result<TaskRecord> {
        self.tasks
            .get(&id)
            .cloned()
            .ok_or_else(|| TaskError::NotFound(id.to_string()))
    }

    // == List ==
    /// Returns tasks in id order, skipping `offset` and taking at most `limit`.
    pub fn list(&self, offset: usize, limit: Option<usize>) -> Vec<TaskRecord> {
        self.tasks
            .values()
            .skip(offset)
            .take(limit.unwrap_or(usize::MAX))
            .cloned()
            .collect()
    }

    // == Update ==
    /// Replaces the contents of an existing task.
    pub fn update(&mut self, id: TaskId, fields: TaskFields) -> Result<TaskRecord> {
        let record = self
            .tasks
            .get_mut(&id)
            .ok_or_else(|| TaskError::NotFound(id.to_string()))?;
        *record = TaskRecord::new(id, fields);
        Ok(record.clone())
    }

    // == Delete ==
    /// Removes a task, returning it.
    pub fn delete(&mut self, id: TaskId) -> Result<TaskRecord> {
        self.tasks
            .remove(&id)
            .ok_or_else(|| TaskError::NotFound(id.to_string()))
    }

    // == Clear ==
    /// Removes every task. Ids are not reused afterwards.
    ///
    /// Returns the number of tasks removed.
    pub fn clear(&mut self) -> usize {
        let count = self.tasks.len();
        self.tasks.clear();
        count
    }

    /// Returns a copy of every record, in id order.
    pub fn snapshot(&self) -> Vec<TaskRecord> {
        self.tasks.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

impl PendingTaskSource for TaskStore {
    fn pending_tasks(&self, now: DateTime<Utc>) -> Vec<ScheduledTask> {
        self.tasks
            .values()
            .filter_map(TaskRecord::schedule)
            .filter(|task| task.is_pending(now))
            .collect()
    }
}

// == Write Snapshot ==
/// Writes `records` to `path` as a JSON array.
///
/// The data goes to a sibling temp file first and is renamed into place, so a
/// crash mid-write leaves the previous snapshot intact.
pub async fn write_snapshot(path: &Path, records: &[TaskRecord]) -> Result<()> {
    let json = serde_json::to_vec_pretty(records)?;

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");

    tokio::fs::write(&tmp, &json).await?;
    tokio::fs::rename(&tmp, path).await?;

    debug!("Saved {} tasks to {}", records.len(), path.display());
    Ok(())
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_insert_assigns_sequential_ids() {
        let mut store = TaskStore::new();

        let first = store.insert(TaskFields::new("a", None));
        let second = store.insert(TaskFields::new("b", None));

        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_get_missing() {
        let store = TaskStore::new();
        assert!(matches!(store.get(9), Err(TaskError::NotFound(_))));
    }

    #[test]
    fn test_list_offset_and_limit() {
        let mut store = TaskStore::new();
        for title in ["a", "b", "c", "d"] {
            store.insert(TaskFields::new(title, None));
        }

        let page: Vec<_> = store.list(1, Some(2)).into_iter().map(|t| t.title).collect();
        assert_eq!(page, vec!["b", "c"]);
        assert_eq!(store.list(0, None).len(), 4);
        assert!(store.list(10, None).is_empty());
    }

    #[test]
    fn test_update_replaces_fields() {
        let mut store = TaskStore::new();
        let record = store.insert(TaskFields::new("a", Some(now())));

        let updated = store.update(record.id, TaskFields::new("b", None)).unwrap();

        assert_eq!(updated.title, "b");
        assert!(updated.expiry_dt.is_none());
        assert_eq!(store.get(record.id).unwrap(), updated);
    }

    #[test]
    fn test_update_missing() {
        let mut store = TaskStore::new();
        let result = store.update(5, TaskFields::new("x", None));
        assert!(matches!(result, Err(TaskError::NotFound(_))));
    }

    #[test]
    fn test_delete_and_clear() {
        let mut store = TaskStore::new();
        let a = store.insert(TaskFields::new("a", None));
        store.insert(TaskFields::new("b", None));
        store.insert(TaskFields::new("c", None));

        assert_eq!(store.delete(a.id).unwrap().title, "a");
        assert!(store.delete(a.id).is_err());
        assert_eq!(store.clear(), 2);
        assert!(store.is_empty());

        // Ids keep counting after a clear
        assert_eq!(store.insert(TaskFields::new("d", None)).id, 4);
    }

    #[test]
    fn test_pending_tasks_filters_expiry() {
        let mut store = TaskStore::new();
        store.insert(TaskFields::new("no expiry", None));
        store.insert(TaskFields::new("past", Some(now() - Duration::minutes(1))));
        let future = store.insert(TaskFields::new("future", Some(now() + Duration::minutes(1))));

        let pending = store.pending_tasks(now());

        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, future.id);
    }

    #[test]
    fn test_from_records_continues_ids() {
        let store = TaskStore::from_records(vec![
            TaskRecord::new(7, TaskFields::new("x", None)),
            TaskRecord::new(3, TaskFields::new("y", None)),
        ]);
        let mut store = store;
        assert_eq!(store.insert(TaskFields::new("z", None)).id, 8);
    }

    #[test]
    fn test_snapshot_roundtrip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tasks.json");

        let mut store = TaskStore::new();
        store.insert(TaskFields::new("a", Some(now())));
        store.insert(TaskFields {
            title: "b".to_string(),
            description: Some("details".to_string()),
            expiry_dt: None,
        });

        tokio_test::block_on(write_snapshot(&path, &store.snapshot())).unwrap();

        let loaded = tokio_test::block_on(TaskStore::load(&path)).unwrap();
        assert_eq!(loaded.snapshot(), store.snapshot());
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = tokio_test::block_on(TaskStore::load(&dir.path().join("absent.json"))).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_load_corrupt_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tasks.json");
        std::fs::write(&path, "not json").unwrap();

        assert!(matches!(
            tokio_test::block_on(TaskStore::load(&path)),
            Err(TaskError::Storage(_))
        ));
    }

    #[test]
    fn test_write_snapshot_into_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("tasks.json");

        let result = tokio_test::block_on(write_snapshot(&path, &[]));
        assert!(matches!(result, Err(TaskError::Storage(_))));
        assert!(!path.exists());
    }
}
