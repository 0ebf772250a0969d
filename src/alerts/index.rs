//! Expiry Index Module
//!
//! Thread-safe index of tasks waiting for an expiry alert. Two views are kept
//! in step under one mutex: an ordered set of (expiry, id) for earliest-due
//! lookup and a map from id to the recorded (title, expiry).

use std::collections::{BTreeSet, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};

use crate::alerts::{ScheduledTask, TaskId};

// == Tracked Entry ==
/// Authoritative data recorded for a tracked id.
#[derive(Debug, Clone)]
struct TrackedEntry {
    title: String,
    expiry: DateTime<Utc>,
}

// == Index State ==
/// Both views of the index. Only ever touched while the mutex is held.
#[derive(Debug, Default)]
struct IndexState {
    /// Ordering view, id breaks ties between equal expiries
    schedule: BTreeSet<(DateTime<Utc>, TaskId)>,
    /// Lookup view
    tasks: HashMap<TaskId, TrackedEntry>,
}

impl IndexState {
    fn insert(&mut self, id: TaskId, title: String, expiry: DateTime<Utc>) {
        // The stale key comes from our own record, never from the caller.
        if let Some(previous) = self.tasks.insert(id, TrackedEntry { title, expiry }) {
            self.schedule.remove(&(previous.expiry, id));
        }
        self.schedule.insert((expiry, id));
    }

    fn remove(&mut self, id: TaskId) -> bool {
        match self.tasks.remove(&id) {
            Some(entry) => {
                self.schedule.remove(&(entry.expiry, id));
                true
            }
            None => false,
        }
    }
}

// == Expiry Index ==
/// Index of expiry-bearing tasks ordered by (expiry, id).
///
/// Every operation takes the same exclusive lock for its full duration and
/// never acquires it twice, so calls from request handlers and the scheduler
/// thread serialize cleanly. Add, remove and peek are O(log n); clear is O(n).
#[derive(Debug, Default)]
pub struct ExpiryIndex {
    state: Mutex<IndexState>,
}

impl ExpiryIndex {
    // == Constructor ==
    /// Creates an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, IndexState> {
        // IndexState is consistent between statements that can panic, so a
        // poisoned guard still holds valid views.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // == Add Or Replace ==
    /// Tracks a task, replacing any previous entry for the same id.
    ///
    /// Tasks without an expiry are ignored. A caller that drops the expiry of
    /// an already tracked task must call [`ExpiryIndex::remove`] instead.
    pub fn add_or_replace(
        &self,
        id: TaskId,
        title: impl Into<String>,
        expiry: Option<DateTime<Utc>>,
    ) {
        let Some(expiry) = expiry else {
            return;
        };
        let title = title.into();
        self.lock().insert(id, title, expiry);
    }

    // == Peek Earliest ==
    /// Returns the task with the smallest (expiry, id) without removing it.
    pub fn peek_earliest(&self) -> Option<ScheduledTask> {
        let state = self.lock();
        let &(expiry, id) = state.schedule.first()?;
        let entry = state.tasks.get(&id)?;
        Some(ScheduledTask::new(id, entry.title.clone(), expiry))
    }

    // == Remove ==
    /// Stops tracking `id`. Unknown ids are a no-op.
    ///
    /// Returns whether an entry was removed.
    pub fn remove(&self, id: TaskId) -> bool {
        self.lock().remove(id)
    }

    // == Mark Done ==
    /// Drops a task after its alert has fired.
    pub fn mark_done(&self, id: TaskId) -> bool {
        self.remove(id)
    }

    // == Clear ==
    /// Drops every tracked task.
    pub fn clear(&self) {
        let mut state = self.lock();
        state.schedule.clear();
        state.tasks.clear();
    }

    // == Load ==
    /// Adds every task from `tasks`, in any order.
    ///
    /// Returns the number of tasks read from the iterator.
    pub fn load<I>(&self, tasks: I) -> usize
    where
        I: IntoIterator<Item = ScheduledTask>,
    {
        let mut state = self.lock();
        let mut count = 0;
        for task in tasks {
            state.insert(task.id, task.title, task.expiry);
            count += 1;
        }
        count
    }

    // == Get ==
    /// Returns the recorded entry for `id`, if tracked.
    pub fn get(&self, id: TaskId) -> Option<ScheduledTask> {
        let state = self.lock();
        state
            .tasks
            .get(&id)
            .map(|entry| ScheduledTask::new(id, entry.title.clone(), entry.expiry))
    }

    /// Returns true if `id` is tracked.
    pub fn contains(&self, id: TaskId) -> bool {
        self.lock().tasks.contains_key(&id)
    }

    // == Length ==
    /// Returns the number of tracked tasks.
    pub fn len(&self) -> usize {
        self.lock().tasks.len()
    }

    /// Returns true if nothing is tracked.
    pub fn is_empty(&self) -> bool {
        self.lock().tasks.is_empty()
    }

    /// Number of entries in the ordering view.
    #[cfg(test)]
    pub(crate) fn schedule_len(&self) -> usize {
        self.lock().schedule.len()
    }

    /// Checks that both views describe exactly the same task set.
    #[cfg(test)]
    pub(crate) fn is_consistent(&self) -> bool {
        let state = self.lock();
        state.schedule.len() == state.tasks.len()
            && state.schedule.iter().all(|(expiry, id)| {
                state
                    .tasks
                    .get(id)
                    .is_some_and(|entry| entry.expiry == *expiry)
            })
    }
}
