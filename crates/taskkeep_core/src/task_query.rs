//! Read-side ordering of tasks for display. Nothing here writes.
//!
//! Callers re-run these queries whenever a view becomes active; the store
//! does not push change notifications.

use crate::error::AppError;
use crate::model::timestamp::{local_offset, parse_completed_at};
use crate::model::{CompletedTask, Task, completed_projection, numeric_id};
use crate::storage::KeyValueStore;
use crate::task_store::TaskStore;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::str::FromStr;

/// Where the completed list is read from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletedSource {
    /// The persisted `completedTasks` projection.
    #[default]
    Projection,
    /// Computed from the main collection on every read.
    Derived,
}

impl FromStr for CompletedSource {
    type Err = AppError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "projection" | "persisted" => Ok(Self::Projection),
            "derived" => Ok(Self::Derived),
            other => Err(AppError::invalid_input(format!(
                "unknown completed source '{other}'"
            ))),
        }
    }
}

pub struct TaskQuery<'a, S> {
    store: &'a TaskStore<S>,
    completed_source: CompletedSource,
}

impl<'a, S: KeyValueStore> TaskQuery<'a, S> {
    pub fn new(store: &'a TaskStore<S>) -> Self {
        Self {
            store,
            completed_source: CompletedSource::default(),
        }
    }

    pub fn with_completed_source(mut self, completed_source: CompletedSource) -> Self {
        self.completed_source = completed_source;
        self
    }

    /// Every task, newest first.
    pub fn active_by_recency(&self) -> Vec<Task> {
        sort_by_recency(self.store.list())
    }

    /// Completed tasks, most recently completed first.
    pub fn completed_by_completion_recency(&self) -> Vec<CompletedTask> {
        let completed = match self.completed_source {
            CompletedSource::Projection => self.store.completed(),
            CompletedSource::Derived => completed_projection(&self.store.list()),
        };
        sort_by_completion_recency(completed)
    }
}

/// Orders by numeric id, descending. Non-numeric ids go last; ties keep
/// their storage order.
pub fn sort_by_recency(mut tasks: Vec<Task>) -> Vec<Task> {
    tasks.sort_by_cached_key(|task| Reverse(numeric_id(&task.id)));
    tasks
}

/// Orders by `completed_at`, descending. Unparsable timestamps go last;
/// ties keep their storage order.
pub fn sort_by_completion_recency(mut completed: Vec<CompletedTask>) -> Vec<CompletedTask> {
    let offset = local_offset();
    completed.sort_by_cached_key(|entry| Reverse(parse_completed_at(&entry.completed_at, offset)));
    completed
}
