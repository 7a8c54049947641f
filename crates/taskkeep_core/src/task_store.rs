//! Canonical task collection and its completed-tasks projection.
//!
//! Every mutation is a full read-modify-write of the `tasks` key. Toggling
//! completion additionally rewrites `completedTasks` from scratch in a
//! second, independent write; a fault between the two leaves the
//! projection stale until the next toggle or [`TaskStore::rebuild_completed`].
//!
//! In [`ErrorMode::Silent`] (the default) storage faults are logged and the
//! operation reports that nothing happened, the same as for an unknown id.
//! [`ErrorMode::Strict`] returns them, along with `not_found` for unknown ids.
//! Validation errors are returned in both modes before any I/O.

use crate::config::Config;
use crate::error::AppError;
use crate::model::timestamp::{Clock, SystemClock, epoch_millis, format_completed_at};
use crate::model::{CompletedTask, Task, TaskDraft, completed_projection, next_task_id};
use crate::storage::{COMPLETED_TASKS_KEY, FileStore, KeyValueStore, TASKS_KEY, codec};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ErrorMode {
    #[default]
    Silent,
    Strict,
}

pub struct TaskStore<S> {
    storage: S,
    clock: Box<dyn Clock>,
    mode: ErrorMode,
}

impl TaskStore<FileStore> {
    /// Opens the file-backed store described by `config`.
    pub fn open(config: &Config) -> Result<Self, AppError> {
        let dir = crate::storage::data_dir(config.data_dir.as_deref())?;
        Ok(Self::new(FileStore::new(dir)).with_mode(config.error_mode()))
    }
}

impl<S: KeyValueStore> TaskStore<S> {
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            clock: Box::new(SystemClock),
            mode: ErrorMode::default(),
        }
    }

    pub fn with_clock<C: Clock + 'static>(mut self, clock: C) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn with_mode(mut self, mode: ErrorMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// All tasks in storage order. Unreadable storage reads as no tasks.
    pub fn list(&self) -> Vec<Task> {
        self.try_list().unwrap_or_else(|err| {
            tracing::warn!(key = TASKS_KEY, error = %err, "treating unreadable tasks as empty");
            Vec::new()
        })
    }

    pub fn try_list(&self) -> Result<Vec<Task>, AppError> {
        let raw = self.storage.get(TASKS_KEY)?;
        codec::decode_tasks(raw.as_deref())
    }

    pub fn get(&self, id: &str) -> Option<Task> {
        let id = id.trim();
        self.list().into_iter().find(|task| task.id == id)
    }

    /// The persisted completed-tasks projection, as last written.
    pub fn completed(&self) -> Vec<CompletedTask> {
        self.try_completed().unwrap_or_else(|err| {
            tracing::warn!(
                key = COMPLETED_TASKS_KEY,
                error = %err,
                "treating unreadable completed tasks as empty"
            );
            Vec::new()
        })
    }

    pub fn try_completed(&self) -> Result<Vec<CompletedTask>, AppError> {
        let raw = self.storage.get(COMPLETED_TASKS_KEY)?;
        codec::decode_completed_tasks(raw.as_deref())
    }

    pub fn create(&self, title: &str, description: &str) -> Result<Task, AppError> {
        let draft = TaskDraft::new(title, description)?;
        let now_millis = epoch_millis(self.clock.now());
        let build = |existing: &[Task]| Task {
            id: next_task_id(existing, now_millis),
            title: draft.title().to_string(),
            description: draft.description().to_string(),
            completed: false,
            completed_at: None,
        };

        let result = self.try_list().and_then(|mut tasks| {
            let task = build(&tasks);
            tasks.push(task.clone());
            self.save_tasks(&tasks)?;
            Ok(task)
        });

        match result {
            Ok(task) => {
                tracing::debug!(task_id = %task.id, "created task");
                Ok(task)
            }
            Err(err) if self.mode == ErrorMode::Strict => Err(err),
            Err(err) => {
                let unsaved = build(&[]);
                tracing::error!(
                    operation = "create",
                    task_id = %unsaved.id,
                    error = %err,
                    "task was not persisted"
                );
                Ok(unsaved)
            }
        }
    }

    /// Replaces title and description; completion state is left alone.
    pub fn update(
        &self,
        id: &str,
        title: &str,
        description: &str,
    ) -> Result<Option<Task>, AppError> {
        let draft = TaskDraft::new(title, description)?;
        let id = id.trim();

        let result = self.try_list().and_then(|mut tasks| {
            let updated = tasks.iter_mut().find(|task| task.id == id).map(|task| {
                task.title = draft.title().to_string();
                task.description = draft.description().to_string();
                task.clone()
            });
            self.require_match(id, updated.as_ref())?;
            self.save_tasks(&tasks)?;
            Ok(updated)
        });

        self.settle("update", id, result)
    }

    /// Removes the task from the main collection only. A completed task
    /// stays in the persisted projection until the projection is rebuilt.
    pub fn delete(&self, id: &str) -> Result<Option<Task>, AppError> {
        let id = id.trim();

        let result = self.try_list().and_then(|mut tasks| {
            let removed = tasks
                .iter()
                .position(|task| task.id == id)
                .map(|index| tasks.remove(index));
            self.require_match(id, removed.as_ref())?;
            self.save_tasks(&tasks)?;
            Ok(removed)
        });

        self.settle("delete", id, result)
    }

    /// Flips `completed`. Completing stamps `completed_at`; un-completing
    /// keeps the previous stamp.
    pub fn toggle_completion(&self, id: &str) -> Result<Option<Task>, AppError> {
        let id = id.trim();
        let now = self.clock.now();

        let result = self.try_list().and_then(|mut tasks| {
            let mut toggled = None;
            if let Some(task) = tasks.iter_mut().find(|task| task.id == id) {
                task.completed = !task.completed;
                if task.completed {
                    task.completed_at = Some(format_completed_at(now)?);
                }
                toggled = Some(task.clone());
            }
            self.require_match(id, toggled.as_ref())?;

            self.save_tasks(&tasks)?;
            self.save_completed(&completed_projection(&tasks))
                .inspect_err(|_| {
                    tracing::warn!(task_id = %id, "tasks saved but completed projection is stale");
                })?;
            Ok(toggled)
        });

        self.settle("toggle_completion", id, result)
    }

    /// Rewrites the completed-tasks projection from the main collection.
    pub fn rebuild_completed(&self) -> Result<Vec<CompletedTask>, AppError> {
        let result = self.try_list().and_then(|tasks| {
            let projection = completed_projection(&tasks);
            self.save_completed(&projection)?;
            Ok(projection)
        });

        match result {
            Ok(projection) => Ok(projection),
            Err(err) if self.mode == ErrorMode::Strict => Err(err),
            Err(err) => {
                tracing::error!(operation = "rebuild_completed", error = %err, "storage fault");
                Ok(Vec::new())
            }
        }
    }

    fn require_match(&self, id: &str, found: Option<&Task>) -> Result<(), AppError> {
        if found.is_none() && self.mode == ErrorMode::Strict {
            return Err(AppError::not_found(format!("task {id} not found")));
        }
        Ok(())
    }

    fn settle(
        &self,
        operation: &'static str,
        id: &str,
        result: Result<Option<Task>, AppError>,
    ) -> Result<Option<Task>, AppError> {
        match result {
            Ok(Some(task)) => {
                tracing::debug!(operation, task_id = %task.id, "task changed");
                Ok(Some(task))
            }
            Ok(None) => {
                tracing::debug!(operation, task_id = %id, "no task matched");
                Ok(None)
            }
            Err(err) if self.mode == ErrorMode::Strict => Err(err),
            Err(err) => {
                tracing::error!(operation, task_id = %id, error = %err, "storage fault");
                Ok(None)
            }
        }
    }

    fn save_tasks(&self, tasks: &[Task]) -> Result<(), AppError> {
        let encoded = codec::encode_tasks(tasks)?;
        self.storage.set(TASKS_KEY, &encoded)
    }

    fn save_completed(&self, completed: &[CompletedTask]) -> Result<(), AppError> {
        let encoded = codec::encode_completed_tasks(completed)?;
        self.storage.set(COMPLETED_TASKS_KEY, &encoded)
    }
}
