use crate::error::AppError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
}

/// Summary of a completed task as stored in the completed-tasks projection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletedTask {
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub completed_at: String,
}

impl From<&Task> for CompletedTask {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id.clone(),
            title: task.title.clone(),
            description: task.description.clone(),
            completed_at: task.completed_at.clone().unwrap_or_default(),
        }
    }
}

/// Projection of the completed subset of `tasks`, in storage order.
pub fn completed_projection(tasks: &[Task]) -> Vec<CompletedTask> {
    tasks
        .iter()
        .filter(|task| task.completed)
        .map(CompletedTask::from)
        .collect()
}

/// Title and description that have passed write-boundary validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDraft {
    title: String,
    description: String,
}

impl TaskDraft {
    pub fn new(title: &str, description: &str) -> Result<Self, AppError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(AppError::invalid_input("title is required"));
        }

        let description = description.trim();
        if description.is_empty() {
            return Err(AppError::invalid_input("description is required"));
        }

        Ok(Self {
            title: title.to_string(),
            description: description.to_string(),
        })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}

/// Numeric value of a task id, if it is a plain decimal number.
pub fn numeric_id(id: &str) -> Option<u128> {
    id.trim().parse().ok()
}

/// Picks the id for a new task from the creation time in epoch milliseconds.
///
/// Ids stay strictly increasing within `existing` even when several tasks
/// share a millisecond or the clock moved backwards. A newest id that
/// cannot be bumped falls back to the clock.
pub fn next_task_id(existing: &[Task], now_millis: u128) -> String {
    let newest = existing.iter().filter_map(|task| numeric_id(&task.id)).max();
    let id = match newest {
        Some(newest) if newest >= now_millis => newest.checked_add(1).unwrap_or(now_millis),
        _ => now_millis,
    };
    id.to_string()
}
