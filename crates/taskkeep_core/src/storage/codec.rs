//! Typed decode/encode of the persisted collections.
//!
//! Every read of `tasks` or `completedTasks` goes through here; content that
//! does not match the expected shape is reported as `invalid_data` and the
//! caller decides whether to fall back to an empty collection.

use crate::error::AppError;
use crate::model::{CompletedTask, Task};
use serde::Serialize;
use serde::de::DeserializeOwned;

pub fn decode_tasks(raw: Option<&str>) -> Result<Vec<Task>, AppError> {
    decode_collection(super::TASKS_KEY, raw)
}

pub fn decode_completed_tasks(raw: Option<&str>) -> Result<Vec<CompletedTask>, AppError> {
    decode_collection(super::COMPLETED_TASKS_KEY, raw)
}

pub fn encode_tasks(tasks: &[Task]) -> Result<String, AppError> {
    encode_collection(super::TASKS_KEY, tasks)
}

pub fn encode_completed_tasks(tasks: &[CompletedTask]) -> Result<String, AppError> {
    encode_collection(super::COMPLETED_TASKS_KEY, tasks)
}

fn decode_collection<T: DeserializeOwned>(key: &str, raw: Option<&str>) -> Result<Vec<T>, AppError> {
    // An empty value is what a fresh install looks like, same as a missing key.
    let content = match raw.map(str::trim) {
        Some(content) if !content.is_empty() => content,
        _ => return Ok(Vec::new()),
    };

    serde_json::from_str(content)
        .map_err(|err| AppError::invalid_data(format!("invalid JSON under '{key}': {err}")))
}

fn encode_collection<T: Serialize>(key: &str, items: &[T]) -> Result<String, AppError> {
    serde_json::to_string(items)
        .map_err(|err| AppError::invalid_data(format!("cannot encode '{key}': {err}")))
}
