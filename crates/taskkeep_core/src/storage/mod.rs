//! String-keyed persistence used by the task store.
//!
//! Adapters only move opaque strings; `codec` owns the JSON shape of what
//! is stored under each key.

pub mod codec;
mod file_store;
mod memory;

use crate::error::AppError;

pub use file_store::{FileStore, data_dir};
pub use memory::MemoryStore;

pub const TASKS_KEY: &str = "tasks";
pub const COMPLETED_TASKS_KEY: &str = "completedTasks";

/// Get/set persistence with no atomicity across keys.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, AppError>;

    fn set(&self, key: &str, value: &str) -> Result<(), AppError>;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for &T {
    fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), AppError> {
        (**self).set(key, value)
    }
}
