use super::KeyValueStore;
use crate::error::AppError;
use parking_lot::Mutex;
use std::collections::HashMap;

/// In-process key-value store. Nothing survives the value being dropped.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let entries = entries
            .into_iter()
            .map(|(key, value)| (key.into(), value.into()))
            .collect();
        Self {
            entries: Mutex::new(entries),
        }
    }

    pub fn raw(&self, key: &str) -> Option<String> {
        self.entries.lock().get(key).cloned()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        Ok(self.raw(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), AppError> {
        self.entries.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }
}
