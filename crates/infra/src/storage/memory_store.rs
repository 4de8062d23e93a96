//! In-memory key/value storage, for ephemeral sessions and tests.

use std::collections::HashMap;

use liftlog_core::KeyValueStorage;
use liftlog_domain::Result;
use parking_lot::RwLock;

/// Key/value storage that lives as long as the process.
#[derive(Debug, Default)]
pub struct MemoryKeyValueStorage {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryKeyValueStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.values.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.read().is_empty()
    }
}

impl KeyValueStorage for MemoryKeyValueStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.values.write().insert(key.to_string(), value.to_string());
        Ok(())
    }
}
