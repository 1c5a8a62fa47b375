//! In-memory key/value adapter.

use async_trait::async_trait;
use dashmap::DashMap;

use converter_types::{KeyValueStore, RepoError};

/// Process-local store. Used for `memory://` and by tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: DashMap<String, Vec<u8>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, RepoError> {
        Ok(self.entries.get(key).map(|v| v.value().clone()))
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> Result<(), RepoError> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }
}
