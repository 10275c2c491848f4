//! In-memory [`KvBackend`] for tests and browser targets.
//!
//! Clones share the same map, so a second [`ProfileStore`](super::ProfileStore)
//! opened over a clone sees what the first one wrote, the same way a page
//! reload sees what was left in local storage.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use super::KvBackend;

#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    values: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `value` under `key` directly, bypassing any store.
    pub fn put(&self, key: &str, value: &str) {
        if let Ok(mut values) = self.values.write() {
            values.insert(key.to_string(), value.to_string());
        }
    }

    /// Current raw value under `key`.
    pub fn snapshot(&self, key: &str) -> Option<String> {
        self.values.read().ok()?.get(key).cloned()
    }
}

#[async_trait]
impl KvBackend for MemoryBackend {
    async fn read(&self, key: &str) -> Result<Option<String>> {
        let values = self
            .values
            .read()
            .map_err(|_| anyhow!("memory backend lock poisoned"))?;
        Ok(values.get(key).cloned())
    }

    async fn write(&self, key: &str, value: &str) -> Result<()> {
        let mut values = self
            .values
            .write()
            .map_err(|_| anyhow!("memory backend lock poisoned"))?;
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
