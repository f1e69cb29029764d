use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;

use crate::storage::errors::StorageError;
use crate::storage::types::CacheKey;

use super::types::{CacheStore, MemoryCacheStore, MemoryEntry};

impl MemoryCacheStore {
    pub(crate) fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn ping(&self) -> Result<(), StorageError> {
        Ok(())
    }

    async fn put(
        &mut self,
        key: CacheKey<'_>,
        payload: String,
        ttl: Duration,
    ) -> Result<(), StorageError> {
        let now = Instant::now();
        // Keeps the map bounded by the number of live entries
        self.entries.retain(|_, entry| entry.expires_at > now);
        self.entries.insert(
            key.render(),
            MemoryEntry {
                payload,
                expires_at: now + ttl,
            },
        );
        Ok(())
    }

    async fn take(&mut self, key: CacheKey<'_>) -> Result<Option<String>, StorageError> {
        Ok(self
            .entries
            .remove(&key.render())
            .filter(|entry| entry.expires_at > Instant::now())
            .map(|entry| entry.payload))
    }
}
