use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;

use crate::storage::errors::StorageError;
use crate::storage::types::CacheKey;

/// Single-use entries with a fixed lifetime, such as ceremony challenges
#[async_trait]
pub(crate) trait CacheStore: Send + Sync + 'static {
    /// Checks that the backend is reachable
    async fn ping(&self) -> Result<(), StorageError>;

    /// Stores `payload` under `key`, replacing any previous entry. The entry
    /// is gone once `ttl` has elapsed.
    async fn put(
        &mut self,
        key: CacheKey<'_>,
        payload: String,
        ttl: Duration,
    ) -> Result<(), StorageError>;

    /// Removes and returns a live entry. Two callers racing on the same key
    /// never both receive it.
    async fn take(&mut self, key: CacheKey<'_>) -> Result<Option<String>, StorageError>;
}

pub(crate) struct MemoryCacheStore {
    pub(super) entries: HashMap<String, MemoryEntry>,
}

pub(super) struct MemoryEntry {
    pub(super) payload: String,
    pub(super) expires_at: Instant,
}

pub(crate) struct RedisCacheStore {
    pub(super) client: redis::Client,
}
