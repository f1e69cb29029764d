use std::time::Duration;

use async_trait::async_trait;
use redis::AsyncCommands;

use crate::storage::errors::StorageError;
use crate::storage::types::CacheKey;

use super::types::{CacheStore, RedisCacheStore};

/// `SET EX` needs at least one second
fn expiry_secs(ttl: Duration) -> u64 {
    ttl.as_secs().max(1)
}

#[async_trait]
impl CacheStore for RedisCacheStore {
    async fn ping(&self) -> Result<(), StorageError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }

    async fn put(
        &mut self,
        key: CacheKey<'_>,
        payload: String,
        ttl: Duration,
    ) -> Result<(), StorageError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let _: () = conn
            .set_ex(key.render(), payload, expiry_secs(ttl))
            .await?;
        Ok(())
    }

    async fn take(&mut self, key: CacheKey<'_>) -> Result<Option<String>, StorageError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        // GETDEL reads and deletes in one step, so a challenge is consumed once
        Ok(conn.get_del(key.render()).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expiry_secs_has_floor_of_one() {
        assert_eq!(expiry_secs(Duration::ZERO), 1);
        assert_eq!(expiry_secs(Duration::from_millis(1500)), 1);
        assert_eq!(expiry_secs(Duration::from_secs(300)), 300);
    }
}
