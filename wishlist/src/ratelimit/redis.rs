use async_trait::async_trait;
use redis::AsyncCommands;

use super::errors::RateLimitError;
use super::types::RateLimitStore;

const RATE_LIMIT_PREFIX: &str = "ratelimit";

/// Counters shared by every instance through `INCR` + `PEXPIRE`
pub(super) struct RedisRateLimitStore {
    pub(super) client: redis::Client,
}

impl RedisRateLimitStore {
    fn make_key(key: &str) -> String {
        format!("{RATE_LIMIT_PREFIX}:{key}")
    }
}

#[async_trait]
impl RateLimitStore for RedisRateLimitStore {
    async fn increment(
        &self,
        key: &str,
        window_ms: u64,
        now_ms: u64,
    ) -> Result<(u64, u64), RateLimitError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let key = Self::make_key(key);

        let count: u64 = conn.incr(&key, 1).await?;
        if count == 1 {
            let _: () = conn.pexpire(&key, window_ms as i64).await?;
        }

        let mut ttl: i64 = conn.pttl(&key).await?;
        if ttl < 0 {
            // Key lost its expiry; start the window over
            let _: () = conn.pexpire(&key, window_ms as i64).await?;
            ttl = window_ms as i64;
        }

        Ok((count, now_ms + ttl as u64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_make_key() {
        assert_eq!(
            RedisRateLimitStore::make_key("reservation:reserve:1.2.3.4"),
            "ratelimit:reservation:reserve:1.2.3.4"
        );
    }
}
