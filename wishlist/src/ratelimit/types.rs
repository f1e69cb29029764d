use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;

use super::errors::RateLimitError;

/// Counter backend shared by every policy
#[async_trait]
pub trait RateLimitStore: Send + Sync + 'static {
    /// Counts one hit for `key` and returns `(count, reset_at_ms)` for the
    /// window the hit landed in. A missing or elapsed window starts over at 1.
    async fn increment(
        &self,
        key: &str,
        window_ms: u64,
        now_ms: u64,
    ) -> Result<(u64, u64), RateLimitError>;
}

/// Outcome of a rate limit check
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub limit: u64,
    pub remaining: u64,
    /// Window end, milliseconds since the Unix epoch
    pub reset_at: u64,
    /// Seconds until a denied caller may retry; zero when allowed
    pub retry_after: u64,
}

impl RateLimitDecision {
    /// Window end in whole seconds since the Unix epoch
    pub fn reset_at_secs(&self) -> u64 {
        self.reset_at.div_ceil(1000)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RateLimitPolicy {
    pub name: &'static str,
    pub limit: u64,
    pub window: Duration,
}

impl RateLimitPolicy {
    /// Reserve and unreserve, keyed by `action:ip`
    pub const RESERVATION: Self = Self {
        name: "reservation",
        limit: 10,
        window: Duration::from_secs(60),
    };

    /// WebAuthn ceremonies, keyed by ip
    pub const AUTH: Self = Self {
        name: "auth",
        limit: 10,
        window: Duration::from_secs(60),
    };

    /// Image uploads, keyed by session
    pub const UPLOAD: Self = Self {
        name: "upload",
        limit: 20,
        window: Duration::from_secs(60),
    };

    /// Admin mutations, keyed by session
    pub const ADMIN: Self = Self {
        name: "admin",
        limit: 120,
        window: Duration::from_secs(60),
    };
}

pub struct RateLimiter {
    store: Box<dyn RateLimitStore>,
}

impl RateLimiter {
    pub fn new(store: Box<dyn RateLimitStore>) -> Self {
        Self { store }
    }

    pub async fn check(
        &self,
        key: &str,
        limit: u64,
        window: Duration,
    ) -> Result<RateLimitDecision, RateLimitError> {
        let now_ms = Utc::now().timestamp_millis().max(0) as u64;
        self.check_at(key, limit, window, now_ms).await
    }

    /// Same as [`RateLimiter::check`] with an explicit clock
    pub async fn check_at(
        &self,
        key: &str,
        limit: u64,
        window: Duration,
        now_ms: u64,
    ) -> Result<RateLimitDecision, RateLimitError> {
        let window_ms = (window.as_millis() as u64).max(1);
        let (count, reset_at) = self.store.increment(key, window_ms, now_ms).await?;

        let allowed = count <= limit;
        let retry_after = if allowed {
            0
        } else {
            reset_at.saturating_sub(now_ms).div_ceil(1000).max(1)
        };

        if !allowed {
            tracing::warn!(key = %key, count, limit, "Rate limit exceeded");
        }

        Ok(RateLimitDecision {
            allowed,
            limit,
            remaining: limit.saturating_sub(count),
            reset_at,
            retry_after,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ratelimit::InMemoryRateLimitStore;
    use proptest::prelude::*;

    fn limiter() -> RateLimiter {
        RateLimiter::new(Box::new(InMemoryRateLimitStore::new()))
    }

    #[tokio::test]
    async fn test_three_per_second_window() {
        let limiter = limiter();
        let window = Duration::from_millis(1000);
        let start = 1_000_000;

        for i in 0..3 {
            let decision = limiter.check_at("ip", 3, window, start + i * 10).await.unwrap();
            assert!(decision.allowed);
            assert_eq!(decision.remaining, 2 - i);
        }

        let denied = limiter.check_at("ip", 3, window, start + 50).await.unwrap();
        assert!(!denied.allowed);
        assert_eq!(denied.remaining, 0);
        assert_eq!(denied.reset_at, start + 1000);
        assert_eq!(denied.retry_after, 1);

        let after = limiter.check_at("ip", 3, window, start + 1000).await.unwrap();
        assert!(after.allowed);
        assert_eq!(after.remaining, 2);
    }

    #[tokio::test]
    async fn test_keys_are_independent() {
        let limiter = limiter();
        let window = Duration::from_secs(60);

        assert!(limiter.check_at("a", 1, window, 0).await.unwrap().allowed);
        assert!(!limiter.check_at("a", 1, window, 1).await.unwrap().allowed);
        assert!(limiter.check_at("b", 1, window, 2).await.unwrap().allowed);
    }

    #[test]
    fn test_reset_at_secs_rounds_up() {
        let decision = RateLimitDecision {
            allowed: true,
            limit: 1,
            remaining: 0,
            reset_at: 1_500,
            retry_after: 0,
        };
        assert_eq!(decision.reset_at_secs(), 2);
    }

    proptest! {
        #[test]
        fn prop_allows_exactly_limit_per_window(limit in 1u64..20, extra in 1u64..10) {
            let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
            rt.block_on(async {
                let limiter = limiter();
                let window = Duration::from_secs(10);
                let mut allowed = 0;
                for i in 0..(limit + extra) {
                    if limiter.check_at("k", limit, window, 5_000 + i).await.unwrap().allowed {
                        allowed += 1;
                    }
                }
                prop_assert_eq!(allowed, limit);

                // A fresh window admits the caller again
                let next = limiter.check_at("k", limit, window, 15_000).await.unwrap();
                prop_assert!(next.allowed);
                Ok::<(), TestCaseError>(())
            })?;
        }

        #[test]
        fn prop_retry_after_within_window(window_ms in 1u64..120_000, offset in 0u64..120_000) {
            let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
            rt.block_on(async {
                let limiter = limiter();
                let window = Duration::from_millis(window_ms);
                let start = 1_000_000;
                limiter.check_at("k", 1, window, start).await.unwrap();
                let now = start + offset % window_ms;
                let denied = limiter.check_at("k", 1, window, now).await.unwrap();
                prop_assert!(!denied.allowed);
                prop_assert!(denied.retry_after >= 1);
                prop_assert!(denied.retry_after <= window_ms.div_ceil(1000).max(1));
                Ok::<(), TestCaseError>(())
            })?;
        }
    }
}
