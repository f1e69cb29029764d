use crate::ratelimit::{RateLimitDecision, RateLimitPolicy, check_rate_limit};

use super::errors::CoordinationError;

/// Counts one request for `key` under `policy`.
///
/// Returns the decision when allowed, `RateLimited` when denied. A failing
/// counter store lets the request through with a warning.
pub async fn enforce_rate_limit(
    policy: &RateLimitPolicy,
    key: &str,
) -> Result<Option<RateLimitDecision>, CoordinationError> {
    match check_rate_limit(policy, key).await {
        Ok(decision) if decision.allowed => Ok(Some(decision)),
        Ok(decision) => {
            tracing::warn!(policy = policy.name, key, "Rate limit exceeded");
            Err(CoordinationError::RateLimited(decision))
        }
        Err(e) => {
            tracing::warn!(policy = policy.name, "Rate limiter unavailable, allowing: {}", e);
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_enforce_rate_limit_denies_over_limit() {
        let policy = RateLimitPolicy {
            name: "test-enforce",
            limit: 2,
            window: Duration::from_secs(60),
        };
        let key = uuid::Uuid::new_v4().to_string();

        let first = enforce_rate_limit(&policy, &key).await.unwrap().unwrap();
        assert_eq!(first.remaining, 1);
        enforce_rate_limit(&policy, &key).await.unwrap();

        match enforce_rate_limit(&policy, &key).await {
            Err(CoordinationError::RateLimited(decision)) => {
                assert!(!decision.allowed);
                assert!(decision.retry_after > 0);
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
