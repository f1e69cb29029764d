//! Fixed-window request counters keyed by client identity

mod config;
mod errors;
mod memory;
mod redis;
mod types;

pub use errors::RateLimitError;
pub use memory::InMemoryRateLimitStore;
pub use types::{RateLimitDecision, RateLimitPolicy, RateLimitStore, RateLimiter};

use config::RATE_LIMITER;

/// Counts one request against `policy` for `key` using the process-wide limiter
pub async fn check_rate_limit(
    policy: &RateLimitPolicy,
    key: &str,
) -> Result<RateLimitDecision, RateLimitError> {
    RATE_LIMITER
        .check(&format!("{}:{}", policy.name, key), policy.limit, policy.window)
        .await
}

pub(crate) fn init() {
    let _ = &*RATE_LIMITER;
}
