use std::{env, sync::LazyLock};

use super::memory::InMemoryRateLimitStore;
use super::redis::RedisRateLimitStore;
use super::types::{RateLimitStore, RateLimiter};

static RATE_LIMIT_STORE_TYPE: LazyLock<String> = LazyLock::new(|| {
    env::var("RATE_LIMIT_STORE_TYPE").unwrap_or_else(|_| "memory".to_string())
});

pub(super) static RATE_LIMITER: LazyLock<RateLimiter> = LazyLock::new(|| {
    let store_type = RATE_LIMIT_STORE_TYPE.as_str();
    tracing::info!("Initializing rate limit store with type: {}", store_type);

    let store: Box<dyn RateLimitStore> = match store_type {
        "memory" => Box::new(InMemoryRateLimitStore::new()),
        "redis" => {
            let url = env::var("RATE_LIMIT_STORE_URL")
                .expect("RATE_LIMIT_STORE_URL must be set for the redis rate limit store");
            let client = match redis::Client::open(url.as_str()) {
                Ok(client) => client,
                Err(e) => panic!("Failed to create Redis client: {e}"),
            };
            Box::new(RedisRateLimitStore { client })
        }
        t => panic!(
            "Unsupported rate limit store type: {t}. Supported types are 'memory' and 'redis'"
        ),
    };

    RateLimiter::new(store)
});
