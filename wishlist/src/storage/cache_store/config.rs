use std::{env, sync::LazyLock};
use tokio::sync::Mutex;

use super::types::{CacheStore, MemoryCacheStore, RedisCacheStore};

/// Challenge cache selected by `GENERIC_CACHE_STORE_TYPE`: `memory` or `redis`
pub(crate) static GENERIC_CACHE_STORE: LazyLock<Mutex<Box<dyn CacheStore>>> =
    LazyLock::new(|| {
        let store_type = env::var("GENERIC_CACHE_STORE_TYPE")
            .expect("GENERIC_CACHE_STORE_TYPE must be set")
            .to_lowercase();

        let store: Box<dyn CacheStore> = match store_type.as_str() {
            "memory" => Box::new(MemoryCacheStore::new()),
            "redis" => {
                let url = env::var("GENERIC_CACHE_STORE_URL")
                    .expect("GENERIC_CACHE_STORE_URL must be set for the redis cache store");
                let client = redis::Client::open(url.as_str())
                    .unwrap_or_else(|e| panic!("Invalid GENERIC_CACHE_STORE_URL: {e}"));
                Box::new(RedisCacheStore { client })
            }
            other => panic!("Unsupported cache store type '{other}', expected 'memory' or 'redis'"),
        };

        tracing::info!(store_type = %store_type, "Cache store selected");
        Mutex::new(store)
    });
