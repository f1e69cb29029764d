use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::errors::RateLimitError;
use super::types::RateLimitStore;

const MAX_ENTRIES: usize = 10_000;
const CLEANUP_INTERVAL_MS: u64 = 60_000;
const EVICT_BATCH: usize = MAX_ENTRIES / 10;

#[derive(Debug, Clone)]
struct WindowState {
    count: u64,
    window_start: u64,
    window_ms: u64,
    last_seen: u64,
}

impl WindowState {
    fn reset_at(&self) -> u64 {
        self.window_start + self.window_ms
    }
}

#[derive(Default)]
struct Inner {
    windows: HashMap<String, WindowState>,
    last_cleanup: u64,
}

/// Per-process counters; instances behind a load balancer do not share them
#[derive(Default)]
pub struct InMemoryRateLimitStore {
    inner: Mutex<Inner>,
}

impl InMemoryRateLimitStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    async fn len(&self) -> usize {
        self.inner.lock().await.windows.len()
    }
}

#[async_trait]
impl RateLimitStore for InMemoryRateLimitStore {
    async fn increment(
        &self,
        key: &str,
        window_ms: u64,
        now_ms: u64,
    ) -> Result<(u64, u64), RateLimitError> {
        let mut inner = self.inner.lock().await;

        let result = {
            let state = inner
                .windows
                .entry(key.to_string())
                .or_insert(WindowState {
                    count: 0,
                    window_start: now_ms,
                    window_ms,
                    last_seen: now_ms,
                });

            if now_ms >= state.reset_at() {
                state.window_start = now_ms;
                state.window_ms = window_ms;
                state.count = 0;
            }

            state.count = state.count.saturating_add(1);
            state.last_seen = now_ms;
            (state.count, state.reset_at())
        };

        cleanup(&mut inner, now_ms);

        Ok(result)
    }
}

fn cleanup(inner: &mut Inner, now_ms: u64) {
    let overfull = inner.windows.len() > MAX_ENTRIES;
    if overfull || now_ms.saturating_sub(inner.last_cleanup) >= CLEANUP_INTERVAL_MS {
        inner.windows.retain(|_, state| now_ms < state.reset_at());
        inner.last_cleanup = now_ms;
    }

    if inner.windows.len() > MAX_ENTRIES {
        evict_oldest(&mut inner.windows);
    }
}

/// Drops the least recently seen keys down to `MAX_ENTRIES - EVICT_BATCH`,
/// so a full map is not scanned again on every following insert.
fn evict_oldest(windows: &mut HashMap<String, WindowState>) {
    let remove_count = windows.len().saturating_sub(MAX_ENTRIES - EVICT_BATCH);
    if remove_count == 0 {
        return;
    }

    let mut entries: Vec<(u64, String)> = windows
        .iter()
        .map(|(key, state)| (state.last_seen, key.clone()))
        .collect();
    entries.select_nth_unstable_by_key(remove_count - 1, |(last_seen, _)| *last_seen);

    for (_, key) in entries.into_iter().take(remove_count) {
        windows.remove(&key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_increment_counts_within_window() {
        let store = InMemoryRateLimitStore::new();
        assert_eq!(store.increment("k", 1000, 0).await.unwrap(), (1, 1000));
        assert_eq!(store.increment("k", 1000, 500).await.unwrap(), (2, 1000));
        // Window elapsed
        assert_eq!(store.increment("k", 1000, 1000).await.unwrap(), (1, 2000));
    }

    #[tokio::test]
    async fn test_expired_windows_are_pruned() {
        let store = InMemoryRateLimitStore::new();
        store.increment("old", 1000, 0).await.unwrap();
        store.increment("new", 1000, CLEANUP_INTERVAL_MS).await.unwrap();
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_map_is_capped() {
        let store = InMemoryRateLimitStore::new();
        for i in 0..(MAX_ENTRIES as u64 + 5) {
            store
                .increment(&format!("key-{i}"), 3_600_000, i)
                .await
                .unwrap();
        }
        // One batch went at the first overflow, the last four keys came after it
        assert_eq!(store.len().await, MAX_ENTRIES - EVICT_BATCH + 4);

        // The least recently seen keys went first
        let inner = store.inner.lock().await;
        assert!(!inner.windows.contains_key("key-0"));
        assert!(!inner.windows.contains_key(&format!("key-{}", EVICT_BATCH)));
        assert!(inner.windows.contains_key(&format!("key-{}", EVICT_BATCH + 1)));
        assert!(inner.windows.contains_key(&format!("key-{}", MAX_ENTRIES + 4)));
    }

    #[tokio::test]
    async fn test_overflow_prunes_expired_before_evicting() {
        let store = InMemoryRateLimitStore::new();
        for i in 0..MAX_ENTRIES as u64 {
            store.increment(&format!("short-{i}"), 10, 0).await.unwrap();
        }
        store.increment("live", 3_600_000, 50).await.unwrap();

        // Every short window had expired, so no live key was evicted
        assert_eq!(store.len().await, 1);
    }
}
