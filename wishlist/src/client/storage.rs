//! Browser-side persistence of reservation tokens and the visitor id

use std::collections::HashMap;
use std::sync::Mutex;

const VISITOR_ID_KEY: &str = "wishlist_visitor_id";

/// Key/value persistence such as the browser's local storage
pub trait TokenStorage: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}

pub(super) fn token_key(item_id: i64) -> String {
    format!("wishlist_reservation_{item_id}")
}

/// The stored visitor id, generated on first use
pub fn visitor_id(storage: &dyn TokenStorage) -> String {
    if let Some(id) = storage.get(VISITOR_ID_KEY).filter(|id| !id.is_empty()) {
        return id;
    }
    let id = uuid::Uuid::new_v4().to_string();
    storage.set(VISITOR_ID_KEY, &id);
    id
}

#[derive(Debug, Default)]
pub struct MemoryTokenStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryTokenStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenStorage for MemoryTokenStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(key.to_string(), value.to_string());
        }
    }

    fn remove(&self, key: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.remove(key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visitor_id_is_generated_once() {
        let storage = MemoryTokenStorage::new();
        let first = visitor_id(&storage);
        let second = visitor_id(&storage);
        assert_eq!(first, second);
        assert!(uuid::Uuid::parse_str(&first).is_ok());
    }

    #[test]
    fn test_token_storage_round_trip() {
        let storage = MemoryTokenStorage::new();
        storage.set(&token_key(4), "token");
        assert_eq!(storage.get(&token_key(4)).as_deref(), Some("token"));
        storage.remove(&token_key(4));
        assert_eq!(storage.get(&token_key(4)), None);
    }
}
