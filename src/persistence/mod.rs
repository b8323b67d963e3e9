//! Session-scoped persistence
//!
//! - `SessionStore`: the string key/value facility (sessionStorage on web)
//! - `MemoryStore`: in-process store with an optional quota, for native and tests
//! - `codec`: the three redundant encodings of a navigation record

pub mod codec;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use codec::{Representation, StateStore};
#[cfg(target_arch = "wasm32")]
pub use web::WebSessionStore;

use std::collections::BTreeMap;

use crate::error::StoreError;

/// Synchronous string key/value store
pub trait SessionStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&mut self, key: &str) -> Result<(), StoreError>;
    fn keys(&self) -> Result<Vec<String>, StoreError>;
}

impl<T: SessionStore + ?Sized> SessionStore for Box<T> {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).set(key, value)
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        (**self).remove(key)
    }

    fn keys(&self) -> Result<Vec<String>, StoreError> {
        (**self).keys()
    }
}

/// In-memory session store
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    items: BTreeMap<String, String>,
    /// Byte ceiling over all keys and values, `None` for unlimited
    capacity: Option<usize>,
    writes: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store that rejects writes once keys + values exceed `bytes`
    pub fn with_capacity(bytes: usize) -> Self {
        Self {
            capacity: Some(bytes),
            ..Self::default()
        }
    }

    /// Bytes currently held
    pub fn used(&self) -> usize {
        self.items.iter().map(|(k, v)| k.len() + v.len()).sum()
    }

    /// Number of successful `set` calls so far
    pub fn write_count(&self) -> usize {
        self.writes
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl SessionStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.items.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        if let Some(capacity) = self.capacity {
            let replaced = self.items.get(key).map(|v| key.len() + v.len()).unwrap_or(0);
            let needed = key.len() + value.len();
            let available = capacity.saturating_sub(self.used() - replaced);
            if needed > available {
                return Err(StoreError::QuotaExceeded {
                    key: key.to_string(),
                    needed,
                    available,
                });
            }
        }
        self.items.insert(key.to_string(), value.to_string());
        self.writes += 1;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.items.remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.items.keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_basic_ops() {
        let mut store = MemoryStore::new();
        assert_eq!(store.get("a").unwrap(), None);

        store.set("a", "1").unwrap();
        store.set("b", "2").unwrap();
        assert_eq!(store.get("a").unwrap().as_deref(), Some("1"));
        assert_eq!(store.keys().unwrap(), vec!["a".to_string(), "b".to_string()]);

        store.remove("a").unwrap();
        assert_eq!(store.get("a").unwrap(), None);
        assert_eq!(store.write_count(), 2);
    }

    #[test]
    fn test_memory_store_quota() {
        let mut store = MemoryStore::with_capacity(10);
        store.set("key", "1234").unwrap(); // 7 bytes
        let err = store.set("k2", "12345").unwrap_err();
        assert!(matches!(err, StoreError::QuotaExceeded { needed: 7, available: 3, .. }));
        // Failed write leaves the store untouched
        assert_eq!(store.get("k2").unwrap(), None);
        assert_eq!(store.write_count(), 1);
    }

    #[test]
    fn test_memory_store_quota_counts_replacement() {
        let mut store = MemoryStore::with_capacity(10);
        store.set("key", "1234567").unwrap(); // exactly full
        // Overwriting the same key frees its old bytes first
        store.set("key", "7654321").unwrap();
        assert_eq!(store.used(), 10);
    }
}
