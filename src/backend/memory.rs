//! In-memory storage backend.

use super::StorageBackend;
use crate::error::Result;
use dashmap::DashMap;
use std::sync::Arc;

/// Process-local backend backed by a concurrent map.
///
/// Clones share the same map, so a clone handed to a cache and one kept by a test observe
/// the same entries. Nothing survives a restart; use [`FileBackend`](super::FileBackend)
/// for that.
#[derive(Clone, Default)]
pub struct InMemoryBackend {
    store: Arc<DashMap<String, Vec<u8>>>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}

impl StorageBackend for InMemoryBackend {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let value = self.store.get(key).map(|v| v.value().clone());
        if value.is_some() {
            trace!("memory GET {} -> HIT", key);
        } else {
            trace!("memory GET {} -> MISS", key);
        }
        Ok(value)
    }

    fn set(&self, key: &str, value: Vec<u8>) -> Result<()> {
        self.store.insert(key.to_string(), value);
        trace!("memory SET {}", key);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.store.remove(key);
        trace!("memory REMOVE {}", key);
        Ok(())
    }

    fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.store.contains_key(key))
    }

    fn keys(&self) -> Result<Vec<String>> {
        Ok(self.store.iter().map(|e| e.key().clone()).collect())
    }

    fn clear_all(&self) -> Result<()> {
        self.store.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_remove() {
        let backend = InMemoryBackend::new();
        backend.set("a", b"1".to_vec()).unwrap();

        assert_eq!(backend.get("a").unwrap(), Some(b"1".to_vec()));
        assert!(backend.exists("a").unwrap());

        backend.remove("a").unwrap();
        assert_eq!(backend.get("a").unwrap(), None);
        assert!(backend.is_empty());
    }

    #[test]
    fn test_remove_absent_key_is_ok() {
        let backend = InMemoryBackend::new();
        assert!(backend.remove("missing").is_ok());
    }

    #[test]
    fn test_clones_share_state() {
        let backend = InMemoryBackend::new();
        let other = backend.clone();
        other.set("k", b"v".to_vec()).unwrap();
        assert_eq!(backend.len(), 1);

        backend.clear_all().unwrap();
        assert!(other.is_empty());
    }

    #[test]
    fn test_keys_lists_everything() {
        let backend = InMemoryBackend::new();
        backend.set("x", vec![]).unwrap();
        backend.set("y", vec![]).unwrap();

        let mut keys = backend.keys().unwrap();
        keys.sort();
        assert_eq!(keys, vec!["x".to_string(), "y".to_string()]);
    }
}
