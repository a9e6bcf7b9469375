//! Key-value storage backends.
//!
//! The cache and the configuration resolver only need independent single-key operations.
//! No backend offers transactions or cross-key locking.

use crate::error::Result;
use std::sync::Arc;

mod file;
mod memory;

pub use file::FileBackend;
pub use memory::InMemoryBackend;

/// Synchronous local persistence: get/set/remove raw bytes by string key.
///
/// Every method may fail; a failed read is a corrupted or unreadable entry and a failed
/// write is usually a full or read-only store. Callers decide how to degrade.
pub trait StorageBackend: Send + Sync {
    /// Read the bytes stored under `key`, `None` when absent.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: Vec<u8>) -> Result<()>;

    /// Remove `key`. Removing an absent key is not an error.
    fn remove(&self, key: &str) -> Result<()>;

    /// Whether `key` currently holds a value.
    fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.get(key)?.is_some())
    }

    /// All keys currently stored, in no particular order.
    fn keys(&self) -> Result<Vec<String>>;

    /// Remove every key.
    fn clear_all(&self) -> Result<()> {
        for key in self.keys()? {
            self.remove(&key)?;
        }
        warn!("⚠ Storage cleared");
        Ok(())
    }
}

impl<B: StorageBackend + ?Sized> StorageBackend for Arc<B> {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: Vec<u8>) -> Result<()> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<()> {
        (**self).remove(key)
    }

    fn exists(&self, key: &str) -> Result<bool> {
        (**self).exists(key)
    }

    fn keys(&self) -> Result<Vec<String>> {
        (**self).keys()
    }

    fn clear_all(&self) -> Result<()> {
        (**self).clear_all()
    }
}
