//! Durable key-value store abstraction
//!
//! The cache only needs opaque blobs under string keys. Hosts decide when to
//! save; nothing here runs on a timer.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

use crate::PersistenceError;

/// Opaque durable store used for warm-start
pub trait PersistenceBackend: Send + Sync {
    /// Read a blob, `None` when the key was never written
    fn load(&self, key: &str) -> Result<Option<Vec<u8>>, PersistenceError>;

    /// Write a blob, replacing any previous value
    fn save(&self, key: &str, bytes: &[u8]) -> Result<(), PersistenceError>;

    /// Drop a blob; removing a missing key is not an error
    fn remove(&self, key: &str) -> Result<(), PersistenceError>;
}

/// Shared handle to a backend
pub type SharedBackend = Arc<dyn PersistenceBackend>;

/// In-process store, useful for tests and short-lived hosts
#[derive(Debug, Default)]
pub struct MemoryStore {
    blobs: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.blobs.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.lock().is_empty()
    }
}

impl PersistenceBackend for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<Vec<u8>>, PersistenceError> {
        Ok(self.blobs.lock().get(key).cloned())
    }

    fn save(&self, key: &str, bytes: &[u8]) -> Result<(), PersistenceError> {
        self.blobs.lock().insert(key.to_string(), bytes.to_vec());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), PersistenceError> {
        self.blobs.lock().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_roundtrip() {
        let store = MemoryStore::new();
        assert!(store.load("k").unwrap().is_none());

        store.save("k", b"data").unwrap();
        assert_eq!(store.load("k").unwrap().as_deref(), Some(&b"data"[..]));

        store.remove("k").unwrap();
        store.remove("k").unwrap();
        assert!(store.is_empty());
    }
}
