// crates/tally-store/src/memory.rs
//
// In-memory blob store implementing the `BlobStore` trait.
//
// A HashMap behind a std RwLock. No persistence and no consistency guarantees
// beyond last-writer-wins per key.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use tally_core::error::TallyError;
use tally_core::traits::BlobStore;

/// In-memory key-value blob store.
#[derive(Debug, Default)]
pub struct InMemoryBlobStore {
    blobs: RwLock<HashMap<String, Vec<u8>>>,
}

impl InMemoryBlobStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the number of keys currently stored.
    pub fn len(&self) -> Result<usize, TallyError> {
        let blobs = self
            .blobs
            .read()
            .map_err(|e| TallyError::Storage(format!("RwLock poisoned: {}", e)))?;
        Ok(blobs.len())
    }

    pub fn is_empty(&self) -> Result<bool, TallyError> {
        Ok(self.len()? == 0)
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn put(&self, key: &str, value: Vec<u8>) -> Result<(), TallyError> {
        let mut blobs = self
            .blobs
            .write()
            .map_err(|e| TallyError::Storage(format!("RwLock poisoned: {}", e)))?;
        blobs.insert(key.to_string(), value);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, TallyError> {
        let blobs = self
            .blobs
            .read()
            .map_err(|e| TallyError::Storage(format!("RwLock poisoned: {}", e)))?;
        Ok(blobs.get(key).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_then_get() {
        let store = InMemoryBlobStore::new();
        store.put("peer_1_data", b"hello".to_vec()).await.unwrap();
        assert_eq!(
            store.get("peer_1_data").await.unwrap(),
            Some(b"hello".to_vec())
        );
        assert_eq!(store.len().unwrap(), 1);
    }

    #[tokio::test]
    async fn missing_key_is_none() {
        let store = InMemoryBlobStore::new();
        assert_eq!(store.get("absent").await.unwrap(), None);
        assert!(store.is_empty().unwrap());
    }

    #[tokio::test]
    async fn put_overwrites() {
        let store = InMemoryBlobStore::new();
        store.put("k", vec![1]).await.unwrap();
        store.put("k", vec![2, 3]).await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some(vec![2, 3]));
        assert_eq!(store.len().unwrap(), 1);
    }
}
