//! In-memory collaborator implementations for tests and demos.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::boundary::{BlobError, BlobStore, KeyValueStore, PersistenceError};

/// Volatile key-value store.
#[derive(Default)]
pub struct MemoryKvStore {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryKvStore {
    async fn get(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        Ok(self.values.read().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), PersistenceError> {
        self.values
            .write()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), PersistenceError> {
        self.values.write().remove(key);
        Ok(())
    }
}

/// Content-addressed blob store backed by a map. The address is the BLAKE3
/// digest of the content behind one of the recognized prefixes, so the same
/// bytes always land at the same address.
#[derive(Default)]
pub struct MemoryBlobStore {
    blobs: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn address_for(bytes: &[u8]) -> String {
        format!("bafy{}", blake3::hash(bytes).to_hex())
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(&self, bytes: &[u8], _credential: &str) -> Result<String, BlobError> {
        let address = Self::address_for(bytes);
        self.blobs.write().insert(address.clone(), bytes.to_vec());
        Ok(address)
    }

    async fn get(&self, address: &str) -> Result<Vec<u8>, BlobError> {
        self.blobs
            .read()
            .get(address)
            .cloned()
            .ok_or_else(|| BlobError(format!("address not found: {address}")))
    }
}
