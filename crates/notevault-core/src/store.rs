//! Hybrid note storage: local index plus optional content-addressed remote.
//!
//! Writes attempt a remote upload when enabled and fall back to inline
//! storage on any failure. Reads of a remote locator surface fetch errors
//! without fallback; an already-remote note has no local copy. The index is
//! the only durable record of which notes exist and is rewritten as one
//! whole snapshot after every mutation.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, warn};

use crate::boundary::{BlobStore, KeyValueStore, PersistenceError};
use crate::note::{Locator, SealedNote};

/// Serialized index snapshot.
pub const NOTE_INDEX_KEY: &str = "notevault.note_index";
/// Credential for remote uploads.
pub const REMOTE_TOKEN_KEY: &str = "notevault.remote_token";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("remote fetch failed for {address}: {reason}")]
    Fetch { address: String, reason: String },

    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error("note index corrupted: {0}")]
    IndexCorrupted(#[from] serde_json::Error),
}

pub struct NoteStore {
    kv: Arc<dyn KeyValueStore>,
    blobs: Arc<dyn BlobStore>,
    notes: Vec<SealedNote>,
}

impl NoteStore {
    /// Load the persisted index, or start empty when none exists.
    pub async fn load(
        kv: Arc<dyn KeyValueStore>,
        blobs: Arc<dyn BlobStore>,
    ) -> Result<Self, StoreError> {
        let notes = match kv.get(NOTE_INDEX_KEY).await? {
            Some(json) => serde_json::from_str(&json)?,
            None => Vec::new(),
        };
        Ok(Self { kv, blobs, notes })
    }

    /// Decide where ciphertext lives. Upload failures are logged and
    /// recovered by falling back to inline storage; they never block the
    /// write.
    pub async fn put(
        &self,
        id: &str,
        ciphertext: String,
        remote_enabled: bool,
    ) -> Result<Locator, StoreError> {
        if !remote_enabled {
            return Ok(Locator::Inline(ciphertext));
        }
        let credential = match self.kv.get(REMOTE_TOKEN_KEY).await? {
            Some(token) => token,
            None => {
                debug!(id, "no remote credential configured, storing inline");
                return Ok(Locator::Inline(ciphertext));
            }
        };
        match self.blobs.put(ciphertext.as_bytes(), &credential).await {
            Ok(address) => {
                debug!(id, %address, "ciphertext uploaded");
                Ok(Locator::Remote(address))
            }
            Err(err) => {
                warn!(id, error = %err, "remote upload failed, storing inline");
                Ok(Locator::Inline(ciphertext))
            }
        }
    }

    /// Fetch the ciphertext a locator points at. Remote failures surface;
    /// the inline fallback exists only on the write path.
    pub async fn resolve(&self, locator: &Locator) -> Result<String, StoreError> {
        match locator {
            Locator::Inline(ciphertext) => Ok(ciphertext.clone()),
            Locator::Remote(address) => {
                let bytes = self
                    .blobs
                    .get(address)
                    .await
                    .map_err(|e| StoreError::Fetch {
                        address: address.clone(),
                        reason: e.to_string(),
                    })?;
                String::from_utf8(bytes).map_err(|_| StoreError::Fetch {
                    address: address.clone(),
                    reason: "payload is not ciphertext text".into(),
                })
            }
        }
    }

    /// Insert or replace by id, keeping insertion order, then persist the
    /// whole snapshot. The in-memory index only advances once the write
    /// lands, so a failed write leaves both views on the previous snapshot.
    pub async fn upsert(&mut self, sealed: SealedNote) -> Result<(), StoreError> {
        let mut next = self.notes.clone();
        match next.iter_mut().find(|n| n.id == sealed.id) {
            Some(slot) => *slot = sealed,
            None => next.push(sealed),
        }
        self.persist(&next).await?;
        self.notes = next;
        Ok(())
    }

    /// Remove by id (a no-op for unknown ids) and persist the snapshot.
    pub async fn remove(&mut self, id: &str) -> Result<(), StoreError> {
        let mut next = self.notes.clone();
        next.retain(|n| n.id != id);
        if next.len() == self.notes.len() {
            return Ok(());
        }
        self.persist(&next).await?;
        self.notes = next;
        Ok(())
    }

    /// Index entries in insertion order.
    pub fn list(&self) -> &[SealedNote] {
        &self.notes
    }

    pub fn get(&self, id: &str) -> Option<&SealedNote> {
        self.notes.iter().find(|n| n.id == id)
    }

    pub async fn set_remote_token(&self, token: &str) -> Result<(), StoreError> {
        Ok(self.kv.set(REMOTE_TOKEN_KEY, token).await?)
    }

    pub async fn clear_remote_token(&self) -> Result<(), StoreError> {
        Ok(self.kv.delete(REMOTE_TOKEN_KEY).await?)
    }

    pub async fn remote_token(&self) -> Result<Option<String>, StoreError> {
        Ok(self.kv.get(REMOTE_TOKEN_KEY).await?)
    }

    async fn persist(&self, notes: &[SealedNote]) -> Result<(), StoreError> {
        let json = serde_json::to_string(notes)?;
        self.kv.set(NOTE_INDEX_KEY, &json).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boundary::BlobError;
    use crate::memory::{MemoryBlobStore, MemoryKvStore};
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::atomic::{AtomicBool, Ordering};

    struct DownBlobStore;

    #[async_trait]
    impl BlobStore for DownBlobStore {
        async fn put(&self, _bytes: &[u8], _credential: &str) -> Result<String, BlobError> {
            Err(BlobError("503 service unavailable".into()))
        }
        async fn get(&self, address: &str) -> Result<Vec<u8>, BlobError> {
            Err(BlobError(format!("address not found: {address}")))
        }
    }

    /// Key-value store that can be switched to reject writes.
    #[derive(Default)]
    struct FlakyKv {
        inner: MemoryKvStore,
        fail_writes: AtomicBool,
    }

    #[async_trait]
    impl KeyValueStore for FlakyKv {
        async fn get(&self, key: &str) -> Result<Option<String>, PersistenceError> {
            self.inner.get(key).await
        }
        async fn set(&self, key: &str, value: &str) -> Result<(), PersistenceError> {
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(PersistenceError("disk full".into()));
            }
            self.inner.set(key, value).await
        }
        async fn delete(&self, key: &str) -> Result<(), PersistenceError> {
            self.inner.delete(key).await
        }
    }

    fn sealed(id: &str) -> SealedNote {
        let now = Utc::now();
        SealedNote {
            id: id.into(),
            title: format!("title-{id}"),
            locator: Locator::Inline("ct".into()),
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn upload_failure_falls_back_to_inline() {
        let kv = Arc::new(MemoryKvStore::new());
        kv.set(REMOTE_TOKEN_KEY, "token").await.unwrap();
        let store = NoteStore::load(kv, Arc::new(DownBlobStore)).await.unwrap();

        let locator = store.put("n1", "ct".into(), true).await.unwrap();
        assert_eq!(locator, Locator::Inline("ct".into()));
    }

    #[tokio::test]
    async fn remote_disabled_always_stores_inline() {
        let kv = Arc::new(MemoryKvStore::new());
        kv.set(REMOTE_TOKEN_KEY, "token").await.unwrap();
        let store = NoteStore::load(kv, Arc::new(MemoryBlobStore::new()))
            .await
            .unwrap();

        let locator = store.put("n1", "ct".into(), false).await.unwrap();
        assert_eq!(locator, Locator::Inline("ct".into()));
    }

    #[tokio::test]
    async fn upload_round_trip_when_remote_enabled() {
        let kv = Arc::new(MemoryKvStore::new());
        kv.set(REMOTE_TOKEN_KEY, "token").await.unwrap();
        let store = NoteStore::load(kv, Arc::new(MemoryBlobStore::new()))
            .await
            .unwrap();

        let locator = store.put("n1", "ct".into(), true).await.unwrap();
        assert!(locator.is_remote());
        assert_eq!(store.resolve(&locator).await.unwrap(), "ct");
    }

    #[tokio::test]
    async fn remote_fetch_failure_surfaces_without_fallback() {
        let store = NoteStore::load(Arc::new(MemoryKvStore::new()), Arc::new(DownBlobStore))
            .await
            .unwrap();

        let result = store
            .resolve(&Locator::Remote("QmMissing".into()))
            .await;
        assert!(matches!(result, Err(StoreError::Fetch { .. })));
    }

    #[tokio::test]
    async fn failed_snapshot_write_preserves_previous_index() {
        let kv = Arc::new(FlakyKv::default());
        let blobs = Arc::new(MemoryBlobStore::new());
        let mut store = NoteStore::load(kv.clone(), blobs.clone()).await.unwrap();
        store.upsert(sealed("a")).await.unwrap();

        kv.fail_writes.store(true, Ordering::SeqCst);
        assert!(store.upsert(sealed("b")).await.is_err());
        assert_eq!(store.list().len(), 1);

        kv.fail_writes.store(false, Ordering::SeqCst);
        let reloaded = NoteStore::load(kv, blobs).await.unwrap();
        assert_eq!(reloaded.list().len(), 1);
        assert_eq!(reloaded.list()[0].id, "a");
    }

    #[tokio::test]
    async fn index_preserves_insertion_order() {
        let kv = Arc::new(MemoryKvStore::new());
        let blobs = Arc::new(MemoryBlobStore::new());
        let mut store = NoteStore::load(kv, blobs).await.unwrap();

        for id in ["a", "b", "c"] {
            store.upsert(sealed(id)).await.unwrap();
        }
        let mut replacement = sealed("b");
        replacement.title = "renamed".into();
        store.upsert(replacement).await.unwrap();

        let ids: Vec<&str> = store.list().iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, ["a", "b", "c"]);
        assert_eq!(store.get("b").unwrap().title, "renamed");

        store.remove("b").await.unwrap();
        let ids: Vec<&str> = store.list().iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, ["a", "c"]);
    }
}
