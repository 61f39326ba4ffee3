//! End-to-end flows across the session, the vault, and storage.

use std::sync::Arc;

use async_trait::async_trait;
use notevault_core::boundary::{BiometricGate, SigningCapability, SigningError};
use notevault_core::memory::{MemoryBlobStore, MemoryKvStore};
use notevault_core::note::Locator;
use notevault_core::signer::LocalSigner;
use notevault_core::{NoteVault, VaultError, WalletSession};

struct FixedSigner;

#[async_trait]
impl SigningCapability for FixedSigner {
    async fn address(&self) -> Result<String, SigningError> {
        Ok("Addr1".to_string())
    }
    async fn sign(&self, _message: &[u8]) -> Result<Vec<u8>, SigningError> {
        Ok(b"Sig1".to_vec())
    }
}

struct NoGate;

#[async_trait]
impl BiometricGate for NoGate {
    async fn is_available(&self) -> bool {
        false
    }
    async fn authenticate(&self, _prompt: &str) -> bool {
        true
    }
}

async fn connected_session(kv: Arc<MemoryKvStore>) -> WalletSession {
    let mut session = WalletSession::restore(Arc::new(FixedSigner), Arc::new(NoGate), kv)
        .await
        .unwrap();
    session.connect().await.unwrap();
    session
}

#[tokio::test]
async fn end_to_end_inline_lifecycle() {
    let kv = Arc::new(MemoryKvStore::new());
    let mut session = connected_session(kv.clone()).await;
    assert_eq!(session.address(), Some("Addr1"));

    let mut vault = NoteVault::open(kv, Arc::new(MemoryBlobStore::new()))
        .await
        .unwrap();
    let note = vault
        .create_note(&mut session, "T", "B", false)
        .await
        .unwrap();

    assert_eq!(vault.list().len(), 1);
    assert!(matches!(vault.list()[0].locator, Locator::Inline(_)));

    let read = vault.read_note(&mut session, &note.id).await.unwrap();
    assert_eq!(read.title, "T");
    assert_eq!(read.body, "B");
    assert_eq!(read.created_at, note.created_at);
    assert_eq!(read.updated_at, note.updated_at);

    vault.delete_note(&note.id).await.unwrap();
    assert!(vault.list().is_empty());
}

#[tokio::test]
async fn remote_notes_round_trip_through_the_blob_store() {
    let kv = Arc::new(MemoryKvStore::new());
    let mut session = connected_session(kv.clone()).await;

    let mut vault = NoteVault::open(kv, Arc::new(MemoryBlobStore::new()))
        .await
        .unwrap();
    vault.set_remote_token("api-token").await.unwrap();

    let note = vault
        .create_note(&mut session, "remote", "body", true)
        .await
        .unwrap();
    assert!(vault.list()[0].locator.is_remote());

    let read = vault.read_note(&mut session, &note.id).await.unwrap();
    assert_eq!(read.body, "body");
}

#[tokio::test]
async fn index_survives_restart() {
    let kv = Arc::new(MemoryKvStore::new());
    let blobs = Arc::new(MemoryBlobStore::new());
    let mut session = connected_session(kv.clone()).await;

    let id = {
        let mut vault = NoteVault::open(kv.clone(), blobs.clone()).await.unwrap();
        vault
            .create_note(&mut session, "persisted", "body", false)
            .await
            .unwrap()
            .id
    };

    let vault = NoteVault::open(kv, blobs).await.unwrap();
    assert_eq!(vault.list().len(), 1);
    let read = vault.read_note(&mut session, &id).await.unwrap();
    assert_eq!(read.title, "persisted");
}

#[tokio::test]
async fn update_preserves_creation_time() {
    let kv = Arc::new(MemoryKvStore::new());
    let mut session = connected_session(kv.clone()).await;
    let mut vault = NoteVault::open(kv, Arc::new(MemoryBlobStore::new()))
        .await
        .unwrap();

    let note = vault
        .create_note(&mut session, "old", "old body", false)
        .await
        .unwrap();
    let updated = vault
        .update_note(&mut session, &note.id, "new", "new body", false)
        .await
        .unwrap();

    assert_eq!(updated.created_at, note.created_at);
    let read = vault.read_note(&mut session, &note.id).await.unwrap();
    assert_eq!(read.title, "new");
    assert_eq!(read.body, "new body");
    assert_eq!(read.created_at, note.created_at);
}

#[tokio::test]
async fn another_wallet_cannot_read_the_notes() {
    let kv = Arc::new(MemoryKvStore::new());
    let blobs = Arc::new(MemoryBlobStore::new());
    let mut session = connected_session(kv.clone()).await;

    let mut vault = NoteVault::open(kv.clone(), blobs.clone()).await.unwrap();
    let note = vault
        .create_note(&mut session, "secret", "body", false)
        .await
        .unwrap();

    // A different wallet derives a different key.
    let other_kv = Arc::new(MemoryKvStore::new());
    let signer = LocalSigner::load_or_generate(other_kv.as_ref()).await.unwrap();
    let mut other_session =
        WalletSession::restore(Arc::new(signer), Arc::new(NoGate), other_kv)
            .await
            .unwrap();
    other_session.connect().await.unwrap();

    let vault = NoteVault::open(kv, blobs).await.unwrap();
    let result = vault.read_note(&mut other_session, &note.id).await;
    assert!(matches!(result, Err(VaultError::Crypto(_))));
}

#[tokio::test]
async fn locked_session_blocks_note_access() {
    let kv = Arc::new(MemoryKvStore::new());
    let mut session = connected_session(kv.clone()).await;
    let mut vault = NoteVault::open(kv, Arc::new(MemoryBlobStore::new()))
        .await
        .unwrap();
    let note = vault
        .create_note(&mut session, "T", "B", false)
        .await
        .unwrap();

    session.lock().await.unwrap();
    let result = vault.read_note(&mut session, &note.id).await;
    assert!(matches!(result, Err(VaultError::Session(_))));

    assert!(session.unlock().await.unwrap());
    assert!(vault.read_note(&mut session, &note.id).await.is_ok());
}

#[tokio::test]
async fn missing_note_is_reported_by_id() {
    let kv = Arc::new(MemoryKvStore::new());
    let mut session = connected_session(kv.clone()).await;
    let vault = NoteVault::open(kv, Arc::new(MemoryBlobStore::new()))
        .await
        .unwrap();

    let result = vault.read_note(&mut session, "nope").await;
    assert!(matches!(result, Err(VaultError::NoteNotFound(_))));
}
