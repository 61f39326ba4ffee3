//! The vault coordinator: composes the session, key derivation, the codec,
//! the cipher, and the storage resolver into whole note operations.
//!
//! The session is passed in by the caller for every operation that needs
//! key material; nothing here reaches into ambient state.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use crate::boundary::{BlobStore, KeyValueStore};
use crate::crypto::{derive_note_key, open, seal};
use crate::error::{Result, VaultError};
use crate::note::{Note, SealedNote};
use crate::session::WalletSession;
use crate::store::NoteStore;

pub struct NoteVault {
    store: NoteStore,
}

impl NoteVault {
    /// Load the vault over the given persistence and blob store.
    pub async fn open(kv: Arc<dyn KeyValueStore>, blobs: Arc<dyn BlobStore>) -> Result<Self> {
        Ok(Self {
            store: NoteStore::load(kv, blobs).await?,
        })
    }

    /// Encrypt and store a new note. Remote replication is best-effort; the
    /// note is created even when the upload fails.
    pub async fn create_note(
        &mut self,
        session: &mut WalletSession,
        title: &str,
        body: &str,
        remote_enabled: bool,
    ) -> Result<Note> {
        let signature = session.encryption_signature().await?;
        let key = derive_note_key(signature.as_bytes());

        let note = Note::new(title, body);
        let ciphertext = seal(&key, &note.encode()?)?;
        let locator = self.store.put(&note.id, ciphertext, remote_enabled).await?;
        self.store
            .upsert(SealedNote {
                id: note.id.clone(),
                title: note.title.clone(),
                locator,
                created_at: note.created_at,
                updated_at: note.updated_at,
            })
            .await?;
        info!(id = %note.id, "note created");
        Ok(note)
    }

    /// Fetch, decrypt, and decode a note by id.
    pub async fn read_note(&self, session: &mut WalletSession, id: &str) -> Result<Note> {
        let sealed = self
            .store
            .get(id)
            .ok_or_else(|| VaultError::NoteNotFound(id.to_string()))?;
        let signature = session.encryption_signature().await?;
        let key = derive_note_key(signature.as_bytes());

        let ciphertext = self.store.resolve(&sealed.locator).await?;
        let plaintext = open(&key, &ciphertext)?;
        Ok(Note::decode(&plaintext)?)
    }

    /// Re-encrypt a note with new content. Keeps `created_at`, refreshes
    /// `updated_at`; the last writer per id wins.
    pub async fn update_note(
        &mut self,
        session: &mut WalletSession,
        id: &str,
        title: &str,
        body: &str,
        remote_enabled: bool,
    ) -> Result<Note> {
        let created_at = self
            .store
            .get(id)
            .ok_or_else(|| VaultError::NoteNotFound(id.to_string()))?
            .created_at;
        let note = Note {
            id: id.to_string(),
            title: title.to_string(),
            body: body.to_string(),
            created_at,
            updated_at: Utc::now(),
        };

        let signature = session.encryption_signature().await?;
        let key = derive_note_key(signature.as_bytes());
        let ciphertext = seal(&key, &note.encode()?)?;
        let locator = self.store.put(id, ciphertext, remote_enabled).await?;
        self.store
            .upsert(SealedNote {
                id: note.id.clone(),
                title: note.title.clone(),
                locator,
                created_at: note.created_at,
                updated_at: note.updated_at,
            })
            .await?;
        info!(%id, "note updated");
        Ok(note)
    }

    /// Remove a note from the index. A remote blob, if any, is left behind:
    /// content addresses are immutable and unreadable without the key.
    pub async fn delete_note(&mut self, id: &str) -> Result<()> {
        self.store.remove(id).await?;
        info!(%id, "note deleted");
        Ok(())
    }

    /// Index entries in insertion order. Titles are readable without key
    /// material.
    pub fn list(&self) -> &[SealedNote] {
        self.store.list()
    }

    pub async fn set_remote_token(&self, token: &str) -> Result<()> {
        Ok(self.store.set_remote_token(token).await?)
    }

    pub async fn clear_remote_token(&self) -> Result<()> {
        Ok(self.store.clear_remote_token().await?)
    }

    pub async fn remote_token(&self) -> Result<Option<String>> {
        Ok(self.store.remote_token().await?)
    }
}
