//! Boundary traits for the external collaborators the vault depends on.
//!
//! The core never talks to a wallet, a biometric prompt, a key-value store,
//! or a remote blob store directly; everything goes through these traits.
//! Production implementations live at the application rim, test doubles next
//! to the tests that use them.

use async_trait::async_trait;
use thiserror::Error;

/// Wallet rejected the request or is unreachable.
#[derive(Debug, Clone, Error)]
#[error("signing failed: {0}")]
pub struct SigningError(pub String);

/// Local persistence unavailable or corrupt. Fatal to the current operation.
#[derive(Debug, Clone, Error)]
#[error("persistence failed: {0}")]
pub struct PersistenceError(pub String);

impl From<std::io::Error> for PersistenceError {
    fn from(e: std::io::Error) -> Self {
        PersistenceError(e.to_string())
    }
}

/// Remote blob store failure, on upload or fetch.
#[derive(Debug, Clone, Error)]
#[error("blob store: {0}")]
pub struct BlobError(pub String);

/// An external signing key holder: a hardware wallet, a mobile wallet
/// adapter, or the local software signer. Signing may prompt a human and
/// may be rejected.
#[async_trait]
pub trait SigningCapability: Send + Sync {
    /// Stable public address of the signing key.
    async fn address(&self) -> Result<String, SigningError>;

    /// Sign an arbitrary message. May suspend on user approval.
    async fn sign(&self, message: &[u8]) -> Result<Vec<u8>, SigningError>;
}

/// Platform biometric prompt. Cancellation is reported as `false`, never as
/// an error.
#[async_trait]
pub trait BiometricGate: Send + Sync {
    async fn is_available(&self) -> bool;
    async fn authenticate(&self, prompt: &str) -> bool;
}

/// String key-value persistence. Each `set` must replace the stored value
/// atomically; readers never observe a partial write.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, PersistenceError>;
    async fn set(&self, key: &str, value: &str) -> Result<(), PersistenceError>;
    async fn delete(&self, key: &str) -> Result<(), PersistenceError>;

    async fn delete_many(&self, keys: &[&str]) -> Result<(), PersistenceError> {
        for key in keys {
            self.delete(key).await?;
        }
        Ok(())
    }
}

/// Content-addressed blob store. A given address always resolves to the
/// same bytes; `put` requires a caller-supplied credential.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn put(&self, bytes: &[u8], credential: &str) -> Result<String, BlobError>;
    async fn get(&self, address: &str) -> Result<Vec<u8>, BlobError>;
}
