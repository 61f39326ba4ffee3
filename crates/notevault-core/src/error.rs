use thiserror::Error;

use crate::crypto::CryptoError;
use crate::note::CodecError;
use crate::session::SessionError;
use crate::store::StoreError;

/// Crate-wide error for vault operations.
#[derive(Debug, Error)]
pub enum VaultError {
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("note not found: {0}")]
    NoteNotFound(String),
}

pub type Result<T> = std::result::Result<T, VaultError>;
