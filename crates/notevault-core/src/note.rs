//! Note records, the persisted index entry, and storage locators.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// The two address-prefix families the backing blob store issues. Anything
/// else found in a legacy locator slot is inline ciphertext.
pub const REMOTE_ADDRESS_PREFIXES: [&str; 2] = ["bafy", "Qm"];

/// Payload is damaged or foreign even though it decrypted cleanly. Distinct
/// from [`crate::crypto::CryptoError::Decrypt`] so callers can tell a wrong
/// key from a corrupted note.
#[derive(Debug, Error)]
#[error("note payload malformed: {0}")]
pub struct CodecError(#[from] serde_json::Error);

/// A decrypted note. Exists only in memory for the duration of one
/// operation; never persisted in this form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: String,
    pub title: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Note {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            title: title.into(),
            body: body.into(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Serialize to the plaintext byte form the cipher seals. Stable field
    /// names; unknown fields are ignored on decode, so adding fields later
    /// does not break old ciphertexts.
    pub fn encode(&self) -> Result<Vec<u8>, CodecError> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

/// Where a note's ciphertext lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Locator {
    /// Ciphertext stored directly in the local index.
    Inline(String),
    /// Content address in the remote blob store. Immutable once issued.
    Remote(String),
}

impl Locator {
    /// Classify a locator that was persisted as a bare string by earlier
    /// index versions: recognized content-address prefixes mean remote,
    /// anything else is inline ciphertext.
    pub fn classify(value: String) -> Self {
        if REMOTE_ADDRESS_PREFIXES.iter().any(|p| value.starts_with(p)) {
            Locator::Remote(value)
        } else {
            Locator::Inline(value)
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, Locator::Remote(_))
    }
}

/// Persisted index entry. The title is kept cleartext so the note list
/// renders without key material; that leaks titles to anyone who can read
/// the index and is the accepted trade-off here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealedNote {
    pub id: String,
    pub title: String,
    #[serde(deserialize_with = "locator_or_legacy")]
    pub locator: Locator,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Accept both the tagged locator form and the legacy bare string.
fn locator_or_legacy<'de, D>(deserializer: D) -> Result<Locator, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Tagged(Locator),
        Legacy(String),
    }
    Ok(match Repr::deserialize(deserializer)? {
        Repr::Tagged(locator) => locator,
        Repr::Legacy(value) => Locator::classify(value),
    })
}
