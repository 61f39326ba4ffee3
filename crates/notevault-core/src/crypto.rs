//! Key derivation and note sealing.
//!
//! The note key is derived from a wallet signature over
//! [`KEY_DERIVATION_MESSAGE`]: SHA-256(signature) → 32-byte key. Derivation
//! is total and deterministic; the same signature always yields the same key.
//!
//! Sealing uses XChaCha20-Poly1305 with a fresh random 24-byte nonce per
//! call. Ciphertext wire format, base64 armored:
//!   [ nonce (24 bytes) | ciphertext + tag ]

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chacha20poly1305::aead::{Aead, AeadCore, KeyInit, OsRng};
use chacha20poly1305::XChaCha20Poly1305;
use sha2::{Digest, Sha256};
use thiserror::Error;
use zeroize::{ZeroizeOnDrop, Zeroizing};

/// The one message ever signed to produce key material. Signing anything
/// else yields a different key and therefore unopenable ciphertext; every
/// signing call must reference this constant.
pub const KEY_DERIVATION_MESSAGE: &[u8] = b"notevault-encryption-key-v1";

pub const KEY_LEN: usize = 32;
const NONCE_LEN: usize = 24;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("AEAD encryption failed")]
    Encrypt,

    #[error("decryption failed: wrong key or corrupted ciphertext")]
    Decrypt,
}

/// 32-byte note encryption key. Never persisted; zeroized on drop.
#[derive(ZeroizeOnDrop)]
pub struct NoteKey(pub [u8; KEY_LEN]);

/// Derive the note key from a wallet signature.
pub fn derive_note_key(signature: &[u8]) -> NoteKey {
    let digest = Sha256::digest(signature);
    NoteKey(digest.into())
}

/// Encrypt `plaintext` under `key`, prepending a random nonce, and armor
/// the result as base64.
pub fn seal(key: &NoteKey, plaintext: &[u8]) -> Result<String, CryptoError> {
    let cipher = XChaCha20Poly1305::new_from_slice(&key.0).map_err(|_| CryptoError::Encrypt)?;
    let nonce = XChaCha20Poly1305::generate_nonce(&mut OsRng);
    let ciphertext = cipher
        .encrypt(&nonce, plaintext)
        .map_err(|_| CryptoError::Encrypt)?;

    let mut out = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    out.extend_from_slice(&nonce);
    out.extend_from_slice(&ciphertext);
    Ok(BASE64.encode(out))
}

/// Decrypt base64-armored wire bytes produced by [`seal`].
///
/// Note payloads are JSON text, so a decrypted payload that is not valid
/// UTF-8 counts as a decryption failure too. Malformed input of any shape
/// returns a typed error, never a panic.
pub fn open(key: &NoteKey, ciphertext: &str) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
    let data = BASE64.decode(ciphertext).map_err(|_| CryptoError::Decrypt)?;
    if data.len() < NONCE_LEN {
        return Err(CryptoError::Decrypt);
    }
    let (nonce, ct) = data.split_at(NONCE_LEN);

    let cipher = XChaCha20Poly1305::new_from_slice(&key.0).map_err(|_| CryptoError::Decrypt)?;
    let plaintext = cipher
        .decrypt(chacha20poly1305::XNonce::from_slice(nonce), ct)
        .map_err(|_| CryptoError::Decrypt)?;

    if std::str::from_utf8(&plaintext).is_err() {
        return Err(CryptoError::Decrypt);
    }
    Ok(Zeroizing::new(plaintext))
}
