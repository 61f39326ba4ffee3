//! notevault-core — end-to-end encrypted note vault with wallet-derived keys
//!
//! The encryption key is derived deterministically from a wallet signature
//! over a fixed message; notes are sealed with authenticated encryption and
//! stored either inline in the local index or at a content address in a
//! remote blob store.
//!
//! # Module layout
//! - `crypto`   — signature → key derivation, XChaCha20-Poly1305 sealing
//! - `note`     — note records, payload codec, storage locators
//! - `boundary` — traits for the wallet, biometric gate, persistence, blob store
//! - `store`    — hybrid inline/remote storage resolver + local note index
//! - `session`  — wallet connection and lock state machine
//! - `vault`    — the coordinator tying session, cipher, and storage together
//! - `signer`   — local Ed25519 software wallet
//! - `memory`   — in-memory collaborator implementations
//! - `fs`       — file-backed key-value store with atomic snapshot writes
//! - `error`    — crate-wide error type

pub mod boundary;
pub mod crypto;
pub mod error;
pub mod fs;
pub mod memory;
pub mod note;
pub mod session;
pub mod signer;
pub mod store;
pub mod vault;

pub use error::VaultError;
pub use note::{Locator, Note, SealedNote};
pub use session::{SessionState, WalletSession};
pub use vault::NoteVault;
