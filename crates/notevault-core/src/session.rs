//! Wallet session and lock state machine.
//!
//! The session is the sole gate through which key derivation obtains a
//! signature. Lock keeps cached secrets so the same wallet can resume
//! without re-signing; disconnect destroys them.

use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use thiserror::Error;
use tracing::{debug, info};

use crate::boundary::{
    BiometricGate, KeyValueStore, PersistenceError, SigningCapability, SigningError,
};
use crate::crypto::KEY_DERIVATION_MESSAGE;

pub const CACHED_ADDRESS_KEY: &str = "notevault.cached_address";
pub const CACHED_SIGNATURE_KEY: &str = "notevault.cached_signature";
pub const BIOMETRIC_ENABLED_KEY: &str = "notevault.biometric_enabled";
pub const APP_LOCKED_KEY: &str = "notevault.app_locked";

pub const UNLOCK_PROMPT: &str = "Unlock your notes";

const FLAG_TRUE: &str = "true";

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Signing(#[from] SigningError),

    #[error("session is locked; unlock before requesting key material")]
    Locked,

    #[error("wallet not connected and no cached signature")]
    NotConnected,

    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Connected,
    Locked,
}

pub struct WalletSession {
    signer: Arc<dyn SigningCapability>,
    gate: Arc<dyn BiometricGate>,
    kv: Arc<dyn KeyValueStore>,
    address: Option<String>,
    cached_signature: Option<String>,
    locked: bool,
    biometric_enabled: bool,
    biometric_available: bool,
}

impl WalletSession {
    /// Rebuild the session from persisted state: biometric flags, the
    /// locked flag, and any cached wallet authorization.
    pub async fn restore(
        signer: Arc<dyn SigningCapability>,
        gate: Arc<dyn BiometricGate>,
        kv: Arc<dyn KeyValueStore>,
    ) -> Result<Self, SessionError> {
        let biometric_available = gate.is_available().await;
        let biometric_enabled = flag(&*kv, BIOMETRIC_ENABLED_KEY).await?;
        let locked = flag(&*kv, APP_LOCKED_KEY).await?;
        let address = kv.get(CACHED_ADDRESS_KEY).await?;
        // A cached signature without an address is meaningless; ignore it.
        let cached_signature = if address.is_some() {
            kv.get(CACHED_SIGNATURE_KEY).await?
        } else {
            None
        };
        if address.is_some() {
            debug!("cached wallet authorization found");
        }
        Ok(Self {
            signer,
            gate,
            kv,
            address,
            cached_signature,
            locked,
            biometric_enabled,
            biometric_available,
        })
    }

    pub fn state(&self) -> SessionState {
        if self.locked {
            SessionState::Locked
        } else if self.address.is_some() {
            SessionState::Connected
        } else {
            SessionState::Disconnected
        }
    }

    pub fn address(&self) -> Option<&str> {
        self.address.as_deref()
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn biometric_enabled(&self) -> bool {
        self.biometric_enabled
    }

    pub fn biometric_available(&self) -> bool {
        self.biometric_available
    }

    /// Establish a wallet session: obtain the address and, immediately, a
    /// signature over the key-derivation message, then persist both. On
    /// failure nothing is persisted and the state stays disconnected.
    pub async fn connect(&mut self) -> Result<(), SessionError> {
        let address = self.signer.address().await?;
        let signature = self.signer.sign(KEY_DERIVATION_MESSAGE).await?;
        let encoded = BASE64.encode(signature);

        self.kv.set(CACHED_ADDRESS_KEY, &address).await?;
        self.kv.set(CACHED_SIGNATURE_KEY, &encoded).await?;
        info!(%address, "wallet connected, encryption signature cached");
        self.address = Some(address);
        self.cached_signature = Some(encoded);
        Ok(())
    }

    /// Drop the live session but keep cached credentials so the same wallet
    /// can resume without re-signing. The persisted locked flag is only
    /// written when biometric gating is on.
    pub async fn lock(&mut self) -> Result<(), SessionError> {
        if self.biometric_enabled {
            self.kv.set(APP_LOCKED_KEY, FLAG_TRUE).await?;
        }
        self.locked = true;
        info!("session locked, cached credentials preserved");
        Ok(())
    }

    /// Biometric-gated unlock. A denied prompt is an expected, retryable
    /// outcome: it returns `false` and leaves the state unchanged.
    pub async fn unlock(&mut self) -> Result<bool, SessionError> {
        if self.biometric_enabled && !self.gate.authenticate(UNLOCK_PROMPT).await {
            debug!("unlock denied by biometric gate");
            return Ok(false);
        }
        self.kv.delete(APP_LOCKED_KEY).await?;
        self.locked = false;
        // Re-establish the session from the persisted cache when the live
        // one is gone.
        if self.address.is_none() {
            self.address = self.kv.get(CACHED_ADDRESS_KEY).await?;
            if self.address.is_some() {
                self.cached_signature = self.kv.get(CACHED_SIGNATURE_KEY).await?;
            }
        }
        info!("session unlocked");
        Ok(true)
    }

    /// Tear down the session AND purge cached credentials from persistence.
    /// The only transition with that purge obligation; safe to call when
    /// already disconnected.
    pub async fn disconnect(&mut self) -> Result<(), SessionError> {
        self.kv
            .delete_many(&[CACHED_ADDRESS_KEY, CACHED_SIGNATURE_KEY])
            .await?;
        self.address = None;
        self.cached_signature = None;
        info!("wallet disconnected, cached credentials purged");
        Ok(())
    }

    /// "Forget this device": disconnect plus clearing the locked flag.
    pub async fn delete_wallet(&mut self) -> Result<(), SessionError> {
        self.disconnect().await?;
        self.kv.delete(APP_LOCKED_KEY).await?;
        self.locked = false;
        info!("wallet data deleted");
        Ok(())
    }

    /// Enabling requires one successful authentication up front. A denied
    /// prompt returns `false` and leaves the flag unset.
    pub async fn enable_biometric(&mut self) -> Result<bool, SessionError> {
        if !self
            .gate
            .authenticate("Confirm to enable biometric unlock")
            .await
        {
            return Ok(false);
        }
        self.kv.set(BIOMETRIC_ENABLED_KEY, FLAG_TRUE).await?;
        self.biometric_enabled = true;
        Ok(true)
    }

    pub async fn disable_biometric(&mut self) -> Result<(), SessionError> {
        self.kv.delete(BIOMETRIC_ENABLED_KEY).await?;
        self.biometric_enabled = false;
        Ok(())
    }

    /// The signature feeding key derivation. Returns the cached value when
    /// present; otherwise requests a fresh signature from the wallet and
    /// caches it. That request is a suspending call that may prompt a
    /// human; dropping the future abandons it.
    ///
    /// Refuses while locked: reaching key derivation from a locked session
    /// is a caller bug, and the machine enforces that here rather than
    /// trusting every caller.
    pub async fn encryption_signature(&mut self) -> Result<String, SessionError> {
        if self.locked {
            return Err(SessionError::Locked);
        }
        if let Some(signature) = &self.cached_signature {
            return Ok(signature.clone());
        }
        if self.address.is_none() {
            return Err(SessionError::NotConnected);
        }
        debug!("no cached signature, requesting one from the wallet");
        let signature = self.signer.sign(KEY_DERIVATION_MESSAGE).await?;
        let encoded = BASE64.encode(signature);
        self.kv.set(CACHED_SIGNATURE_KEY, &encoded).await?;
        self.cached_signature = Some(encoded.clone());
        Ok(encoded)
    }

    /// Drop the cached signature so the next request re-signs.
    pub async fn clear_cached_signature(&mut self) -> Result<(), SessionError> {
        self.kv.delete(CACHED_SIGNATURE_KEY).await?;
        self.cached_signature = None;
        Ok(())
    }
}

async fn flag(kv: &dyn KeyValueStore, key: &str) -> Result<bool, PersistenceError> {
    Ok(kv.get(key).await?.as_deref() == Some(FLAG_TRUE))
}
