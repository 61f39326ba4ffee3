//! Local software signer: an on-device Ed25519 keypair standing in for an
//! external wallet. Generated on first use and persisted through the
//! key-value store; signing never prompts.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use ed25519_dalek::{Signer as _, SigningKey};
use rand::rngs::OsRng;
use tracing::info;

use crate::boundary::{KeyValueStore, SigningCapability, SigningError};

pub const SIGNER_SECRET_KEY: &str = "notevault.signer_secret";

pub struct LocalSigner {
    keypair: SigningKey,
}

impl LocalSigner {
    /// Load the stored keypair or generate and persist a fresh one.
    pub async fn load_or_generate(kv: &dyn KeyValueStore) -> Result<Self, SigningError> {
        if let Some(encoded) = kv
            .get(SIGNER_SECRET_KEY)
            .await
            .map_err(|e| SigningError(e.to_string()))?
        {
            let bytes = BASE64
                .decode(encoded)
                .map_err(|e| SigningError(format!("stored signer key corrupt: {e}")))?;
            let secret: [u8; 32] = bytes
                .try_into()
                .map_err(|_| SigningError("stored signer key has wrong length".into()))?;
            return Ok(Self {
                keypair: SigningKey::from_bytes(&secret),
            });
        }

        let keypair = SigningKey::generate(&mut OsRng);
        let encoded = BASE64.encode(keypair.to_bytes());
        kv.set(SIGNER_SECRET_KEY, &encoded)
            .await
            .map_err(|e| SigningError(e.to_string()))?;
        info!("generated new local signing key");
        Ok(Self { keypair })
    }

    /// Remove the persisted secret. The next load generates a new wallet
    /// with a different address.
    pub async fn forget(kv: &dyn KeyValueStore) -> Result<(), SigningError> {
        kv.delete(SIGNER_SECRET_KEY)
            .await
            .map_err(|e| SigningError(e.to_string()))
    }
}

#[async_trait]
impl SigningCapability for LocalSigner {
    async fn address(&self) -> Result<String, SigningError> {
        Ok(hex::encode(self.keypair.verifying_key().to_bytes()))
    }

    async fn sign(&self, message: &[u8]) -> Result<Vec<u8>, SigningError> {
        Ok(self.keypair.sign(message).to_bytes().to_vec())
    }
}
