//! HTTP client for the content-addressed blob store.
//!
//! Uploads go to the store's API with a bearer credential and return a
//! content address; fetches go through the public gateway.

use async_trait::async_trait;
use notevault_core::boundary::{BlobError, BlobStore};
use serde::Deserialize;

pub const DEFAULT_API_ENDPOINT: &str = "https://api.web3.storage";
pub const DEFAULT_GATEWAY: &str = "https://w3s.link/ipfs";

pub struct HttpBlobStore {
    client: reqwest::Client,
    api_endpoint: String,
    gateway: String,
}

#[derive(Deserialize)]
struct UploadResponse {
    cid: String,
}

impl HttpBlobStore {
    pub fn new(api_endpoint: impl Into<String>, gateway: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_endpoint: api_endpoint.into(),
            gateway: gateway.into(),
        }
    }
}

impl Default for HttpBlobStore {
    fn default() -> Self {
        Self::new(DEFAULT_API_ENDPOINT, DEFAULT_GATEWAY)
    }
}

#[async_trait]
impl BlobStore for HttpBlobStore {
    async fn put(&self, bytes: &[u8], credential: &str) -> Result<String, BlobError> {
        let response = self
            .client
            .post(format!("{}/upload", self.api_endpoint))
            .bearer_auth(credential)
            .body(bytes.to_vec())
            .send()
            .await
            .map_err(|e| BlobError(e.to_string()))?;
        if !response.status().is_success() {
            return Err(BlobError(format!("upload failed: {}", response.status())));
        }
        let parsed: UploadResponse = response
            .json()
            .await
            .map_err(|e| BlobError(e.to_string()))?;
        Ok(parsed.cid)
    }

    async fn get(&self, address: &str) -> Result<Vec<u8>, BlobError> {
        let response = self
            .client
            .get(format!("{}/{address}", self.gateway))
            .send()
            .await
            .map_err(|e| BlobError(e.to_string()))?;
        if !response.status().is_success() {
            return Err(BlobError(format!(
                "fetch failed for {address}: {}",
                response.status()
            )));
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| BlobError(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}
