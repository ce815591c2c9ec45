//! Kalshi REST request signing.
//!
//! Kalshi authenticates every private request with RSA-PSS (SHA-256) signed headers. The
//! signature is computed over: `{timestamp}{METHOD}{path}`, where `path` is the full URL path
//! without the query string (eg/ `/trade-api/v2/portfolio/orders`).
//!
//! Headers required:
//! - `KALSHI-ACCESS-KEY`: API key ID
//! - `KALSHI-ACCESS-SIGNATURE`: Base64-encoded RSA-PSS signature
//! - `KALSHI-ACCESS-TIMESTAMP`: Unix timestamp in milliseconds

use crate::error::TransportError;
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use rsa::{
    RsaPrivateKey,
    pkcs1::DecodeRsaPrivateKey,
    pkcs8::DecodePrivateKey,
    pss::SigningKey,
    signature::{RandomizedSigner, SignatureEncoding},
};
use sha2::Sha256;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Errors that can occur while loading credentials.
#[derive(Debug, Error)]
pub enum KalshiAuthError {
    #[error("Failed to read private key file: {0}")]
    KeyFileRead(#[from] std::io::Error),

    #[error("Failed to parse RSA private key: {0}")]
    KeyParse(String),
}

impl From<KalshiAuthError> for TransportError {
    fn from(error: KalshiAuthError) -> Self {
        TransportError::Auth(error.to_string())
    }
}

/// Kalshi API key ID and the RSA private key used to sign requests.
#[derive(Clone)]
pub struct KalshiCredentials {
    pub api_key: String,
    private_key: RsaPrivateKey,
}

impl std::fmt::Debug for KalshiCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KalshiCredentials")
            .field("api_key", &self.api_key)
            .field("private_key", &"[REDACTED]")
            .finish()
    }
}

impl KalshiCredentials {
    /// Create credentials from an API key and a PKCS#8 or PKCS#1 PEM private key.
    pub fn from_pem(api_key: impl Into<String>, pem: &str) -> Result<Self, KalshiAuthError> {
        let private_key = RsaPrivateKey::from_pkcs8_pem(pem)
            .or_else(|_| RsaPrivateKey::from_pkcs1_pem(pem))
            .map_err(|e| KalshiAuthError::KeyParse(e.to_string()))?;

        Ok(Self {
            api_key: api_key.into(),
            private_key,
        })
    }

    /// Create credentials from an API key and a PEM file on disk.
    pub fn from_file(
        api_key: impl Into<String>,
        key_path: impl AsRef<Path>,
    ) -> Result<Self, KalshiAuthError> {
        let pem = std::fs::read_to_string(key_path.as_ref())?;
        Self::from_pem(api_key, &pem)
    }

    /// Sign a request at the provided unix millisecond timestamp.
    pub fn sign(&self, method: &str, path: &str, timestamp_ms: i64) -> KalshiAuthHeaders {
        let message = format!("{timestamp_ms}{method}{path}");
        debug!(%method, %path, "Signing Kalshi request");

        let signing_key = SigningKey::<Sha256>::new(self.private_key.clone());
        let mut rng = rsa::rand_core::OsRng;
        let signature = signing_key.sign_with_rng(&mut rng, message.as_bytes());

        KalshiAuthHeaders {
            api_key: self.api_key.clone(),
            signature: BASE64.encode(signature.to_bytes()),
            timestamp: timestamp_ms.to_string(),
        }
    }
}

/// Authentication headers of a single signed request.
#[derive(Debug, Clone)]
pub struct KalshiAuthHeaders {
    pub api_key: String,
    pub signature: String,
    pub timestamp: String,
}

impl KalshiAuthHeaders {
    pub const KEY_HEADER: &'static str = "KALSHI-ACCESS-KEY";
    pub const SIGNATURE_HEADER: &'static str = "KALSHI-ACCESS-SIGNATURE";
    pub const TIMESTAMP_HEADER: &'static str = "KALSHI-ACCESS-TIMESTAMP";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_pem_rejects_garbage() {
        let error = KalshiCredentials::from_pem("key-id", "not a pem").unwrap_err();
        assert!(matches!(error, KalshiAuthError::KeyParse(_)));
        assert!(matches!(TransportError::from(error), TransportError::Auth(_)));
    }

    #[test]
    fn test_from_file_missing_path() {
        let error =
            KalshiCredentials::from_file("key-id", "/definitely/not/a/kalshi/key.pem").unwrap_err();
        assert!(matches!(error, KalshiAuthError::KeyFileRead(_)));
    }
}
