//! Ed25519 verification of inbound interaction requests.

use ring::signature::{UnparsedPublicKey, ED25519};
use thiserror::Error;
use warden_core::CoreError;

const PUBLIC_KEY_LEN: usize = 32;

/// Any verification failure. Deliberately carries no detail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("signature verification failed")]
pub struct AuthFailure;

/// Holds the application's decoded public key for the life of the process.
#[derive(Clone)]
pub struct SignatureVerifier {
    public_key: Vec<u8>,
}

impl SignatureVerifier {
    pub fn from_hex(public_key_hex: &str) -> Result<Self, CoreError> {
        let public_key = hex::decode(public_key_hex.trim())
            .map_err(|e| CoreError::Configuration(format!("public key is not valid hex: {e}")))?;
        if public_key.len() != PUBLIC_KEY_LEN {
            return Err(CoreError::Configuration(format!(
                "public key must be {PUBLIC_KEY_LEN} bytes, got {}",
                public_key.len()
            )));
        }
        Ok(Self { public_key })
    }

    /// Check `signature_hex` against the exact bytes `timestamp || raw_body`.
    pub fn verify(
        &self,
        signature_hex: &str,
        timestamp: &str,
        raw_body: &[u8],
    ) -> Result<(), AuthFailure> {
        let signature = hex::decode(signature_hex).map_err(|_| AuthFailure)?;

        let mut message = Vec::with_capacity(timestamp.len() + raw_body.len());
        message.extend_from_slice(timestamp.as_bytes());
        message.extend_from_slice(raw_body);

        UnparsedPublicKey::new(&ED25519, &self.public_key)
            .verify(&message, &signature)
            .map_err(|_| AuthFailure)
    }
}

/// One-shot verification with a hex public key.
pub fn verify(
    public_key_hex: &str,
    signature_hex: &str,
    timestamp: &str,
    raw_body: &[u8],
) -> Result<(), AuthFailure> {
    SignatureVerifier::from_hex(public_key_hex)
        .map_err(|_| AuthFailure)?
        .verify(signature_hex, timestamp, raw_body)
}
