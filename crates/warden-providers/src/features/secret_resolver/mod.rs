use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng, Payload};
use aes_gcm::{Aes256Gcm, Nonce};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use warden_core::{CoreError, Result, SecretResolver};

const CAPABILITY: &str = "secrets";
const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;

/// AES-256-GCM secret resolver.
///
/// Ciphertexts are base64 of `nonce || ciphertext || tag`. The execution context
/// is bound as associated data, so a secret sealed for one worker will not open
/// under another context.
pub struct AesGcmSecretResolver {
    cipher: Aes256Gcm,
}

impl AesGcmSecretResolver {
    pub fn new(key: &[u8]) -> Result<Self> {
        let cipher = Aes256Gcm::new_from_slice(key).map_err(|_| {
            CoreError::Configuration(format!(
                "secret key must be 32 bytes, got {}",
                key.len()
            ))
        })?;
        Ok(Self { cipher })
    }

    pub fn from_base64_key(encoded: &str) -> Result<Self> {
        let key = STANDARD
            .decode(encoded.trim())
            .map_err(|e| CoreError::Configuration(format!("secret key is not valid base64: {e}")))?;
        Self::new(&key)
    }

    /// Encrypt `plaintext` for `context`, producing the stored ciphertext form.
    pub fn seal(&self, plaintext: &str, context: &str) -> Result<String> {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let sealed = self
            .cipher
            .encrypt(
                &nonce,
                Payload {
                    msg: plaintext.as_bytes(),
                    aad: context.as_bytes(),
                },
            )
            .map_err(|_| CoreError::external(CAPABILITY, "encrypt", "cipher failure"))?;

        let mut out = Vec::with_capacity(NONCE_LEN + sealed.len());
        out.extend_from_slice(&nonce);
        out.extend_from_slice(&sealed);
        Ok(STANDARD.encode(out))
    }

    fn open(&self, ciphertext: &str, context: &str) -> Result<String> {
        let raw = STANDARD
            .decode(ciphertext.trim())
            .map_err(|e| CoreError::external(CAPABILITY, "decrypt", format!("invalid base64: {e}")))?;
        if raw.len() < NONCE_LEN + TAG_LEN {
            return Err(CoreError::external(
                CAPABILITY,
                "decrypt",
                "ciphertext too short",
            ));
        }

        let (nonce, sealed) = raw.split_at(NONCE_LEN);
        let plaintext = self
            .cipher
            .decrypt(
                Nonce::from_slice(nonce),
                Payload {
                    msg: sealed,
                    aad: context.as_bytes(),
                },
            )
            .map_err(|_| {
                CoreError::external(
                    CAPABILITY,
                    "decrypt",
                    format!("authentication failed for context '{context}'"),
                )
            })?;

        String::from_utf8(plaintext)
            .map_err(|e| CoreError::external(CAPABILITY, "decrypt", e))
    }
}

#[async_trait]
impl SecretResolver for AesGcmSecretResolver {
    async fn decrypt(&self, ciphertext: &str, context: &str) -> Result<String> {
        self.open(ciphertext, context)
    }
}
