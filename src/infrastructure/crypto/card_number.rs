//! Card number encryption at rest
//!
//! AES-256-GCM with a random 96-bit nonce per value. The 256-bit key is
//! derived once, at construction, from the configured password and salt
//! using Argon2id. Stored form: `base64(nonce || ciphertext || tag)`.
//!
//! Values that are not in that form (including legacy plaintext rows) are
//! rejected with [`CodecError`]; they are never passed through.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use rand::RngCore;

use crate::config::EncryptionConfig;
use crate::shared::CodecError;

const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;
const KEY_LEN: usize = 32;
const MIN_SALT_LEN: usize = 8;

/// Reversible transform between a plaintext card number and its stored form.
#[derive(Clone)]
pub struct CardNumberCodec {
    cipher: Aes256Gcm,
}

impl std::fmt::Debug for CardNumberCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CardNumberCodec").finish_non_exhaustive()
    }
}

impl CardNumberCodec {
    pub fn new(config: &EncryptionConfig) -> Result<Self, CodecError> {
        if config.password.is_empty() {
            return Err(CodecError::KeyUnavailable("password is empty".into()));
        }
        if config.salt.len() < MIN_SALT_LEN {
            return Err(CodecError::KeyUnavailable(format!(
                "salt must be at least {} bytes",
                MIN_SALT_LEN
            )));
        }

        let mut key = [0u8; KEY_LEN];
        argon2::Argon2::default()
            .hash_password_into(config.password.as_bytes(), config.salt.as_bytes(), &mut key)
            .map_err(|e| CodecError::KeyUnavailable(e.to_string()))?;

        let cipher = Aes256Gcm::new_from_slice(&key)
            .map_err(|e| CodecError::KeyUnavailable(e.to_string()))?;

        Ok(Self { cipher })
    }

    pub fn encode(&self, plaintext: &str) -> Result<String, CodecError> {
        let mut nonce_bytes = [0u8; NONCE_LEN];
        rand::thread_rng().fill_bytes(&mut nonce_bytes);

        let sealed = self
            .cipher
            .encrypt(Nonce::from_slice(&nonce_bytes), plaintext.as_bytes())
            .map_err(|_| CodecError::Encrypt)?;

        let mut out = Vec::with_capacity(NONCE_LEN + sealed.len());
        out.extend_from_slice(&nonce_bytes);
        out.extend_from_slice(&sealed);
        Ok(STANDARD.encode(out))
    }

    pub fn decode(&self, stored: &str) -> Result<String, CodecError> {
        let raw = STANDARD
            .decode(stored)
            .map_err(|_| CodecError::Malformed("not base64"))?;
        if raw.len() < NONCE_LEN + TAG_LEN {
            return Err(CodecError::Malformed("too short"));
        }

        let (nonce, sealed) = raw.split_at(NONCE_LEN);
        let plain = self
            .cipher
            .decrypt(Nonce::from_slice(nonce), sealed)
            .map_err(|_| CodecError::Decrypt)?;

        String::from_utf8(plain).map_err(|_| CodecError::Malformed("not utf-8"))
    }
}

/// Shared codec for tests; Argon2 runs once per test binary.
#[cfg(test)]
pub(crate) fn test_codec() -> CardNumberCodec {
    use std::sync::OnceLock;

    static CODEC: OnceLock<CardNumberCodec> = OnceLock::new();
    CODEC
        .get_or_init(|| {
            CardNumberCodec::new(&EncryptionConfig {
                password: "test-card-password".into(),
                salt: "test-card-salt".into(),
            })
            .expect("test codec")
        })
        .clone()
}
