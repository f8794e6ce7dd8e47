//! Hybrid decryption: RSA PKCS#1 v1.5 key wrapping + AES-256-GCM payload
//!
//! Wire format of the `data` field: `[ciphertext][16-byte tag]`. The tag is
//! always the fixed-length suffix; clients must append exactly 16 bytes.

mod envelope;

pub use envelope::{Envelope, seal};

use std::sync::Arc;

use aes_gcm::aead::{AeadInPlace, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce, Tag};
use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use serde_json::{Map, Value};
use zeroize::Zeroizing;

use crate::error::{CoreError, CoreResult};
use crate::keys::KeyManager;

/// AES-256 key length in bytes
pub const KEY_LEN: usize = 32;
/// AES-GCM nonce length accepted by the service
pub const NONCE_LEN: usize = 12;
/// AES-GCM authentication tag length
pub const TAG_LEN: usize = 16;

/// Recovers plaintext records from encrypted envelopes
#[derive(Clone, Debug)]
pub struct HybridCipher {
    keys: Arc<KeyManager>,
}

impl HybridCipher {
    pub fn new(keys: Arc<KeyManager>) -> Self {
        Self { keys }
    }

    /// Decrypt, verify and parse an envelope into a JSON object
    pub fn open(&self, envelope: &Envelope) -> CoreResult<Map<String, Value>> {
        envelope.validate()?;

        let sym_key = self.recover_key(&envelope.key)?;

        let nonce = BASE64
            .decode(envelope.iv.trim())
            .map_err(|_| CoreError::DataDecryption("nonce is not valid base64".into()))?;
        let payload = BASE64
            .decode(envelope.data.trim())
            .map_err(|_| CoreError::DataDecryption("payload is not valid base64".into()))?;

        let plaintext = open_payload(&sym_key, &nonce, &payload)?;
        parse_object(&plaintext)
    }

    /// Unwrap the double-encoded symmetric key
    fn recover_key(&self, wrapped_b64: &str) -> CoreResult<Zeroizing<Vec<u8>>> {
        let wrapped = BASE64
            .decode(wrapped_b64.trim())
            .map_err(|_| CoreError::KeyDecryption("wrapped key is not valid base64".into()))?;

        // The RSA plaintext is itself the base64 text of the raw key
        let key_text = self.keys.decrypt(&wrapped)?;
        let sym_key = BASE64
            .decode(key_text.as_slice())
            .map(Zeroizing::new)
            .map_err(|_| CoreError::KeyDecryption("unwrapped key is not valid base64".into()))?;

        if sym_key.len() != KEY_LEN {
            return Err(CoreError::KeyDecryption(format!(
                "unwrapped key is {} bytes, expected {KEY_LEN}",
                sym_key.len()
            )));
        }
        Ok(sym_key)
    }
}

/// Verify and decrypt `payload` (ciphertext ‖ tag) with a raw AES-256 key.
///
/// Returns the plaintext only when the tag verifies.
pub fn open_payload(key: &[u8], nonce: &[u8], payload: &[u8]) -> CoreResult<Zeroizing<Vec<u8>>> {
    if nonce.len() != NONCE_LEN {
        return Err(CoreError::DataDecryption(format!(
            "nonce is {} bytes, expected {NONCE_LEN}",
            nonce.len()
        )));
    }
    if payload.len() < TAG_LEN {
        return Err(CoreError::DataDecryption(format!(
            "payload is {} bytes, shorter than the {TAG_LEN}-byte tag",
            payload.len()
        )));
    }

    let cipher = Aes256Gcm::new_from_slice(key)
        .map_err(|_| CoreError::DataDecryption(format!("key must be {KEY_LEN} bytes")))?;

    let (ciphertext, tag) = payload.split_at(payload.len() - TAG_LEN);
    let mut buffer = Zeroizing::new(ciphertext.to_vec());
    cipher
        .decrypt_in_place_detached(
            Nonce::from_slice(nonce),
            b"",
            buffer.as_mut_slice(),
            Tag::from_slice(tag),
        )
        .map_err(|_| CoreError::DataDecryption("authentication tag mismatch".into()))?;

    Ok(buffer)
}

fn parse_object(plaintext: &[u8]) -> CoreResult<Map<String, Value>> {
    // serde_json messages can quote the offending input; report position only
    serde_json::from_slice(plaintext).map_err(|e| {
        CoreError::DataDecryption(format!(
            "plaintext is not a JSON object ({:?} error at line {} column {})",
            e.classify(),
            e.line(),
            e.column()
        ))
    })
}
