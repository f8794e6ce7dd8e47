//! Wire envelope and the client half of the protocol

use aes_gcm::aead::{AeadInPlace, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use rand::{RngCore, rngs::OsRng};
use rsa::pkcs8::DecodePublicKey;
use rsa::{Pkcs1v15Encrypt, RsaPublicKey};
use serde::{Deserialize, Deserializer, Serialize};
use zeroize::Zeroizing;

use super::{KEY_LEN, NONCE_LEN};
use crate::error::{CoreError, CoreResult};

/// Encrypted submission as it arrives over the wire.
///
/// All three fields are standard base64. A missing or `null` field
/// deserializes to an empty string and is rejected by [`Envelope::validate`].
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Envelope {
    /// RSA-wrapped base64 text of the AES key
    #[serde(default, deserialize_with = "null_as_empty")]
    pub key: String,
    /// AES-GCM nonce
    #[serde(default, deserialize_with = "null_as_empty")]
    pub iv: String,
    /// Ciphertext with the 16-byte tag appended
    #[serde(default, deserialize_with = "null_as_empty")]
    pub data: String,
}

fn null_as_empty<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Option::<String>::deserialize(d).map(Option::unwrap_or_default)
}

impl Envelope {
    /// Reject envelopes with a missing or empty field
    pub fn validate(&self) -> CoreResult<()> {
        for (name, value) in [("key", &self.key), ("iv", &self.iv), ("data", &self.data)] {
            if value.trim().is_empty() {
                return Err(CoreError::Validation(format!("missing field `{name}`")));
            }
        }
        Ok(())
    }
}

/// Encrypt `plaintext` for the holder of `public_key_pem`.
///
/// Mirrors what the browser client does: a random 256-bit key is base64
/// encoded and that text is what gets RSA-wrapped; the payload is
/// AES-256-GCM ciphertext followed by the 16-byte tag.
pub fn seal(public_key_pem: &str, plaintext: &[u8]) -> CoreResult<Envelope> {
    let public = RsaPublicKey::from_public_key_pem(public_key_pem)
        .map_err(|e| CoreError::InvalidPublicKey(e.to_string()))?;

    let mut sym_key = Zeroizing::new([0u8; KEY_LEN]);
    let mut nonce = [0u8; NONCE_LEN];
    OsRng.fill_bytes(sym_key.as_mut());
    OsRng.fill_bytes(&mut nonce);

    let cipher = Aes256Gcm::new_from_slice(sym_key.as_ref())
        .map_err(|e| CoreError::Encryption(e.to_string()))?;
    let mut payload = plaintext.to_vec();
    let tag = cipher
        .encrypt_in_place_detached(Nonce::from_slice(&nonce), b"", &mut payload)
        .map_err(|e| CoreError::Encryption(e.to_string()))?;
    payload.extend_from_slice(&tag);

    let key_text = Zeroizing::new(BASE64.encode(sym_key.as_ref()));
    let wrapped = public
        .encrypt(&mut OsRng, Pkcs1v15Encrypt, key_text.as_bytes())
        .map_err(|e| CoreError::Encryption(e.to_string()))?;

    Ok(Envelope {
        key: BASE64.encode(wrapped),
        iv: BASE64.encode(nonce),
        data: BASE64.encode(payload),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_deserialize_empty() {
        let env: Envelope = serde_json::from_str(r#"{"key": "abc", "iv": null}"#).unwrap();

        assert_eq!(env.key, "abc");
        assert!(env.iv.is_empty());
        assert!(env.data.is_empty());
        assert!(matches!(env.validate(), Err(CoreError::Validation(_))));
    }

    #[test]
    fn test_complete_envelope_validates() {
        let env = Envelope {
            key: "a".into(),
            iv: "b".into(),
            data: "c".into(),
        };
        assert!(env.validate().is_ok());
    }

    #[test]
    fn test_seal_rejects_bad_pem() {
        let result = seal("not a key", b"{}");
        assert!(matches!(result, Err(CoreError::InvalidPublicKey(_))));
    }
}
