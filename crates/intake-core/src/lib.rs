//! # intake-core: envelope cryptography for encrypted submissions
//!
//! Clients fetch the service's RSA public key, encrypt a JSON record with a
//! fresh AES-256-GCM key, wrap that key with RSA PKCS#1 v1.5 and post the
//! resulting [`Envelope`]. This crate owns both halves of that protocol.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use intake_core::{HybridCipher, KeyManager, seal};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let keys = Arc::new(KeyManager::generate()?);
//! let cipher = HybridCipher::new(keys.clone());
//!
//! // Client side
//! let envelope = seal(keys.public_key_pem(), br#"{"Nombre": "Ana"}"#)?;
//!
//! // Server side
//! let fields = cipher.open(&envelope)?;
//! assert_eq!(fields["Nombre"], "Ana");
//! # Ok(())
//! # }
//! ```
//!
//! Decryption fails closed: a bad wrapped key is a
//! [`CoreError::KeyDecryption`], anything wrong with the nonce, payload or
//! tag, or a plaintext that is not a JSON object, is a
//! [`CoreError::DataDecryption`].

pub mod error;
pub mod hybrid;
pub mod keys;

pub use error::{CoreError, CoreResult};
pub use hybrid::{Envelope, HybridCipher, KEY_LEN, NONCE_LEN, TAG_LEN, open_payload, seal};
pub use keys::{DEFAULT_KEY_BITS, KeyManager, MIN_KEY_BITS};
