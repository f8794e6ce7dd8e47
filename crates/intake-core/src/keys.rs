//! Process-lifetime RSA keypair used to unwrap client session keys

use rand::rngs::OsRng;
use rsa::pkcs8::{EncodePublicKey, LineEnding};
use rsa::traits::PublicKeyParts;
use rsa::{Pkcs1v15Encrypt, RsaPrivateKey, RsaPublicKey};
use zeroize::Zeroizing;

use crate::error::{CoreError, CoreResult};

/// Modulus size used by the service (matches what clients are built for)
pub const DEFAULT_KEY_BITS: usize = 2048;

/// Smallest modulus we agree to generate
pub const MIN_KEY_BITS: usize = 1024;

/// Owns the asymmetric keypair for the lifetime of the process.
///
/// The keypair is generated once and never persisted or rotated. After
/// construction the manager is read-only, so a single instance can be shared
/// across request handlers behind an `Arc`.
pub struct KeyManager {
    private: RsaPrivateKey,
    public_pem: String,
}

impl KeyManager {
    /// Generate a fresh 2048-bit keypair
    pub fn generate() -> CoreResult<Self> {
        Self::generate_with_bits(DEFAULT_KEY_BITS)
    }

    /// Generate a keypair with an explicit modulus size
    pub fn generate_with_bits(bits: usize) -> CoreResult<Self> {
        if bits < MIN_KEY_BITS {
            return Err(CoreError::KeyGeneration(format!(
                "modulus of {bits} bits is below the {MIN_KEY_BITS}-bit minimum"
            )));
        }

        let private = RsaPrivateKey::new(&mut OsRng, bits)
            .map_err(|e| CoreError::KeyGeneration(e.to_string()))?;
        let public_pem = RsaPublicKey::from(&private)
            .to_public_key_pem(LineEnding::LF)
            .map_err(|e| CoreError::KeyGeneration(e.to_string()))?;

        Ok(Self {
            private,
            public_pem,
        })
    }

    /// PEM-encoded SubjectPublicKeyInfo, handed out to clients
    pub fn public_key_pem(&self) -> &str {
        &self.public_pem
    }

    /// Modulus size in bytes; every wrapped key must be exactly this long
    pub fn key_size(&self) -> usize {
        self.private.size()
    }

    /// Unwrap a PKCS#1 v1.5 ciphertext with the private key
    pub fn decrypt(&self, ciphertext: &[u8]) -> CoreResult<Zeroizing<Vec<u8>>> {
        if ciphertext.len() != self.key_size() {
            return Err(CoreError::KeyDecryption(format!(
                "wrapped key is {} bytes, expected {}",
                ciphertext.len(),
                self.key_size()
            )));
        }

        self.private
            .decrypt(Pkcs1v15Encrypt, ciphertext)
            .map(Zeroizing::new)
            .map_err(|_| CoreError::KeyDecryption("invalid PKCS#1 v1.5 padding".into()))
    }
}

impl std::fmt::Debug for KeyManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyManager")
            .field("bits", &(self.key_size() * 8))
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rsa::pkcs8::DecodePublicKey;

    #[test]
    fn test_public_key_is_spki_pem() {
        let keys = KeyManager::generate_with_bits(MIN_KEY_BITS).unwrap();
        let pem = keys.public_key_pem();

        assert!(pem.starts_with("-----BEGIN PUBLIC KEY-----"));
        assert!(RsaPublicKey::from_public_key_pem(pem).is_ok());
    }

    #[test]
    fn test_decrypt_roundtrip() {
        let keys = KeyManager::generate_with_bits(MIN_KEY_BITS).unwrap();
        let public = RsaPublicKey::from_public_key_pem(keys.public_key_pem()).unwrap();

        let ct = public
            .encrypt(&mut OsRng, Pkcs1v15Encrypt, b"session key")
            .unwrap();
        let pt = keys.decrypt(&ct).unwrap();

        assert_eq!(&pt[..], b"session key");
    }

    #[test]
    fn test_wrong_size_rejected() {
        let keys = KeyManager::generate_with_bits(MIN_KEY_BITS).unwrap();

        let result = keys.decrypt(&[0u8; 16]);
        assert!(matches!(result, Err(CoreError::KeyDecryption(_))));
    }

    #[test]
    fn test_garbage_rejected() {
        let keys = KeyManager::generate_with_bits(MIN_KEY_BITS).unwrap();

        let result = keys.decrypt(&vec![0x5Au8; keys.key_size()]);
        assert!(matches!(result, Err(CoreError::KeyDecryption(_))));
    }

    #[test]
    fn test_small_modulus_refused() {
        let result = KeyManager::generate_with_bits(512);
        assert!(matches!(result, Err(CoreError::KeyGeneration(_))));
    }
}
