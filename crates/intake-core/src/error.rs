use thiserror::Error;

/// Errors raised while generating keys or opening/sealing envelopes.
///
/// Messages never carry recovered key bytes or decrypted plaintext.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Invalid envelope: {0}")]
    Validation(String),

    #[error("Key decryption failed: {0}")]
    KeyDecryption(String),

    #[error("Data decryption failed: {0}")]
    DataDecryption(String),

    #[error("Key generation failed: {0}")]
    KeyGeneration(String),

    #[error("Encryption failed: {0}")]
    Encryption(String),

    #[error("Invalid public key: {0}")]
    InvalidPublicKey(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
