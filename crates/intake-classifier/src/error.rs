//! Classifier error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClassifierError {
    /// Warm-up has not finished yet
    #[error("classifier is still warming up")]
    NotReady,

    /// Warm-up failed or no model was configured
    #[error("classifier unavailable: {0}")]
    Unavailable(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("model error: {0}")]
    Model(String),
}

impl ClassifierError {
    /// True for the two "no usable model" states
    pub fn is_unloaded(&self) -> bool {
        matches!(self, Self::NotReady | Self::Unavailable(_))
    }
}

pub type ClassifierResult<T> = Result<T, ClassifierError>;
