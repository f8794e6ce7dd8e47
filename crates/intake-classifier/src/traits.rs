//! Classifier trait

use serde_json::{Map, Value};

use crate::error::ClassifierResult;

/// Record fields as handed to a classifier
pub type Features = Map<String, Value>;

/// Maps a record's fields to a level label
///
/// Implementations are synchronous and CPU-bound; `predict` must not block
/// on I/O.
pub trait Classifier: Send + Sync {
    /// Short identifier used in logs and health output
    fn name(&self) -> &'static str;

    fn predict(&self, fields: &Features) -> ClassifierResult<String>;
}
