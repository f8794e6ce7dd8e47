//! Deterministic classifier (for testing)

use crate::error::{ClassifierError, ClassifierResult};
use crate::traits::{Classifier, Features};

/// Returns the same outcome for every input
///
/// **WARNING**: Test double only. Not a model.
#[derive(Clone, Debug)]
pub struct FixedClassifier {
    outcome: Outcome,
}

#[derive(Clone, Debug)]
enum Outcome {
    Label(String),
    Fail(String),
}

impl FixedClassifier {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            outcome: Outcome::Label(label.into()),
        }
    }

    /// A classifier whose every prediction fails with `ClassifierError::Model`
    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            outcome: Outcome::Fail(reason.into()),
        }
    }
}

impl Classifier for FixedClassifier {
    fn name(&self) -> &'static str {
        "fixed"
    }

    fn predict(&self, _fields: &Features) -> ClassifierResult<String> {
        match &self.outcome {
            Outcome::Label(label) => Ok(label.clone()),
            Outcome::Fail(reason) => Err(ClassifierError::Model(reason.clone())),
        }
    }
}
