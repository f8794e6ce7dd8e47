//! intake-classifier: applicant level prediction
//!
//! A [`Classifier`] maps a record's fields to a level label. The server only
//! talks to a [`ClassifierHandle`], which loads the real model on the
//! blocking pool and reports `NotReady` until it is done, so slow model
//! loading never delays startup or request handling.
//!
//! ## Models
//!
//! | Model             | Use Case                                    |
//! |-------------------|---------------------------------------------|
//! | `CentroidModel`   | Nearest class centroid over scaled features |
//! | `FixedClassifier` | Tests                                       |
//!
//! ## Example
//!
//! ```rust,ignore
//! use intake_classifier::{CentroidModel, Classifier, ClassifierHandle};
//!
//! let handle = ClassifierHandle::new();
//! handle.warm_up(|| {
//!     let model = CentroidModel::from_file("training.json")?;
//!     Ok(Box::new(model) as Box<dyn Classifier>)
//! });
//! ```

mod error;
mod traits;

mod centroid;
mod fixed;
mod readiness;

// Re-exports
pub use error::{ClassifierError, ClassifierResult};
pub use traits::{Classifier, Features};

pub use centroid::{CentroidModel, EDUCATION_FIELD, EXPERIENCE_FIELD, LABEL_FIELD, STUDY_FIELD};
pub use fixed::FixedClassifier;
pub use readiness::{ClassifierHandle, Readiness};
