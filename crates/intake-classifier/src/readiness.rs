//! Readiness gate around a classifier that loads in the background

use std::sync::Arc;
use std::time::Instant;

use parking_lot::RwLock;
use serde::Serialize;
use tokio::task::JoinHandle;

use crate::error::{ClassifierError, ClassifierResult};
use crate::traits::{Classifier, Features};

/// Observable warm-up state
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Readiness {
    WarmingUp,
    Ready,
    Failed,
}

impl Readiness {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WarmingUp => "warming_up",
            Self::Ready => "ready",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for Readiness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

enum State {
    WarmingUp,
    Ready(Arc<dyn Classifier>),
    Failed(String),
}

/// Shared, cloneable handle that answers predictions once a model is loaded
///
/// Starts in `WarmingUp`. Predictions made before the model is ready fail
/// with `NotReady`; after a failed load they fail with `Unavailable`.
/// Request handlers never wait on the load.
#[derive(Clone)]
pub struct ClassifierHandle {
    state: Arc<RwLock<State>>,
}

impl Default for ClassifierHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl ClassifierHandle {
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(State::WarmingUp)),
        }
    }

    /// A handle that is ready from the start
    pub fn ready(classifier: impl Classifier + 'static) -> Self {
        Self {
            state: Arc::new(RwLock::new(State::Ready(Arc::new(classifier)))),
        }
    }

    /// A handle that will never become ready
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            state: Arc::new(RwLock::new(State::Failed(reason.into()))),
        }
    }

    pub fn status(&self) -> Readiness {
        match &*self.state.read() {
            State::WarmingUp => Readiness::WarmingUp,
            State::Ready(_) => Readiness::Ready,
            State::Failed(_) => Readiness::Failed,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.status() == Readiness::Ready
    }

    /// The loaded classifier, or why there is none
    pub fn classifier(&self) -> ClassifierResult<Arc<dyn Classifier>> {
        match &*self.state.read() {
            State::WarmingUp => Err(ClassifierError::NotReady),
            State::Ready(classifier) => Ok(classifier.clone()),
            State::Failed(reason) => Err(ClassifierError::Unavailable(reason.clone())),
        }
    }

    /// Run `loader` on the blocking pool and publish its outcome
    ///
    /// Returns immediately; the handle reports `WarmingUp` until the loader
    /// finishes. Must be called from within a tokio runtime.
    pub fn warm_up<F>(&self, loader: F) -> JoinHandle<()>
    where
        F: FnOnce() -> ClassifierResult<Box<dyn Classifier>> + Send + 'static,
    {
        *self.state.write() = State::WarmingUp;
        let state = self.state.clone();

        tokio::spawn(async move {
            tracing::info!("classifier warm-up started");
            let started = Instant::now();

            let outcome = match tokio::task::spawn_blocking(loader).await {
                Ok(result) => result,
                Err(e) => Err(ClassifierError::Model(format!("loader task failed: {e}"))),
            };
            let elapsed_ms = started.elapsed().as_millis() as u64;

            let next = match outcome {
                Ok(classifier) => {
                    tracing::info!(model = classifier.name(), elapsed_ms, "classifier ready");
                    State::Ready(Arc::from(classifier))
                }
                Err(e) => {
                    tracing::error!(error = %e, elapsed_ms, "classifier warm-up failed");
                    State::Failed(e.to_string())
                }
            };
            *state.write() = next;
        })
    }
}

impl Classifier for ClassifierHandle {
    fn name(&self) -> &'static str {
        match &*self.state.read() {
            State::Ready(classifier) => classifier.name(),
            _ => "unloaded",
        }
    }

    fn predict(&self, fields: &Features) -> ClassifierResult<String> {
        self.classifier()?.predict(fields)
    }
}
