use std::sync::Arc;

use intake_classifier::{CentroidModel, Classifier, ClassifierHandle};
use intake_core::{HybridCipher, KeyManager};
use intake_storage::{InMemoryRecordStore, JsonFileRecordStore, RecordStore};

use crate::config::Config;
use crate::registration::RegistrationService;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Per-process key pair; the public half is served to clients
    pub keys: Arc<KeyManager>,
    pub registration: RegistrationService,
    pub config: Arc<Config>,
}

impl AppState {
    /// Generate the key pair, open the record store and start classifier warm-up
    pub async fn new(config: &Config) -> anyhow::Result<Self> {
        let bits = config.key_bits;
        let started = std::time::Instant::now();
        let keys = tokio::task::spawn_blocking(move || KeyManager::generate_with_bits(bits))
            .await??;
        tracing::info!("Generated {}-bit RSA key pair in {:?}", bits, started.elapsed());

        let records: Arc<dyn RecordStore> = match config.storage.backend.as_str() {
            "local" => Arc::new(JsonFileRecordStore::open(&config.storage.path).await?),
            "memory" => {
                tracing::warn!("Using in-memory record store - records are lost on restart");
                Arc::new(InMemoryRecordStore::new())
            }
            other => {
                anyhow::bail!(
                    "Unknown storage backend '{}'. Valid options: 'local', 'memory'",
                    other
                );
            }
        };

        let classifier = match &config.classifier.training_data {
            Some(path) => {
                let handle = ClassifierHandle::new();
                let path = path.clone();
                handle.warm_up(move || {
                    let model = CentroidModel::from_file(path)?;
                    Ok(Box::new(model) as Box<dyn Classifier>)
                });
                handle
            }
            None => {
                tracing::warn!("No classifier training data configured; records get sentinel labels");
                ClassifierHandle::unavailable("no training data configured")
            }
        };

        Ok(Self::with_parts(config, Arc::new(keys), records, classifier))
    }

    /// Assemble state from already-built parts
    pub fn with_parts(
        config: &Config,
        keys: Arc<KeyManager>,
        records: Arc<dyn RecordStore>,
        classifier: ClassifierHandle,
    ) -> Self {
        let cipher = HybridCipher::new(keys.clone());
        Self {
            keys,
            registration: RegistrationService::new(cipher, records, classifier),
            config: Arc::new(config.clone()),
        }
    }
}
