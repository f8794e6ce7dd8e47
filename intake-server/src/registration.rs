//! Registration pipeline: envelope in, labelled record out
//!
//! Each registration is decrypted, verified and parsed before anything is
//! written, and ends in exactly one store write. Classification never fails
//! a registration: an unloaded model stores [`UNLOADED_LABEL`] and any other
//! classifier failure stores [`FAILED_LABEL`]. Both can be corrected later
//! with [`RegistrationService::recompute_all`].

use std::sync::Arc;

use intake_classifier::{Classifier, ClassifierHandle, Features};
use intake_core::{Envelope, HybridCipher};
use intake_storage::{PREDICTION_FIELD, Record, RecordStore};
use serde_json::Value;

use crate::error::{MODEL_NOT_LOADED, ServerResult};

/// Label stored when no model is loaded
pub const UNLOADED_LABEL: &str = MODEL_NOT_LOADED;
/// Label stored when the model failed on a record
pub const FAILED_LABEL: &str = "Error";

#[derive(Clone)]
pub struct RegistrationService {
    cipher: HybridCipher,
    records: Arc<dyn RecordStore>,
    classifier: ClassifierHandle,
}

impl RegistrationService {
    pub fn new(
        cipher: HybridCipher,
        records: Arc<dyn RecordStore>,
        classifier: ClassifierHandle,
    ) -> Self {
        Self {
            cipher,
            records,
            classifier,
        }
    }

    pub fn records(&self) -> &Arc<dyn RecordStore> {
        &self.records
    }

    pub fn classifier(&self) -> &ClassifierHandle {
        &self.classifier
    }

    /// Decrypt an envelope and store the record it carries
    pub async fn register(&self, envelope: &Envelope) -> ServerResult<Record> {
        tracing::debug!("registration: envelope received");

        let fields = self.cipher.open(envelope)?;
        tracing::debug!(fields = fields.len(), "registration: payload verified and parsed");

        let label = label_for(&self.classifier, &fields);

        let mut fields = fields;
        fields.insert(PREDICTION_FIELD.to_string(), Value::String(label));
        let record = self.records.create(fields).await?;

        tracing::debug!(
            id = record.id,
            label = record.label().unwrap_or_default(),
            "registration: record stored"
        );
        Ok(record)
    }

    /// Relabel every stored record in a single store write
    ///
    /// Fails with `NotReady` and writes nothing if no model is loaded.
    /// Predictions run inside the store write, so each label is computed
    /// from the record as it is when the label is stored. Returns the number
    /// of records relabelled and the resulting snapshot.
    pub async fn recompute_all(&self) -> ServerResult<(usize, Vec<Record>)> {
        let classifier = self.classifier.classifier()?;

        let label = move |record: &Record| {
            let label = match classifier.predict(&record.fields) {
                Ok(label) => label,
                Err(e) => {
                    tracing::warn!(id = record.id, error = %e, "prediction failed");
                    FAILED_LABEL.to_string()
                }
            };
            Value::String(label)
        };
        let (count, records) = self.records.relabel(PREDICTION_FIELD, &label).await?;

        tracing::info!(count, "recomputed predictions");
        Ok((count, records))
    }
}

/// Label a freshly decrypted record, falling back to a sentinel
fn label_for(classifier: &ClassifierHandle, fields: &Features) -> String {
    match classifier.predict(fields) {
        Ok(label) => {
            tracing::debug!(label = %label, "registration: labeled");
            label
        }
        Err(e) if e.is_unloaded() => {
            tracing::debug!("registration: label failed, model not loaded");
            UNLOADED_LABEL.to_string()
        }
        Err(e) => {
            tracing::warn!(error = %e, "registration: label failed");
            FAILED_LABEL.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::OnceLock;
    use std::time::Duration;

    use crate::error::ServerError;

    use intake_classifier::FixedClassifier;
    use intake_core::{KeyManager, seal};
    use intake_storage::InMemoryRecordStore;
    use serde_json::json;

    fn keys() -> Arc<KeyManager> {
        static KEYS: OnceLock<Arc<KeyManager>> = OnceLock::new();
        KEYS.get_or_init(|| Arc::new(KeyManager::generate_with_bits(1024).unwrap()))
            .clone()
    }

    fn build(classifier: ClassifierHandle) -> (RegistrationService, Arc<InMemoryRecordStore>) {
        let store = Arc::new(InMemoryRecordStore::new());
        let service = RegistrationService::new(HybridCipher::new(keys()), store.clone(), classifier);
        (service, store)
    }

    fn envelope(value: serde_json::Value) -> Envelope {
        seal(keys().public_key_pem(), value.to_string().as_bytes()).unwrap()
    }

    #[tokio::test]
    async fn test_register_labels_record() {
        let (service, store) = build(ClassifierHandle::ready(FixedClassifier::new("Senior")));

        let record = service
            .register(&envelope(json!({"Nombre": "Ana", "Edad": 30})))
            .await
            .unwrap();

        assert_eq!(record.id, 1);
        assert_eq!(record.label(), Some("Senior"));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_register_while_warming_up_uses_sentinel() {
        let (service, _) = build(ClassifierHandle::new());
        let record = service
            .register(&envelope(json!({"Nombre": "Ana"})))
            .await
            .unwrap();
        assert_eq!(record.label(), Some(UNLOADED_LABEL));
    }

    #[tokio::test]
    async fn test_register_with_failing_model_uses_error_label() {
        let (service, _) = build(ClassifierHandle::ready(FixedClassifier::failing("nan")));
        let record = service
            .register(&envelope(json!({"Nombre": "Ana"})))
            .await
            .unwrap();
        assert_eq!(record.label(), Some(FAILED_LABEL));
    }

    #[tokio::test]
    async fn test_failed_decryption_writes_nothing() {
        let (service, store) = build(ClassifierHandle::ready(FixedClassifier::new("A")));
        let mut env = envelope(json!({"Nombre": "Ana"}));
        env.iv = env.iv.chars().rev().collect();

        assert!(service.register(&env).await.is_err());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_recompute_requires_ready_model() {
        let (service, store) = build(ClassifierHandle::new());
        service
            .register(&envelope(json!({"Nombre": "Ana"})))
            .await
            .unwrap();

        assert!(matches!(
            service.recompute_all().await,
            Err(ServerError::NotReady)
        ));
        let stored = store.get(1).await.unwrap();
        assert_eq!(stored.label(), Some(UNLOADED_LABEL));
    }

    #[tokio::test]
    async fn test_recompute_overwrites_labels() {
        let handle = ClassifierHandle::new();
        let (service, _) = build(handle.clone());
        for name in ["A", "B"] {
            service
                .register(&envelope(json!({"Nombre": name})))
                .await
                .unwrap();
        }

        handle
            .warm_up(|| Ok(Box::new(FixedClassifier::new("Junior")) as Box<dyn Classifier>))
            .await
            .unwrap();

        let (count, records) = service.recompute_all().await.unwrap();
        assert_eq!(count, 2);
        assert!(records.iter().all(|r| r.label() == Some("Junior")));
    }

    /// Echoes the applicant name back, slowly enough to race other writes
    struct SlowEcho;

    impl Classifier for SlowEcho {
        fn name(&self) -> &'static str {
            "slow-echo"
        }

        fn predict(&self, fields: &Features) -> intake_classifier::ClassifierResult<String> {
            std::thread::sleep(Duration::from_millis(300));
            let name = fields.get("Nombre").and_then(Value::as_str).unwrap_or("?");
            Ok(format!("para {name}"))
        }
    }

    fn nombre(value: &str) -> intake_storage::Fields {
        json!({"Nombre": value}).as_object().cloned().unwrap()
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_recompute_labels_follow_stored_fields() {
        let (service, store) = build(ClassifierHandle::ready(SlowEcho));
        service
            .register(&envelope(json!({"Nombre": "Ana"})))
            .await
            .unwrap();

        let recompute = {
            let service = service.clone();
            tokio::spawn(async move { service.recompute_all().await.unwrap() })
        };
        tokio::time::sleep(Duration::from_millis(100)).await;
        let updated = store.update(1, nombre("Eva")).await.unwrap();
        let (count, records) = recompute.await.unwrap();

        assert_eq!(count, 1);
        let record = &records[0];
        let expected = format!("para {}", record.fields["Nombre"].as_str().unwrap());
        assert_eq!(record.label(), Some(expected.as_str()));

        // The update lands after the relabel and keeps its label
        assert_eq!(updated.fields["Nombre"], "Eva");
        assert_eq!(updated.label(), Some("para Ana"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_recompute_count_matches_records() {
        let (service, store) = build(ClassifierHandle::ready(SlowEcho));
        for name in ["Ana", "Luis"] {
            service
                .register(&envelope(json!({"Nombre": name})))
                .await
                .unwrap();
        }

        let recompute = {
            let service = service.clone();
            tokio::spawn(async move { service.recompute_all().await.unwrap() })
        };
        tokio::time::sleep(Duration::from_millis(100)).await;
        store.delete(2).await.unwrap();
        let (count, records) = recompute.await.unwrap();

        assert_eq!(count, records.len());
        assert_eq!(store.len(), 1);
    }
}
