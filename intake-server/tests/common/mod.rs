use std::net::SocketAddr;
use std::sync::{Arc, OnceLock};

use intake_classifier::{ClassifierHandle, FixedClassifier};
use intake_core::{Envelope, KeyManager, seal};
use intake_storage::{InMemoryRecordStore, RecordStore};
use tokio::net::TcpListener;

#[allow(dead_code)]
pub const LABEL: &str = "Senior";

#[allow(dead_code)]
pub struct TestServer {
    pub url: String,
    #[allow(dead_code)]
    pub addr: SocketAddr,
    #[allow(dead_code)]
    pub records: Arc<dyn RecordStore>,
}

/// One key pair per test binary; RSA generation dominates test time otherwise
pub fn keys() -> Arc<KeyManager> {
    static KEYS: OnceLock<Arc<KeyManager>> = OnceLock::new();
    KEYS.get_or_init(|| Arc::new(KeyManager::generate_with_bits(1024).unwrap()))
        .clone()
}

/// Seal a JSON value for the given PEM public key
#[allow(dead_code)]
pub fn envelope(public_key_pem: &str, value: &serde_json::Value) -> Envelope {
    seal(public_key_pem, value.to_string().as_bytes()).unwrap()
}

impl TestServer {
    #[allow(dead_code)]
    /// Server with an in-memory store and a classifier that always answers `LABEL`
    pub async fn start() -> Self {
        Self::start_with(
            ClassifierHandle::ready(FixedClassifier::new(LABEL)),
            Arc::new(InMemoryRecordStore::new()),
        )
        .await
    }

    #[allow(dead_code)]
    pub async fn start_with(classifier: ClassifierHandle, records: Arc<dyn RecordStore>) -> Self {
        let config = intake_server::config::Config {
            host: "127.0.0.1".into(),
            port: 0, // OS assigns port
            ..Default::default()
        };

        let state =
            intake_server::state::AppState::with_parts(&config, keys(), records.clone(), classifier);
        let app = intake_server::routes::router(state);

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Give server a moment to start
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

        Self {
            url: format!("http://{addr}"),
            addr,
            records,
        }
    }
}
