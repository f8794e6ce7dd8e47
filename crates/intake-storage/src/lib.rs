//! intake-storage: identified record storage
//!
//! Records are free-form maps of primitive values with a store-assigned,
//! never-reused integer `ID`. Every backend serializes writers so that ID
//! allocation and read-modify-write updates stay consistent under
//! concurrent requests.
//!
//! ## Backends
//!
//! | Backend               | Use Case                         |
//! |-----------------------|----------------------------------|
//! | `InMemoryRecordStore` | Unit tests, ephemeral servers    |
//! | `JsonFileRecordStore` | Single-node persistence (default)|
//!
//! ## Example
//!
//! ```rust,ignore
//! use intake_storage::{InMemoryRecordStore, RecordStore};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = InMemoryRecordStore::new();
//!
//!     let fields = json!({"Nombre": "Ana"}).as_object().cloned().unwrap();
//!     let record = store.create(fields).await?;
//!     assert_eq!(record.id, 1);
//!
//!     Ok(())
//! }
//! ```

mod error;
mod record;
mod traits;

mod local;
mod memory;

// Re-exports
pub use error::{StorageError, StorageResult};
pub use record::{Fields, ID_FIELD, PREDICTION_FIELD, Record, RecordSet};
pub use traits::RecordStore;

pub use local::JsonFileRecordStore;
pub use memory::InMemoryRecordStore;
