//! In-memory record store (for testing)

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;

use crate::error::{StorageError, StorageResult};
use crate::record::{Fields, Record, RecordSet};
use crate::traits::RecordStore;

/// In-memory record store for unit tests and ephemeral deployments
///
/// Every mutation runs under the write lock without awaiting, so writers
/// are serialized. Not persistent: data is lost on drop.
#[derive(Default)]
pub struct InMemoryRecordStore {
    records: RwLock<RecordSet>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with existing records
    pub fn with_records(records: Vec<Record>) -> StorageResult<Self> {
        Ok(Self {
            records: RwLock::new(RecordSet::from_records(records)?),
        })
    }

    /// Number of stored records
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn list(&self) -> StorageResult<Vec<Record>> {
        Ok(self.records.read().records().to_vec())
    }

    async fn get(&self, id: u64) -> StorageResult<Record> {
        self.records
            .read()
            .get(id)
            .cloned()
            .ok_or(StorageError::NotFound(id))
    }

    async fn create(&self, fields: Fields) -> StorageResult<Record> {
        self.records.write().create(fields)
    }

    async fn update(&self, id: u64, fields: Fields) -> StorageResult<Record> {
        self.records.write().update(id, fields)
    }

    async fn delete(&self, id: u64) -> StorageResult<()> {
        self.records.write().delete(id).map(|_| ())
    }

    async fn replace_field(&self, id: u64, field: &str, value: Value) -> StorageResult<Record> {
        self.records.write().replace_field(id, field, value)
    }

    async fn replace_field_all(
        &self,
        field: &str,
        values: Vec<(u64, Value)>,
    ) -> StorageResult<Vec<Record>> {
        let mut records = self.records.write();
        records.replace_field_all(field, values)?;
        Ok(records.records().to_vec())
    }

    async fn relabel(
        &self,
        field: &str,
        label: &(dyn for<'r> Fn(&'r Record) -> Value + Send + Sync),
    ) -> StorageResult<(usize, Vec<Record>)> {
        let mut records = self.records.write();
        let applied = records.relabel(field, label)?;
        Ok((applied, records.records().to_vec()))
    }
}
