//! Storage trait definitions

use async_trait::async_trait;
use serde_json::Value;

use crate::error::StorageResult;
use crate::record::{Fields, Record};

/// Durable mapping of record ID to record
///
/// Implementations own ID allocation and must serialize every mutating
/// call: two concurrent `create`s never observe the same next ID, and no
/// write is ever based on a state older than the latest successful write.
/// Reads return a consistent snapshot and do not wait on persistence.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// All records in insertion order
    async fn list(&self) -> StorageResult<Vec<Record>>;

    /// Fetch one record
    ///
    /// Returns `StorageError::NotFound` if the ID is unknown.
    async fn get(&self, id: u64) -> StorageResult<Record>;

    /// Allocate the next ID, store `fields` under it and return the record
    ///
    /// An `ID` key inside `fields` is ignored.
    async fn create(&self, fields: Fields) -> StorageResult<Record>;

    /// Merge `fields` into an existing record
    ///
    /// Existing keys are overwritten, absent keys are kept. Unknown IDs
    /// return `StorageError::NotFound` and leave the store untouched.
    async fn update(&self, id: u64, fields: Fields) -> StorageResult<Record>;

    /// Remove a record
    ///
    /// Unlike chunk storage this is not idempotent: deleting an unknown ID
    /// returns `StorageError::NotFound`.
    async fn delete(&self, id: u64) -> StorageResult<()>;

    /// Overwrite a single field of one record
    async fn replace_field(&self, id: u64, field: &str, value: Value) -> StorageResult<Record>;

    /// Overwrite `field` on many records in one write
    ///
    /// IDs that no longer exist are skipped. Returns the store contents
    /// after the write.
    async fn replace_field_all(
        &self,
        field: &str,
        values: Vec<(u64, Value)>,
    ) -> StorageResult<Vec<Record>>;

    /// Recompute `field` on every record from its fields, in one write
    ///
    /// `label` runs under the writer lock, so each value is derived from
    /// the latest committed version of its record and no other write can
    /// land between computing and storing it. Returns the number of
    /// records labelled and the store contents after the write.
    async fn relabel(
        &self,
        field: &str,
        label: &(dyn for<'r> Fn(&'r Record) -> Value + Send + Sync),
    ) -> StorageResult<(usize, Vec<Record>)>;
}
