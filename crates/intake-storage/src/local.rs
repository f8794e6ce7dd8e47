//! JSON document backend: the whole collection persisted as one array

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use tokio::fs;
use tokio::sync::Mutex;

use crate::error::{StorageError, StorageResult};
use crate::record::{Fields, Record, RecordSet, decode_document, encode_document};
use crate::traits::RecordStore;

/// Record store backed by a single JSON file
///
/// Holds the authoritative copy in memory. Mutations take the writer lock,
/// apply to a copy of the current set, write the full document to a
/// temporary sibling, fsync, rename it over the target and only then
/// publish the copy as the new snapshot. Readers clone the published
/// snapshot and never wait on disk I/O.
///
/// The write-and-publish step runs on the blocking pool holding the writer
/// lock, so a caller that goes away mid-write cannot leave the file ahead
/// of the published snapshot.
pub struct JsonFileRecordStore {
    path: Arc<PathBuf>,
    writer: Arc<Mutex<()>>,
    snapshot: Arc<RwLock<Arc<RecordSet>>>,
}

impl JsonFileRecordStore {
    /// Open the store at `path`
    ///
    /// A missing file opens as an empty store (the file is created on the
    /// first write). A file that does not hold a valid record array is an
    /// error rather than silently treated as empty.
    pub async fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let path = path.as_ref().to_path_buf();

        let set = match fs::read(&path).await {
            Ok(bytes) => decode_document(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    fs::create_dir_all(parent).await?;
                }
                RecordSet::new()
            }
            Err(e) => return Err(e.into()),
        };

        tracing::debug!(path = %path.display(), records = set.len(), "opened record store");

        Ok(Self {
            path: Arc::new(path),
            writer: Arc::new(Mutex::new(())),
            snapshot: Arc::new(RwLock::new(Arc::new(set))),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn current(&self) -> Arc<RecordSet> {
        self.snapshot.read().clone()
    }

    /// Run `op` against the next state and persist it as one write
    async fn mutate<T, F>(&self, op: F) -> StorageResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut RecordSet) -> StorageResult<T>,
    {
        let guard = self.writer.clone().lock_owned().await;

        let mut next = RecordSet::clone(&self.current());
        let out = op(&mut next)?;

        let path = self.path.clone();
        let snapshot = self.snapshot.clone();
        tokio::task::spawn_blocking(move || {
            let _guard = guard;
            if let Err(e) = write_atomic(&path, &next) {
                tracing::error!(path = %path.display(), error = %e, "failed to persist records");
                return Err(e);
            }
            *snapshot.write() = Arc::new(next);
            Ok(out)
        })
        .await
        .map_err(|e| StorageError::Backend(format!("persist task failed: {e}")))?
    }
}

/// Replace `path` with the serialized set via write-to-temp + rename
fn write_atomic(path: &Path, set: &RecordSet) -> StorageResult<()> {
    let bytes = encode_document(set.records())?;
    let tmp = temp_path(path);

    let result = (|| -> std::io::Result<()> {
        let mut file = File::create(&tmp)?;
        file.write_all(&bytes)?;
        file.sync_all()?;
        std::fs::rename(&tmp, path)?;
        Ok(())
    })();

    if let Err(e) = result {
        let _ = std::fs::remove_file(&tmp);
        return Err(e.into());
    }

    // Make the rename itself durable
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if let Ok(dir) = File::open(parent) {
            let _ = dir.sync_all();
        }
    }

    tracing::debug!(path = %path.display(), records = set.len(), "persisted records");
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "records.json".into());
    path.with_file_name(format!(".{name}.tmp"))
}

#[async_trait]
impl RecordStore for JsonFileRecordStore {
    async fn list(&self) -> StorageResult<Vec<Record>> {
        Ok(self.current().records().to_vec())
    }

    async fn get(&self, id: u64) -> StorageResult<Record> {
        self.current()
            .get(id)
            .cloned()
            .ok_or(StorageError::NotFound(id))
    }

    async fn create(&self, fields: Fields) -> StorageResult<Record> {
        self.mutate(move |set| set.create(fields)).await
    }

    async fn update(&self, id: u64, fields: Fields) -> StorageResult<Record> {
        self.mutate(move |set| set.update(id, fields)).await
    }

    async fn delete(&self, id: u64) -> StorageResult<()> {
        self.mutate(move |set| set.delete(id).map(|_| ())).await
    }

    async fn replace_field(&self, id: u64, field: &str, value: Value) -> StorageResult<Record> {
        self.mutate(move |set| set.replace_field(id, field, value))
            .await
    }

    async fn replace_field_all(
        &self,
        field: &str,
        values: Vec<(u64, Value)>,
    ) -> StorageResult<Vec<Record>> {
        self.mutate(move |set| {
            set.replace_field_all(field, values)?;
            Ok(set.records().to_vec())
        })
        .await
    }

    async fn relabel(
        &self,
        field: &str,
        label: &(dyn for<'r> Fn(&'r Record) -> Value + Send + Sync),
    ) -> StorageResult<(usize, Vec<Record>)> {
        self.mutate(move |set| {
            let applied = set.relabel(field, label)?;
            Ok((applied, set.records().to_vec()))
        })
        .await
    }
}
