//! Record type and the in-memory record set shared by all backends

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{StorageError, StorageResult};

/// Free-form record fields, insertion order preserved
pub type Fields = Map<String, Value>;

/// Reserved key holding the record identity
pub const ID_FIELD: &str = "ID";

/// Reserved key holding the classifier's label
pub const PREDICTION_FIELD: &str = "Prediccion_IA";

/// A stored record: an identity plus arbitrary primitive fields
///
/// Serializes flat, with `ID` first: `{"ID": 3, "Nombre": "Ana", ...}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Record {
    #[serde(rename = "ID")]
    pub id: u64,
    #[serde(flatten)]
    pub fields: Fields,
}

impl Record {
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Prediction label, if one has been assigned
    pub fn label(&self) -> Option<&str> {
        self.fields.get(PREDICTION_FIELD).and_then(Value::as_str)
    }
}

/// Ordered records plus the ID high-water mark
///
/// All mutations validate before touching state, so a failed call leaves
/// the set unchanged.
#[derive(Clone, Debug, Default)]
pub struct RecordSet {
    records: Vec<Record>,
    high_water: u64,
}

impl RecordSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from persisted records, checking identity invariants
    pub fn from_records(records: Vec<Record>) -> StorageResult<Self> {
        let mut seen = HashSet::with_capacity(records.len());
        for record in &records {
            if record.id == 0 {
                return Err(StorageError::Corrupt("record with ID 0".into()));
            }
            if !seen.insert(record.id) {
                return Err(StorageError::Corrupt(format!(
                    "duplicate record ID {}",
                    record.id
                )));
            }
        }

        let high_water = records.iter().map(|r| r.id).max().unwrap_or(0);
        Ok(Self {
            records,
            high_water,
        })
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// ID the next `create` will assign
    ///
    /// `max(existing) + 1`, except that IDs freed by deleting the highest
    /// record are not handed out again.
    pub fn next_id(&self) -> u64 {
        self.high_water + 1
    }

    pub fn get(&self, id: u64) -> Option<&Record> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn create(&mut self, fields: Fields) -> StorageResult<Record> {
        let fields = sanitize(fields)?;
        let record = Record {
            id: self.next_id(),
            fields,
        };
        self.high_water = record.id;
        self.records.push(record.clone());
        Ok(record)
    }

    pub fn update(&mut self, id: u64, fields: Fields) -> StorageResult<Record> {
        let idx = self.position(id)?;
        let fields = sanitize(fields)?;

        let record = &mut self.records[idx];
        for (name, value) in fields {
            record.fields.insert(name, value);
        }
        Ok(record.clone())
    }

    pub fn delete(&mut self, id: u64) -> StorageResult<Record> {
        let idx = self.position(id)?;
        Ok(self.records.remove(idx))
    }

    pub fn replace_field(&mut self, id: u64, field: &str, value: Value) -> StorageResult<Record> {
        let idx = self.position(id)?;
        check_field(field, &value)?;

        let record = &mut self.records[idx];
        record.fields.insert(field.to_string(), value);
        Ok(record.clone())
    }

    /// Apply many single-field writes; returns how many records changed
    pub fn replace_field_all(&mut self, field: &str, values: Vec<(u64, Value)>) -> StorageResult<usize> {
        for (_, value) in &values {
            check_field(field, value)?;
        }

        let mut applied = 0;
        for (id, value) in values {
            if let Some(record) = self.records.iter_mut().find(|r| r.id == id) {
                record.fields.insert(field.to_string(), value);
                applied += 1;
            }
        }
        Ok(applied)
    }

    /// Recompute `field` for every record from its current contents
    ///
    /// All values are computed before any is written, so a rejected value
    /// leaves the set unchanged. Returns how many records were labelled.
    pub fn relabel<F>(&mut self, field: &str, label: F) -> StorageResult<usize>
    where
        F: Fn(&Record) -> Value,
    {
        let values = self.records.iter().map(|r| (r.id, label(r))).collect();
        self.replace_field_all(field, values)
    }

    fn position(&self, id: u64) -> StorageResult<usize> {
        self.records
            .iter()
            .position(|r| r.id == id)
            .ok_or(StorageError::NotFound(id))
    }
}

/// Drop caller-supplied identity and reject non-primitive values
fn sanitize(mut fields: Fields) -> StorageResult<Fields> {
    fields.remove(ID_FIELD);
    for (name, value) in &fields {
        check_value(name, value)?;
    }
    Ok(fields)
}

fn check_field(field: &str, value: &Value) -> StorageResult<()> {
    if field == ID_FIELD {
        return Err(StorageError::invalid_field(field, "record identity is immutable"));
    }
    check_value(field, value)
}

fn check_value(field: &str, value: &Value) -> StorageResult<()> {
    match value {
        Value::Array(_) | Value::Object(_) => Err(StorageError::invalid_field(
            field,
            "values must be strings, numbers, booleans or null",
        )),
        _ => Ok(()),
    }
}

/// Serialize records the way the document is kept on disk
pub(crate) fn encode_document(records: &[Record]) -> StorageResult<Vec<u8>> {
    let mut out = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut out, formatter);
    records.serialize(&mut ser)?;
    Ok(out)
}

pub(crate) fn decode_document(bytes: &[u8]) -> StorageResult<RecordSet> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(RecordSet::new());
    }
    let records: Vec<Record> =
        serde_json::from_slice(bytes).map_err(|e| StorageError::Corrupt(e.to_string()))?;
    RecordSet::from_records(records)
}
