use std::collections::HashMap;

use crate::error::{FpnaError, Result};
use crate::source::{DatasetKind, SourceRecord};

/// Name-keyed lookup over one fetched dataset.
#[derive(Debug, Clone)]
pub struct DatasetIndex {
    kind: DatasetKind,
    records: HashMap<String, SourceRecord>,
}

/// Build the lookup for one fetch.
///
/// Two records with the same key are rejected with `DuplicateKey`; the store is
/// expected to aggregate per name, so a repeat means the dataset is ambiguous.
pub fn index(kind: DatasetKind, records: Vec<SourceRecord>) -> Result<DatasetIndex> {
    let mut map = HashMap::with_capacity(records.len());
    for record in records {
        if !kind.accepts(&record.value) {
            return Err(FpnaError::RecordKindMismatch {
                kind,
                key: record.key,
            });
        }
        if map.contains_key(&record.key) {
            return Err(FpnaError::DuplicateKey {
                kind,
                key: record.key,
            });
        }
        map.insert(record.key.clone(), record);
    }
    tracing::debug!(%kind, records = map.len(), "indexed dataset");
    Ok(DatasetIndex { kind, records: map })
}

impl DatasetIndex {
    pub fn kind(&self) -> DatasetKind {
        self.kind
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&SourceRecord> {
        self.records.get(key)
    }

    /// Value for `key` under the zero-fill policy: a missing record or a null
    /// value field both mean "no activity" and read as `0.0`.
    pub fn value_of(&self, key: &str) -> f64 {
        self.get(key).and_then(|r| r.value.get()).unwrap_or(0.0)
    }
}
