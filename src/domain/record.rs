//! The flat, JSON-object shape a checklist takes in the record store.

use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};

pub type Record = Map<String, Value>;

/// Columns owned by the store; never part of a write payload.
pub const SERVER_OWNED_KEYS: [&str; 2] = ["id", "created_at"];

#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("record is not a JSON object")]
    NotAnObject,
    #[error("malformed record: {0}")]
    Json(#[from] serde_json::Error),
}

pub fn to_record<T: Serialize>(value: &T) -> Result<Record, RecordError> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        _ => Err(RecordError::NotAnObject),
    }
}

pub fn from_record<T: DeserializeOwned>(record: Record) -> Result<T, RecordError> {
    Ok(serde_json::from_value(Value::Object(record))?)
}

/// Shallow, last-write-wins merge per top-level key: every key present in
/// `section` replaces the one in `base`, keys absent from `section` are kept
/// untouched. Nested objects are replaced whole, never merged.
pub fn merge(base: &Record, section: &Record) -> Record {
    let mut merged = base.clone();
    for (key, value) in section {
        merged.insert(key.clone(), value.clone());
    }
    merged
}

pub fn strip_server_owned(mut record: Record) -> Record {
    for key in SERVER_OWNED_KEYS {
        record.remove(key);
    }
    record
}
