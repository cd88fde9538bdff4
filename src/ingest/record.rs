// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Generic records and their storage encoding.
//!
//! | Value          | Hash field       | JSON member           |
//! |----------------|------------------|-----------------------|
//! | `Text(s)`      | `s`              | `"s"`                 |
//! | `Number(n)`    | `n` (shortest)   | `n`                   |
//! | `Geo{lon,lat}` | `"lon,lat"`      | `"lon,lat"`           |
//! | `Tags(v)`      | `v.join(",")`    | `["a","b"]`           |

use serde_json::{Map, Number, Value};
use thiserror::Error;

use crate::search::{SchemaDefinition, StorageKind};
use crate::storage::traits::WriteCommand;

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Number(f64),
    Geo { lon: f64, lat: f64 },
    Tags(Vec<String>),
}

impl FieldValue {
    pub fn geo(lon: f64, lat: f64) -> Self {
        FieldValue::Geo { lon, lat }
    }

    pub fn tags<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FieldValue::Tags(tags.into_iter().map(Into::into).collect())
    }

    fn is_finite(&self) -> bool {
        match self {
            FieldValue::Number(n) => n.is_finite(),
            FieldValue::Geo { lon, lat } => lon.is_finite() && lat.is_finite(),
            _ => true,
        }
    }

    /// Flat string form, as stored in a hash
    pub fn to_hash_value(&self) -> String {
        match self {
            FieldValue::Text(s) => s.clone(),
            FieldValue::Number(n) => n.to_string(),
            FieldValue::Geo { lon, lat } => format!("{},{}", lon, lat),
            FieldValue::Tags(tags) => tags.join(","),
        }
    }

    fn to_json(&self) -> Value {
        match self {
            FieldValue::Text(s) => Value::String(s.clone()),
            // Non-finite numbers are rejected before encoding
            FieldValue::Number(n) => Number::from_f64(*n).map(Value::Number).unwrap_or(Value::Null),
            FieldValue::Geo { .. } => Value::String(self.to_hash_value()),
            FieldValue::Tags(tags) => Value::Array(tags.iter().cloned().map(Value::String).collect()),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Number(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Number(value as f64)
    }
}

/// One document to index: identifier plus fields in insertion order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    pub id: String,
    pub fields: Vec<(String, FieldValue)>,
}

impl Record {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            fields: Vec::new(),
        }
    }

    /// Set a field, replacing any earlier value under the same name
    pub fn with(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = value,
            None => self.fields.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }
}

/// Why a single record could not be written. The rest of the load continues.
#[derive(Error, Debug)]
pub enum RecordError {
    #[error("record has an empty identifier")]
    EmptyIdentifier,
    #[error("record '{id}' has no fields to store as a hash")]
    NoFields { id: String },
    #[error("record '{id}' field '{field}' is not a finite number")]
    NonFiniteNumber { id: String, field: String },
    #[error("record '{id}' could not be encoded as JSON: {source}")]
    Json {
        id: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Encode a record into the write command for the schema's storage kind.
pub fn encode(record: &Record, schema: &SchemaDefinition) -> Result<WriteCommand, RecordError> {
    if record.id.trim().is_empty() {
        return Err(RecordError::EmptyIdentifier);
    }
    if let Some((field, _)) = record.fields.iter().find(|(_, v)| !v.is_finite()) {
        return Err(RecordError::NonFiniteNumber {
            id: record.id.clone(),
            field: field.clone(),
        });
    }

    let key = schema.key_for(&record.id);
    match schema.storage_kind {
        // HSET needs at least one field/value pair
        StorageKind::Hash if record.fields.is_empty() => Err(RecordError::NoFields {
            id: record.id.clone(),
        }),
        StorageKind::Hash => Ok(WriteCommand::Hash {
            key,
            fields: record
                .fields
                .iter()
                .map(|(name, value)| (name.clone(), value.to_hash_value()))
                .collect(),
        }),
        StorageKind::JsonDocument => {
            let object: Map<String, Value> = record
                .fields
                .iter()
                .map(|(name, value)| (name.clone(), value.to_json()))
                .collect();
            let document = serde_json::to_string(&Value::Object(object)).map_err(|source| {
                RecordError::Json {
                    id: record.id.clone(),
                    source,
                }
            })?;
            Ok(WriteCommand::Json { key, document })
        }
    }
}
