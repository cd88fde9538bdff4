// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Maps raw search hits back into typed records.
//!
//! Hash hits carry every field as a string. JSON hits carry a single `$`
//! field holding the whole document, which is flattened into top-level
//! string fields first so both layouts map through the same code.

use std::collections::HashMap;

use serde_json::Value;
use tracing::warn;

use crate::storage::traits::RawDocument;

/// Field holding the serialized document on JSON hits
pub const JSON_ROOT_FIELD: &str = "$";

/// Construction of a record from a search hit.
///
/// Implementations must not fail: a missing field reads as `""` through
/// [`RawDocument::get`] and maps to the type's default.
pub trait FromDocument: Sized {
    fn from_document(doc: &RawDocument) -> Self;
}

impl FromDocument for RawDocument {
    fn from_document(doc: &RawDocument) -> Self {
        doc.clone()
    }
}

impl FromDocument for HashMap<String, String> {
    fn from_document(doc: &RawDocument) -> Self {
        doc.fields.clone()
    }
}

pub struct ResultMapper;

impl ResultMapper {
    /// Map every hit, in order. Output length always equals input length.
    pub fn map<T: FromDocument>(documents: &[RawDocument]) -> Vec<T> {
        documents
            .iter()
            .map(|doc| T::from_document(&Self::expand(doc)))
            .collect()
    }

    /// Flatten a `$` JSON payload into top-level string fields.
    ///
    /// Explicit fields returned alongside `$` win over the flattened ones.
    /// A payload that is not a JSON object is logged and left in place.
    pub fn expand(doc: &RawDocument) -> RawDocument {
        let Some(payload) = doc.fields.get(JSON_ROOT_FIELD) else {
            return doc.clone();
        };

        let object = match serde_json::from_str::<Value>(payload) {
            Ok(Value::Object(object)) => object,
            Ok(other) => {
                warn!(key = %doc.key, kind = json_kind(&other), "JSON hit is not an object");
                return doc.clone();
            }
            Err(e) => {
                warn!(key = %doc.key, error = %e, "Malformed JSON hit");
                return doc.clone();
            }
        };

        let mut fields: HashMap<String, String> = object
            .into_iter()
            .map(|(name, value)| (name, flatten(value)))
            .collect();
        for (name, value) in &doc.fields {
            if name != JSON_ROOT_FIELD {
                fields.insert(name.clone(), value.clone());
            }
        }

        RawDocument {
            key: doc.key.clone(),
            fields,
        }
    }
}

fn flatten(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        Value::Array(items) => items.into_iter().map(flatten).collect::<Vec<_>>().join(","),
        other => other.to_string(),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
