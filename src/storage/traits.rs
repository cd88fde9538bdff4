// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;

use crate::search::SchemaDefinition;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// The named index (or key) does not exist
    #[error("Not found: {0}")]
    NotFound(String),
    /// Transport failure: the store could not be reached or the connection dropped
    #[error("Connection error: {0}")]
    Connection(String),
    /// The store rejected the command
    #[error("Storage backend error: {0}")]
    Backend(String),
}

impl StorageError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound(_))
    }

    pub fn is_connection(&self) -> bool {
        matches!(self, StorageError::Connection(_))
    }
}

/// One buffered write in a pipelined batch
#[derive(Debug, Clone, PartialEq)]
pub enum WriteCommand {
    /// HSET key field value [field value ...]
    Hash {
        key: String,
        fields: Vec<(String, String)>,
    },
    /// JSON.SET key $ document
    Json { key: String, document: String },
}

impl WriteCommand {
    pub fn key(&self) -> &str {
        match self {
            WriteCommand::Hash { key, .. } | WriteCommand::Json { key, .. } => key,
        }
    }

    /// Approximate payload size, used for batch byte accounting
    pub fn size_bytes(&self) -> usize {
        match self {
            WriteCommand::Hash { key, fields } => {
                key.len() + fields.iter().map(|(f, v)| f.len() + v.len()).sum::<usize>()
            }
            WriteCommand::Json { key, document } => key.len() + document.len(),
        }
    }
}

/// A search hit as returned by the store: field name → string value.
///
/// JSON documents come back as a single `$` field holding the serialized
/// document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawDocument {
    pub key: String,
    pub fields: HashMap<String, String>,
}

impl RawDocument {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            fields: HashMap::new(),
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Field value, or the empty string when the document lacks it
    pub fn get(&self, name: &str) -> &str {
        self.fields.get(name).map(String::as_str).unwrap_or("")
    }
}

/// Reply to a search: total matches plus the returned page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchReply {
    pub total: usize,
    pub documents: Vec<RawDocument>,
}

/// Capabilities this crate needs from the key/value + document store.
///
/// Implementations own pooling, pipelining and timeouts; callers never retry.
#[async_trait]
pub trait StoreClient: Send + Sync {
    /// Drop an index (documents are kept). `NotFound` if it does not exist.
    async fn drop_index(&self, name: &str) -> Result<(), StorageError>;

    /// Create an index from a schema definition.
    async fn create_index(&self, schema: &SchemaDefinition) -> Result<(), StorageError>;

    /// Send a batch of buffered writes and wait until all are acknowledged.
    async fn write_batch(&self, commands: &[WriteCommand]) -> Result<(), StorageError>;

    /// Run a query expression against an index, returning at most `limit` documents.
    async fn search(
        &self,
        index: &str,
        expression: &str,
        limit: usize,
    ) -> Result<SearchReply, StorageError>;
}
