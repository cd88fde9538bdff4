// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! In-memory store for tests and running without Redis.
//!
//! Behaves like Redis Stack for the commands this crate sends: indexes are
//! bound to a key prefix, documents written before or after `create_index`
//! are visible to search, and dropping an index keeps the documents.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use serde_json::Value;

use super::expression::{Expression, IndexedFields};
use super::traits::{RawDocument, SearchReply, StorageError, StoreClient, WriteCommand};
use crate::search::{SchemaDefinition, StorageKind};

#[derive(Debug, Clone)]
enum StoredDocument {
    Hash(HashMap<String, String>),
    Json(Value),
}

pub struct InMemoryStore {
    indexes: RwLock<HashMap<String, SchemaDefinition>>,
    documents: DashMap<String, StoredDocument>,
    flushes: AtomicUsize,
    unavailable: AtomicBool,
    /// Remaining successful batches before writes start failing
    write_budget: Mutex<Option<usize>>,
}

impl InMemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            indexes: RwLock::new(HashMap::new()),
            documents: DashMap::new(),
            flushes: AtomicUsize::new(0),
            unavailable: AtomicBool::new(false),
            write_budget: Mutex::new(None),
        }
    }

    /// Get current document count
    #[must_use]
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Check if empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Number of batches acknowledged so far
    #[must_use]
    pub fn flush_count(&self) -> usize {
        self.flushes.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn has_index(&self, name: &str) -> bool {
        self.indexes.read().contains_key(name)
    }

    /// Raw fields of a stored document (`$` for JSON documents)
    #[must_use]
    pub fn document(&self, key: &str) -> Option<RawDocument> {
        self.documents.get(key).map(|doc| raw_document(key, doc.value()))
    }

    /// Simulate losing the connection: every command fails with `Connection`
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::Relaxed);
    }

    /// Let `batches` more writes succeed, then fail writes with `Connection`
    pub fn fail_writes_after(&self, batches: usize) {
        *self.write_budget.lock() = Some(batches);
    }

    /// Clear all documents and indexes
    pub fn clear(&self) {
        self.documents.clear();
        self.indexes.write().clear();
        self.flushes.store(0, Ordering::Relaxed);
    }

    fn check_available(&self) -> Result<(), StorageError> {
        if self.unavailable.load(Ordering::Relaxed) {
            return Err(StorageError::Connection("in-memory store marked unavailable".into()));
        }
        Ok(())
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn raw_document(key: &str, doc: &StoredDocument) -> RawDocument {
    match doc {
        StoredDocument::Hash(fields) => RawDocument {
            key: key.to_string(),
            fields: fields.clone(),
        },
        StoredDocument::Json(value) => RawDocument::new(key).with_field("$", value.to_string()),
    }
}

/// Resolve a `$.a.b` path against a JSON document
fn resolve_path<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    let path = path.strip_prefix('$').unwrap_or(path);
    path.split('.')
        .filter(|segment| !segment.is_empty())
        .try_fold(value, |current, segment| current.get(segment))
}

fn json_values(value: &Value) -> Vec<String> {
    match value {
        Value::Null => Vec::new(),
        Value::String(s) => vec![s.clone()],
        Value::Array(items) => items.iter().flat_map(json_values).collect(),
        other => vec![other.to_string()],
    }
}

fn index_document(schema: &SchemaDefinition, doc: &StoredDocument) -> Option<IndexedFields> {
    let mut indexed = IndexedFields::new();
    match (schema.storage_kind, doc) {
        (StorageKind::Hash, StoredDocument::Hash(fields)) => {
            for field in &schema.fields {
                if let Some(value) = fields.get(&field.name) {
                    indexed.insert(field.name.clone(), field.field_type, vec![value.clone()]);
                }
            }
        }
        (StorageKind::JsonDocument, StoredDocument::Json(value)) => {
            for field in &schema.fields {
                if let Some(found) = field.path.as_deref().and_then(|p| resolve_path(value, p)) {
                    indexed.insert(field.name.clone(), field.field_type, json_values(found));
                }
            }
        }
        // Indexes only cover documents of their own storage kind
        _ => return None,
    }
    Some(indexed)
}

#[async_trait]
impl StoreClient for InMemoryStore {
    async fn drop_index(&self, name: &str) -> Result<(), StorageError> {
        self.check_available()?;
        match self.indexes.write().remove(name) {
            Some(_) => Ok(()),
            None => Err(StorageError::NotFound(format!("Unknown Index name: {}", name))),
        }
    }

    async fn create_index(&self, schema: &SchemaDefinition) -> Result<(), StorageError> {
        self.check_available()?;
        let mut indexes = self.indexes.write();
        if indexes.contains_key(&schema.index_name) {
            return Err(StorageError::Backend("Index already exists".into()));
        }
        indexes.insert(schema.index_name.clone(), schema.clone());
        Ok(())
    }

    async fn write_batch(&self, commands: &[WriteCommand]) -> Result<(), StorageError> {
        self.check_available()?;
        {
            let mut budget = self.write_budget.lock();
            match budget.as_mut() {
                Some(0) => {
                    return Err(StorageError::Connection("connection reset during pipeline".into()))
                }
                Some(remaining) => *remaining -= 1,
                None => {}
            }
        }

        for command in commands {
            match command {
                WriteCommand::Hash { key, fields } => {
                    let mut entry = self
                        .documents
                        .entry(key.clone())
                        .or_insert_with(|| StoredDocument::Hash(HashMap::new()));
                    match entry.value_mut() {
                        StoredDocument::Hash(existing) => existing.extend(fields.iter().cloned()),
                        other => {
                            *other = StoredDocument::Hash(fields.iter().cloned().collect());
                        }
                    }
                }
                WriteCommand::Json { key, document } => {
                    let value: Value = serde_json::from_str(document)
                        .map_err(|e| StorageError::Backend(format!("invalid JSON for {}: {}", key, e)))?;
                    self.documents.insert(key.clone(), StoredDocument::Json(value));
                }
            }
        }

        self.flushes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    async fn search(
        &self,
        index: &str,
        expression: &str,
        limit: usize,
    ) -> Result<SearchReply, StorageError> {
        self.check_available()?;
        let schema = self
            .indexes
            .read()
            .get(index)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(format!("{}: no such index", index)))?;
        let expression =
            Expression::parse(expression).map_err(|e| StorageError::Backend(e.to_string()))?;

        let mut hits: Vec<RawDocument> = self
            .documents
            .iter()
            .filter(|entry| entry.key().starts_with(&schema.key_prefix))
            .filter(|entry| {
                index_document(&schema, entry.value()).is_some_and(|doc| expression.matches(&doc))
            })
            .map(|entry| raw_document(entry.key(), entry.value()))
            .collect();
        hits.sort_by(|a, b| a.key.cmp(&b.key));

        let total = hits.len();
        hits.truncate(limit);
        Ok(SearchReply {
            total,
            documents: hits,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn transactions() -> SchemaDefinition {
        SchemaDefinition::hash("idx1", "transactions:")
            .tag("acctId")
            .text_weighted("description", 1.0)
            .numeric("amount")
    }

    fn hset(id: &str, description: &str, amount: &str) -> WriteCommand {
        WriteCommand::Hash {
            key: format!("transactions:{}", id),
            fields: vec![
                ("acctId".into(), "acct1".into()),
                ("description".into(), description.into()),
                ("amount".into(), amount.into()),
            ],
        }
    }

    #[tokio::test]
    async fn test_new_store_is_empty() {
        let store = InMemoryStore::new();
        assert!(store.is_empty());
        assert_eq!(store.flush_count(), 0);
    }

    #[tokio::test]
    async fn test_drop_missing_index_is_not_found() {
        let store = InMemoryStore::new();
        let err = store.drop_index("idx1").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_create_twice_rejected() {
        let store = InMemoryStore::new();
        store.create_index(&transactions()).await.unwrap();
        assert!(matches!(
            store.create_index(&transactions()).await,
            Err(StorageError::Backend(_))
        ));
        store.drop_index("idx1").await.unwrap();
        assert!(!store.has_index("idx1"));
    }

    #[tokio::test]
    async fn test_hash_search() {
        let store = InMemoryStore::new();
        store.create_index(&transactions()).await.unwrap();
        store
            .write_batch(&[hset("b", "coffee beans", "12.5"), hset("a", "coffee shop", "3"), hset("c", "rent", "900")])
            .await
            .unwrap();

        let reply = store.search("idx1", "@description:coffee", 10).await.unwrap();
        assert_eq!(reply.total, 2);
        assert_eq!(reply.documents[0].key, "transactions:a");

        let reply = store.search("idx1", "*", 1).await.unwrap();
        assert_eq!(reply.total, 3);
        assert_eq!(reply.documents.len(), 1);
        assert_eq!(store.flush_count(), 1);
    }

    #[tokio::test]
    async fn test_documents_survive_drop() {
        let store = InMemoryStore::new();
        store.write_batch(&[hset("a", "coffee", "1")]).await.unwrap();
        store.create_index(&transactions()).await.unwrap();
        store.drop_index("idx1").await.unwrap();
        assert_eq!(store.len(), 1);

        store.create_index(&transactions()).await.unwrap();
        let reply = store.search("idx1", "*", 10).await.unwrap();
        assert_eq!(reply.total, 1);
    }

    #[tokio::test]
    async fn test_json_search() {
        let schema = SchemaDefinition::json("security-idx", "securities:")
            .tag_at("symbol", "$.symbol")
            .text_at("securityName", "$.securityName", 1.0);
        let store = InMemoryStore::new();
        store.create_index(&schema).await.unwrap();
        store
            .write_batch(&[WriteCommand::Json {
                key: "securities:S1".into(),
                document: json!({"symbol": "ACME", "securityName": "Acme Corp"}).to_string(),
            }])
            .await
            .unwrap();

        let reply = store.search("security-idx", "@symbol:{acme}", 10).await.unwrap();
        assert_eq!(reply.total, 1);
        let payload: Value = serde_json::from_str(reply.documents[0].get("$")).unwrap();
        assert_eq!(payload["securityName"], "Acme Corp");
    }

    #[tokio::test]
    async fn test_search_errors() {
        let store = InMemoryStore::new();
        assert!(store.search("idx1", "*", 10).await.unwrap_err().is_not_found());

        store.create_index(&transactions()).await.unwrap();
        assert!(matches!(
            store.search("idx1", "@amount:[1,", 10).await,
            Err(StorageError::Backend(_))
        ));
    }

    #[tokio::test]
    async fn test_unavailable() {
        let store = InMemoryStore::new();
        store.set_unavailable(true);
        assert!(store.create_index(&transactions()).await.unwrap_err().is_connection());
        store.set_unavailable(false);
        assert!(store.create_index(&transactions()).await.is_ok());
    }

    #[tokio::test]
    async fn test_fail_writes_after() {
        let store = InMemoryStore::new();
        store.fail_writes_after(1);
        assert!(store.write_batch(&[hset("a", "x", "1")]).await.is_ok());
        assert!(store.write_batch(&[hset("b", "x", "1")]).await.unwrap_err().is_connection());
        assert_eq!(store.len(), 1);
    }
}
