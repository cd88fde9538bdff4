// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Redis storage backend (Redis Stack: RediSearch + RedisJSON).
//!
//! Writes go through a pipeline per batch:
//! - **Hash records** → `HSET key field value ...`
//! - **JSON records** → `JSON.SET key $ <document>`
//!
//! Index management and search use raw module commands:
//! ```text
//! FT.DROPINDEX idx1
//! FT.CREATE idx1 ON HASH PREFIX 1 transactions: SCHEMA ...
//! FT.SEARCH idx1 '@description:coffee' LIMIT 0 40
//! ```

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{cmd, pipe, Client, ErrorKind, RedisError, Value};
use tracing::debug;

use super::traits::{RawDocument, SearchReply, StorageError, StoreClient, WriteCommand};
use crate::resilience::retry::{retry, RetryConfig};
use crate::search::SchemaDefinition;

pub struct RedisStore {
    connection: ConnectionManager,
}

impl RedisStore {
    /// Connect to Redis.
    ///
    /// Connection establishment retries with the startup preset; once
    /// connected, commands are never retried here.
    ///
    /// ```rust,no_run
    /// # use search_engine::storage::redis::RedisStore;
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let store = RedisStore::connect("redis://localhost:6379").await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn connect(connection_string: &str) -> Result<Self, StorageError> {
        let client = Client::open(connection_string)
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        let connection = retry("redis_connect", &RetryConfig::startup(), || async {
            ConnectionManager::new(client.clone()).await
        })
        .await
        .map_err(|e: RedisError| StorageError::Connection(e.to_string()))?;

        Ok(Self { connection })
    }

    /// Get a clone of the connection manager
    pub fn connection(&self) -> ConnectionManager {
        self.connection.clone()
    }
}

/// Map a Redis error onto the storage taxonomy.
///
/// RediSearch reports a missing index as a plain server error, so the
/// message is inspected.
fn classify(err: RedisError) -> StorageError {
    if err.is_io_error()
        || err.is_connection_dropped()
        || err.is_connection_refusal()
        || err.is_timeout()
        || err.kind() == ErrorKind::IoError
    {
        return StorageError::Connection(err.to_string());
    }

    let message = err.to_string();
    let lower = message.to_ascii_lowercase();
    if lower.contains("unknown index name") || lower.contains("no such index") {
        StorageError::NotFound(message)
    } else {
        StorageError::Backend(message)
    }
}

fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::BulkString(bytes) => Some(String::from_utf8_lossy(bytes).into_owned()),
        Value::SimpleString(s) => Some(s.clone()),
        Value::VerbatimString { text, .. } => Some(text.clone()),
        Value::Int(n) => Some(n.to_string()),
        Value::Double(d) => Some(d.to_string()),
        Value::Okay => Some("OK".to_string()),
        _ => None,
    }
}

fn parse_fields(value: &Value) -> Result<Vec<(String, String)>, StorageError> {
    let pairs: Vec<(&Value, &Value)> = match value {
        Value::Array(items) => items
            .chunks(2)
            .filter(|pair| pair.len() == 2)
            .map(|pair| (&pair[0], &pair[1]))
            .collect(),
        Value::Map(entries) => entries.iter().map(|(k, v)| (k, v)).collect(),
        Value::Nil => Vec::new(),
        other => {
            return Err(StorageError::Backend(format!(
                "Unexpected FT.SEARCH field list: {:?}",
                other
            )))
        }
    };

    Ok(pairs
        .into_iter()
        .filter_map(|(k, v)| Some((value_to_string(k)?, value_to_string(v).unwrap_or_default())))
        .collect())
}

/// Parse an FT.SEARCH RESP2 reply: `[total, key1, [f, v, ...], key2, [...], ...]`
fn parse_search_reply(value: Value) -> Result<SearchReply, StorageError> {
    let Value::Array(items) = value else {
        return Err(StorageError::Backend(format!(
            "Unexpected FT.SEARCH reply: {:?}",
            value
        )));
    };

    let mut iter = items.into_iter();
    let total = match iter.next() {
        Some(Value::Int(n)) => usize::try_from(n).unwrap_or(0),
        Some(other) => {
            return Err(StorageError::Backend(format!(
                "Unexpected FT.SEARCH total: {:?}",
                other
            )))
        }
        None => 0,
    };

    let mut documents = Vec::new();
    while let Some(key) = iter.next() {
        let key = value_to_string(&key).ok_or_else(|| {
            StorageError::Backend(format!("Unexpected FT.SEARCH document key: {:?}", key))
        })?;
        let mut doc = RawDocument::new(key);
        if let Some(fields) = iter.next() {
            doc.fields.extend(parse_fields(&fields)?);
        }
        documents.push(doc);
    }

    Ok(SearchReply { total, documents })
}

#[async_trait]
impl StoreClient for RedisStore {
    async fn drop_index(&self, name: &str) -> Result<(), StorageError> {
        let mut conn = self.connection.clone();
        cmd("FT.DROPINDEX")
            .arg(name)
            .query_async::<()>(&mut conn)
            .await
            .map_err(classify)
    }

    async fn create_index(&self, schema: &SchemaDefinition) -> Result<(), StorageError> {
        let mut conn = self.connection.clone();
        let args = schema.to_ft_create_args();
        debug!(index = %schema.index_name, args = %args.join(" "), "FT.CREATE");

        cmd("FT.CREATE")
            .arg(&args)
            .query_async::<()>(&mut conn)
            .await
            .map_err(classify)
    }

    async fn write_batch(&self, commands: &[WriteCommand]) -> Result<(), StorageError> {
        if commands.is_empty() {
            return Ok(());
        }

        let mut conn = self.connection.clone();
        let mut pipeline = pipe();
        for command in commands {
            match command {
                WriteCommand::Hash { key, fields } => {
                    pipeline.hset_multiple(key, fields.as_slice()).ignore();
                }
                WriteCommand::Json { key, document } => {
                    pipeline.cmd("JSON.SET").arg(key).arg("$").arg(document).ignore();
                }
            }
        }

        pipeline.query_async::<()>(&mut conn).await.map_err(classify)
    }

    async fn search(
        &self,
        index: &str,
        expression: &str,
        limit: usize,
    ) -> Result<SearchReply, StorageError> {
        let mut conn = self.connection.clone();
        debug!(index = %index, query = %expression, limit, "FT.SEARCH");

        let reply: Value = cmd("FT.SEARCH")
            .arg(index)
            .arg(expression)
            .arg("LIMIT")
            .arg(0)
            .arg(limit)
            .query_async(&mut conn)
            .await
            .map_err(classify)?;

        parse_search_reply(reply)
    }
}
