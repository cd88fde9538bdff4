// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Index Manager
//!
//! Manages RediSearch index lifecycle: drop, create, and the drop-then-create
//! `recreate` used before every bulk load.
//!
//! `recreate` is not atomic with respect to concurrent searches: between the
//! drop and the create, searches against the index fail (and so return zero
//! results). Callers must serialize `recreate` per index name.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

use super::schema::{SchemaDefinition, SchemaError};
use crate::metrics;
use crate::storage::traits::{StorageError, StoreClient};

#[derive(Error, Debug)]
pub enum IndexError {
    #[error("Invalid schema: {0}")]
    InvalidSchema(#[from] SchemaError),
    #[error("Store unavailable: {0}")]
    Unavailable(StorageError),
    #[error("Failed to create index '{index}': {source}")]
    CreateFailed {
        index: String,
        #[source]
        source: StorageError,
    },
    #[error("Failed to drop index '{index}': {source}")]
    DropFailed {
        index: String,
        #[source]
        source: StorageError,
    },
}

pub struct IndexManager {
    store: Arc<dyn StoreClient>,
}

impl IndexManager {
    pub fn new(store: Arc<dyn StoreClient>) -> Self {
        Self { store }
    }

    /// Drop an index, keeping its documents.
    ///
    /// Returns `false` when there was no index to drop.
    pub async fn drop(&self, name: &str) -> Result<bool, IndexError> {
        match self.store.drop_index(name).await {
            Ok(()) => {
                metrics::record_index_operation(name, "drop", true);
                info!(index = %name, "Search index dropped");
                Ok(true)
            }
            Err(e) if e.is_not_found() => {
                debug!(index = %name, "No index to drop");
                Ok(false)
            }
            Err(e) => {
                metrics::record_index_operation(name, "drop", false);
                if e.is_connection() {
                    metrics::record_connection_error("store");
                    Err(IndexError::Unavailable(e))
                } else {
                    Err(IndexError::DropFailed {
                        index: name.to_string(),
                        source: e,
                    })
                }
            }
        }
    }

    /// Validate and create an index. Fails if it already exists.
    pub async fn create(&self, schema: &SchemaDefinition) -> Result<(), IndexError> {
        schema.validate()?;

        match self.store.create_index(schema).await {
            Ok(()) => {
                metrics::record_index_operation(&schema.index_name, "create", true);
                info!(
                    index = %schema.index_name,
                    prefix = %schema.key_prefix,
                    kind = schema.storage_kind.as_keyword(),
                    fields = schema.fields.len(),
                    "Search index created"
                );
                Ok(())
            }
            Err(e) => {
                metrics::record_index_operation(&schema.index_name, "create", false);
                if e.is_connection() {
                    metrics::record_connection_error("store");
                    Err(IndexError::Unavailable(e))
                } else {
                    Err(IndexError::CreateFailed {
                        index: schema.index_name.clone(),
                        source: e,
                    })
                }
            }
        }
    }

    /// Drop the index if present, then create it from `schema`.
    ///
    /// Nothing is sent for an invalid schema. A drop that fails for reasons
    /// other than a missing index or a lost connection is logged and the
    /// create is attempted anyway; the create then reports the real state.
    pub async fn recreate(&self, schema: &SchemaDefinition) -> Result<(), IndexError> {
        schema.validate()?;

        match self.drop(&schema.index_name).await {
            Ok(_) => {}
            Err(IndexError::Unavailable(e)) => return Err(IndexError::Unavailable(e)),
            Err(e) => {
                warn!(index = %schema.index_name, error = %e, "Drop failed, creating anyway");
            }
        }

        self.create(schema).await
    }
}
