// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Search engine coordinator.
//!
//! The [`SearchEngine`] ties the components together behind one shared
//! store client:
//! - [`IndexManager`] for drop/create of RediSearch indexes
//! - [`BatchIngestor`] for pipelined bulk loads
//! - [`QueryBuilder`] / [`RediSearchTranslator`] for query expressions
//! - [`ResultMapper`](crate::search::ResultMapper) for typed results
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use search_engine::{SearchEngine, SearchEngineConfig};
//! use search_engine::kinds::transaction;
//! use search_engine::search::SearchRequest;
//! use search_engine::storage::memory::InMemoryStore;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let engine = SearchEngine::new(Arc::new(InMemoryStore::new()), SearchEngineConfig::default());
//! let schema = transaction::schema();
//!
//! let records = vec![transaction::Transaction::new("a1", "t1", "coffee shop", 4.5).to_record()];
//! let summary = engine.recreate_and_load(&schema, &records).await?;
//! assert_eq!(summary.stats.count, 1);
//!
//! let result = engine
//!     .search::<transaction::TransactionValue>(&schema, &SearchRequest::new("coffee"))
//!     .await;
//! assert_eq!(result.match_count, 1);
//! # Ok(())
//! # }
//! ```

mod load_api;
mod search_api;
mod types;

pub use types::{EngineError, LoadSummary, SearchResponse, SearchResult};

use std::sync::Arc;

use tracing::info;

use crate::clock::{Clock, SystemClock};
use crate::config::SearchEngineConfig;
use crate::ingest::BatchIngestor;
use crate::search::{IndexManager, QueryBuilder, RediSearchTranslator};
use crate::storage::redis::RedisStore;
use crate::storage::traits::StoreClient;

/// Main search coordinator.
///
/// `Send + Sync`; share it behind an `Arc`. Loads into the same index must
/// not run concurrently, since each one drops and recreates the index.
pub struct SearchEngine {
    pub(super) store: Arc<dyn StoreClient>,
    pub(super) config: SearchEngineConfig,
    pub(super) clock: Arc<dyn Clock>,
    pub(super) index_manager: IndexManager,
    pub(super) ingestor: BatchIngestor,
    pub(super) query_builder: QueryBuilder,
    pub(super) translator: RediSearchTranslator,
}

impl SearchEngine {
    pub fn new(store: Arc<dyn StoreClient>, config: SearchEngineConfig) -> Self {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let escaping = config.term_escaping();
        Self {
            index_manager: IndexManager::new(store.clone()),
            ingestor: BatchIngestor::new(store.clone())
                .with_batch_config(config.batch_config())
                .with_clock(clock.clone()),
            query_builder: QueryBuilder::new(escaping),
            translator: RediSearchTranslator::new(escaping),
            store,
            config,
            clock,
        }
    }

    /// Connect to Redis at `config.redis_url`
    pub async fn connect(config: SearchEngineConfig) -> Result<Self, EngineError> {
        config.validate()?;
        let store = RedisStore::connect(&config.redis_url).await?;
        info!(url = %config.redis_url, "Connected to Redis");
        Ok(Self::new(Arc::new(store), config))
    }

    /// Replace the time source used for load and search timings
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.ingestor = BatchIngestor::new(self.store.clone())
            .with_batch_config(self.config.batch_config())
            .with_clock(clock.clone());
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &SearchEngineConfig {
        &self.config
    }

    pub fn index_manager(&self) -> &IndexManager {
        &self.index_manager
    }

    pub fn store(&self) -> &Arc<dyn StoreClient> {
        &self.store
    }
}
