//! # Search Engine
//!
//! Secondary-index search over Redis: RediSearch index lifecycle, pipelined
//! bulk loading and query construction for hash and JSON document kinds.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        SearchEngine                         │
//! │  • recreate_and_load(schema, records) → LoadSummary        │
//! │  • search::<T>(schema, request)       → SearchResult<T>    │
//! └─────────────────────────────────────────────────────────────┘
//!          │                    │                      │
//!          ▼                    ▼                      ▼
//! ┌────────────────┐  ┌──────────────────┐  ┌────────────────────┐
//! │  IndexManager  │  │  BatchIngestor   │  │ QueryBuilder       │
//! │  drop + create │  │  rayon encode    │  │ ResultMapper       │
//! │  FT.CREATE     │  │  batches of 1000 │  │ FT.SEARCH          │
//! └────────────────┘  └──────────────────┘  └────────────────────┘
//!          │                    │                      │
//!          └────────────────────┼──────────────────────┘
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 StoreClient (async trait)                   │
//! │  • RedisStore: RediSearch + RedisJSON over ConnectionManager│
//! │  • InMemoryStore: evaluates the same expressions locally   │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use search_engine::{SearchEngine, SearchEngineConfig};
//! use search_engine::ids::UuidIdGenerator;
//! use search_engine::kinds::transaction;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = SearchEngineConfig::load()?;
//!     let engine = SearchEngine::connect(config).await?;
//!
//!     let records = transaction::records_from_descriptions(
//!         "coffee shop\ngrocery store\n",
//!         &UuidIdGenerator,
//!         &mut rand::thread_rng(),
//!     );
//!     let summary = engine.recreate_and_load(&transaction::schema(), &records).await?;
//!     println!("{}", summary);
//!
//!     let request = transaction::search_request("coffee", 50.0);
//!     let result = engine
//!         .search::<transaction::TransactionValue>(&transaction::schema(), &request)
//!         .await;
//!     println!("{} matches in {} ms", result.match_count, result.elapsed_millis);
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration
//!
//! See [`SearchEngineConfig`] for all configuration options.
//!
//! ## Modules
//!
//! - [`coordinator`]: The [`SearchEngine`] facade
//! - [`search`]: Schemas, index lifecycle, query construction, result mapping
//! - [`ingest`]: Records and the pipelined bulk loader
//! - [`storage`]: Store backends (Redis, in-memory)
//! - [`batching`]: Count/size bounded pipeline batches
//! - [`kinds`]: Transaction, security and company document kinds
//! - [`resilience`]: Connection retry

pub mod config;
pub mod clock;
pub mod ids;
pub mod storage;
pub mod batching;
pub mod resilience;
pub mod search;
pub mod ingest;
pub mod kinds;
pub mod coordinator;
pub mod metrics;

pub use config::{ConfigError, SearchEngineConfig};
pub use coordinator::{EngineError, LoadSummary, SearchEngine, SearchResponse, SearchResult};
pub use search::{QueryBuilder, ResultMapper, SchemaDefinition, SearchRequest};
pub use ingest::{BatchIngestor, LoadStats, Record};
pub use storage::traits::{StorageError, StoreClient};
pub use batching::pipeline_batcher::{BatchConfig, FlushReason};
pub use resilience::retry::RetryConfig;
pub use metrics::LatencyTimer;
