// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Index lifecycle and bulk load API for SearchEngine

use tracing::info;

use super::{EngineError, LoadSummary, SearchEngine};
use crate::ingest::{LoadStats, Record};
use crate::search::SchemaDefinition;

impl SearchEngine {
    /// Drop and recreate the index for `schema`.
    pub async fn recreate_index(&self, schema: &SchemaDefinition) -> Result<(), EngineError> {
        self.index_manager.recreate(schema).await?;
        Ok(())
    }

    /// Load records into the store without touching the index.
    pub async fn load(
        &self,
        schema: &SchemaDefinition,
        records: &[Record],
    ) -> Result<LoadStats, EngineError> {
        Ok(self.ingestor.load(records, schema).await?)
    }

    /// Recreate the index, then bulk load `records`.
    ///
    /// The reported time covers both steps.
    ///
    /// # Example
    ///
    /// ```rust
    /// # use std::sync::Arc;
    /// # use search_engine::{SearchEngine, SearchEngineConfig};
    /// # use search_engine::kinds::company;
    /// # use search_engine::storage::memory::InMemoryStore;
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let engine = SearchEngine::new(Arc::new(InMemoryStore::new()), SearchEngineConfig::default());
    /// let summary = engine
    ///     .recreate_and_load(&company::schema(), &company::seed_records())
    ///     .await?;
    /// assert!(summary.to_string().starts_with("Inserting 2 objects took"));
    /// # Ok(())
    /// # }
    /// ```
    pub async fn recreate_and_load(
        &self,
        schema: &SchemaDefinition,
        records: &[Record],
    ) -> Result<LoadSummary, EngineError> {
        let started = self.clock.now_millis();

        self.index_manager.recreate(schema).await?;
        let mut stats = self.ingestor.load(records, schema).await?;
        stats.elapsed_millis = self.clock.elapsed_since(started);

        let summary = LoadSummary {
            index: schema.index_name.clone(),
            stats,
        };
        info!(index = %summary.index, "{}", summary);
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::clock::ManualClock;
    use crate::config::SearchEngineConfig;
    use crate::coordinator::{EngineError, SearchEngine};
    use crate::ingest::Record;
    use crate::search::{IndexError, SchemaDefinition};
    use crate::storage::memory::InMemoryStore;

    fn schema() -> SchemaDefinition {
        SchemaDefinition::hash("idx1", "transactions:")
            .tag("trxnId")
            .text_weighted("description", 1.0)
            .numeric("amount")
    }

    fn engine(store: &Arc<InMemoryStore>) -> SearchEngine {
        SearchEngine::new(store.clone(), SearchEngineConfig::default())
    }

    #[tokio::test]
    async fn test_recreate_and_load() {
        let store = Arc::new(InMemoryStore::new());
        let records: Vec<Record> = (0..3)
            .map(|i| Record::new(i.to_string()).with("description", "coffee").with("amount", 1.0))
            .collect();

        let summary = engine(&store).recreate_and_load(&schema(), &records).await.unwrap();
        assert_eq!(summary.stats.count, 3);
        assert_eq!(summary.stats.flushes, 1);
        assert!(store.has_index("idx1"));
        assert_eq!(store.len(), 3);
    }

    #[tokio::test]
    async fn test_byte_limit_from_config() {
        let store = Arc::new(InMemoryStore::new());
        let config = SearchEngineConfig {
            batch_bytes: Some(1),
            ..Default::default()
        };
        let engine = SearchEngine::new(store.clone(), config)
            .with_clock(Arc::new(ManualClock::new(0)));
        let records: Vec<Record> = (0..3)
            .map(|i| Record::new(i.to_string()).with("description", "coffee"))
            .collect();

        let summary = engine.recreate_and_load(&schema(), &records).await.unwrap();
        assert_eq!(summary.stats.flushes, 3);
        assert_eq!(store.flush_count(), 3);
    }

    #[tokio::test]
    async fn test_reported_time_covers_recreate() {
        let store = Arc::new(InMemoryStore::new());
        let engine = engine(&store).with_clock(Arc::new(ManualClock::with_step(0, 10)));
        let summary = engine.recreate_and_load(&schema(), &[]).await.unwrap();
        // start, load start, load end, end
        assert_eq!(summary.stats.elapsed_millis, 30);
        assert_eq!(summary.to_string(), "Inserting 0 objects took 30 milliseconds");
    }

    #[tokio::test]
    async fn test_invalid_schema_loads_nothing() {
        let store = Arc::new(InMemoryStore::new());
        let records = vec![Record::new("1").with("description", "coffee")];
        let err = engine(&store)
            .recreate_and_load(&SchemaDefinition::hash("idx1", "transactions:"), &records)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Index(IndexError::InvalidSchema(_))));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_store_down() {
        let store = Arc::new(InMemoryStore::new());
        store.set_unavailable(true);
        let err = engine(&store).recreate_index(&schema()).await.unwrap_err();
        assert!(matches!(err, EngineError::Index(IndexError::Unavailable(_))));
    }

    #[tokio::test]
    async fn test_load_without_recreate() {
        let store = Arc::new(InMemoryStore::new());
        let records = vec![Record::new("1").with("description", "coffee")];
        let stats = engine(&store).load(&schema(), &records).await.unwrap();
        assert_eq!(stats.count, 1);
        assert!(!store.has_index("idx1"));
    }
}
