// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Search API for SearchEngine
//!
//! # Flow
//!
//! ```text
//! SearchRequest ──→ QueryBuilder ──┐
//!                                  ├─→ FT.SEARCH ──→ ResultMapper ──→ SearchResult<T>
//! Query (AST) ──→ Translator ──────┘        │
//!                                           └─ error → warn, zero results
//! ```
//!
//! Searches never fail: a missing index, a syntax error in a verbatim term,
//! or a lost connection is logged and reported as an empty result.

use tracing::{debug, info, warn};

use super::{SearchEngine, SearchResult};
use crate::metrics;
use crate::search::{FromDocument, Query, ResultMapper, SchemaDefinition, SearchRequest};

impl SearchEngine {
    /// Search with user-facing parameters.
    ///
    /// At most `config.page_limit` records are returned, fewer if the
    /// request asks for a smaller page.
    pub async fn search<T: FromDocument>(
        &self,
        schema: &SchemaDefinition,
        request: &SearchRequest,
    ) -> SearchResult<T> {
        let expression = self.query_builder.build(request, schema);
        self.execute(&schema.index_name, &expression, self.page_size(request.limit))
            .await
    }

    /// Search with a query AST, for lookups beyond the request parameters.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// # use search_engine::SearchEngine;
    /// # use search_engine::kinds::company::{self, Company};
    /// # use search_engine::search::Query;
    /// # async fn example(engine: &SearchEngine) {
    /// let query = Query::tags("tags", vec!["reliable".into()])
    ///     .and(Query::numeric_range("numberOfEmployees", Some(100.0), None));
    /// let result = engine.search_query::<Company>(&company::schema(), &query, None).await;
    /// # }
    /// ```
    pub async fn search_query<T: FromDocument>(
        &self,
        schema: &SchemaDefinition,
        query: &Query,
        limit: Option<usize>,
    ) -> SearchResult<T> {
        let expression = self.translator.translate(query);
        self.execute(&schema.index_name, &expression, self.page_size(limit))
            .await
    }

    /// Expression `search` would send for `request`
    pub fn expression_for(&self, schema: &SchemaDefinition, request: &SearchRequest) -> String {
        self.query_builder.build(request, schema)
    }

    fn page_size(&self, requested: Option<usize>) -> usize {
        let limit = self.config.page_limit;
        requested.map_or(limit, |n| n.min(limit))
    }

    async fn execute<T: FromDocument>(
        &self,
        index: &str,
        expression: &str,
        limit: usize,
    ) -> SearchResult<T> {
        let started = self.clock.now_millis();
        let _timer = metrics::LatencyTimer::new(index, "search");
        debug!(index = %index, query = %expression, limit, "Executing search");

        match self.store.search(index, expression, limit).await {
            Ok(reply) => {
                let records: Vec<T> = ResultMapper::map(&reply.documents);
                let elapsed_millis = self.clock.elapsed_since(started);
                metrics::record_search_query(index, true);
                metrics::record_search_results(records.len());
                info!(
                    index = %index,
                    query = %expression,
                    matches = reply.total,
                    returned = records.len(),
                    elapsed_ms = elapsed_millis,
                    "Search complete"
                );
                SearchResult {
                    match_count: reply.total,
                    elapsed_millis,
                    records,
                }
            }
            Err(e) => {
                metrics::record_search_query(index, false);
                if e.is_connection() {
                    metrics::record_connection_error("store");
                }
                warn!(index = %index, query = %expression, error = %e, "Search failed, returning no results");
                SearchResult::empty(self.clock.elapsed_since(started))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::config::SearchEngineConfig;
    use crate::coordinator::SearchEngine;
    use crate::ingest::Record;
    use crate::search::{Query, SchemaDefinition, SearchRequest};
    use crate::storage::memory::InMemoryStore;
    use crate::storage::traits::RawDocument;

    fn schema() -> SchemaDefinition {
        SchemaDefinition::hash("idx1", "transactions:")
            .tag("trxnId")
            .text_weighted("description", 1.0)
            .numeric("amount")
    }

    async fn loaded(n: usize, config: SearchEngineConfig) -> SearchEngine {
        let engine = SearchEngine::new(Arc::new(InMemoryStore::new()), config);
        let records: Vec<Record> = (0..n)
            .map(|i| {
                Record::new(format!("{:04}", i))
                    .with("trxnId", format!("{:04}", i))
                    .with("description", if i % 2 == 0 { "coffee" } else { "rent" })
                    .with("amount", i as f64)
            })
            .collect();
        engine.recreate_and_load(&schema(), &records).await.unwrap();
        engine
    }

    #[tokio::test]
    async fn test_match_all() {
        let engine = loaded(3, SearchEngineConfig::default()).await;
        let result = engine.search::<RawDocument>(&schema(), &SearchRequest::match_all()).await;
        assert_eq!(result.match_count, 3);
        assert_eq!(result.records.len(), 3);
    }

    #[tokio::test]
    async fn test_page_limit_caps_records() {
        let engine = loaded(100, SearchEngineConfig::default()).await;
        let result = engine.search::<RawDocument>(&schema(), &SearchRequest::match_all()).await;
        assert_eq!(result.match_count, 100);
        assert_eq!(result.records.len(), 40);

        let request = SearchRequest::match_all().with_limit(5);
        assert_eq!(engine.search::<RawDocument>(&schema(), &request).await.records.len(), 5);

        let request = SearchRequest::match_all().with_limit(500);
        assert_eq!(engine.search::<RawDocument>(&schema(), &request).await.records.len(), 40);
    }

    #[tokio::test]
    async fn test_term_and_min_amount() {
        let engine = loaded(10, SearchEngineConfig::default()).await;
        let request = SearchRequest::new("coffee").with_min(5.0);
        let result = engine.search::<RawDocument>(&schema(), &request).await;
        // coffee rows are even amounts: 6 and 8
        assert_eq!(result.match_count, 2);
    }

    #[tokio::test]
    async fn test_no_match() {
        let engine = loaded(3, SearchEngineConfig::default()).await;
        let result = engine.search::<RawDocument>(&schema(), &SearchRequest::new("zzzz")).await;
        assert_eq!(result.match_count, 0);
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_missing_index_returns_empty() {
        let engine = SearchEngine::new(Arc::new(InMemoryStore::new()), SearchEngineConfig::default());
        let result = engine.search::<RawDocument>(&schema(), &SearchRequest::match_all()).await;
        assert_eq!(result.match_count, 0);
    }

    #[tokio::test]
    async fn test_syntax_error_returns_empty() {
        let engine = loaded(3, SearchEngineConfig::default()).await;
        let result = engine.search::<RawDocument>(&schema(), &SearchRequest::new("coffee)")).await;
        assert_eq!(result.match_count, 0);
    }

    #[tokio::test]
    async fn test_deeply_nested_term_returns_empty() {
        let engine = loaded(3, SearchEngineConfig::default()).await;
        let request = SearchRequest::new("(".repeat(5_000));
        let result = engine.search::<RawDocument>(&schema(), &request).await;
        assert_eq!(result.match_count, 0);
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_escaping_from_config() {
        let config = SearchEngineConfig {
            escape_terms: true,
            ..Default::default()
        };
        let engine = loaded(3, config).await;
        assert_eq!(
            engine.expression_for(&schema(), &SearchRequest::new("a|b")),
            "@description:a\\|b"
        );
    }

    #[tokio::test]
    async fn test_query_ast() {
        let engine = loaded(10, SearchEngineConfig::default()).await;
        let query = Query::field_eq("description", "rent").and(Query::numeric_range("amount", None, Some(4.0)));
        let result = engine.search_query::<RawDocument>(&schema(), &query, None).await;
        // rent rows are odd amounts: 1 and 3
        assert_eq!(result.match_count, 2);
    }
}
