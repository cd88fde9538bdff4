//! Property-based tests for loading, query construction and result mapping.
//!
//! Uses proptest to generate record sets, batch sizes and arbitrary query
//! input, and checks the counting and totality guarantees hold for all of
//! them.
//!
//! Run with: `cargo test --test proptest_fuzz`

use std::collections::BTreeSet;
use std::sync::Arc;

use proptest::prelude::*;

use search_engine::batching::pipeline_batcher::{BatchConfig, FlushReason, PipelineBatcher};
use search_engine::ingest::{BatchIngestor, Record};
use search_engine::search::{
    NumericRange, QueryBuilder, ResultMapper, SchemaDefinition, SearchRequest, TermEscaping,
};
use search_engine::storage::expression::Expression;
use search_engine::storage::memory::InMemoryStore;
use search_engine::storage::traits::{RawDocument, WriteCommand};

fn schema() -> SchemaDefinition {
    SchemaDefinition::hash("idx1", "transactions:")
        .tag("trxnId")
        .text_weighted("description", 1.0)
        .numeric("amount")
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

// =============================================================================
// Strategies
// =============================================================================

/// Records with distinct ids; `true` entries get a blank id and are rejected
fn record_set_strategy() -> impl Strategy<Value = Vec<Record>> {
    prop::collection::vec(any::<bool>(), 0..400).prop_map(|invalid| {
        invalid
            .into_iter()
            .enumerate()
            .map(|(i, bad)| {
                let id = if bad { " ".to_string() } else { format!("{:08}", i) };
                Record::new(id)
                    .with("trxnId", format!("{:08}", i))
                    .with("description", "coffee")
                    .with("amount", i as f64)
            })
            .collect()
    })
}

fn request_strategy() -> impl Strategy<Value = SearchRequest> {
    (
        ".{0,20}",
        prop::option::of((prop::option::of(-1e6f64..1e6), prop::option::of(-1e6f64..1e6))),
        prop::option::of(prop::collection::btree_set("[a-z]{1,8}", 0..5)),
        prop::option::of(1usize..100),
    )
        .prop_map(|(term, range, tags, limit)| {
            let mut request = SearchRequest::new(term);
            request.numeric_range = range.map(|(min, max)| NumericRange::new(min, max));
            request.tag_filter = tags;
            request.limit = limit;
            request
        })
}

// =============================================================================
// Load Counting Tests
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Every valid record is written, every invalid one is skipped, and the
    /// number of pipelines is the ceiling of written / batch size.
    #[test]
    fn prop_load_counts(records in record_set_strategy(), batch_size in 1usize..64) {
        let failures = records.iter().filter(|r| r.id.trim().is_empty()).count();
        let store = Arc::new(InMemoryStore::new());
        let ingestor = BatchIngestor::new(store.clone()).with_batch_size(batch_size);

        let stats = runtime().block_on(ingestor.load(&records, &schema())).unwrap();

        prop_assert_eq!(stats.count, records.len() - failures);
        prop_assert_eq!(stats.skipped, failures);
        prop_assert_eq!(stats.flushes, stats.count.div_ceil(batch_size));
        prop_assert_eq!(store.flush_count(), stats.flushes);
        prop_assert_eq!(store.len(), stats.count);
    }

    /// Batches never exceed the configured count and nothing is lost
    #[test]
    fn prop_batcher_bounds(count in 0usize..500, flush_count in 1usize..50) {
        let mut batcher = PipelineBatcher::new(BatchConfig::with_count(flush_count));
        let mut batches = Vec::new();
        for i in 0..count {
            let command = WriteCommand::Hash {
                key: format!("k:{}", i),
                fields: vec![("n".to_string(), i.to_string())],
            };
            if let Some(reason) = batcher.add(command) {
                batches.extend(batcher.take(reason));
            }
        }
        batches.extend(batcher.take(FlushReason::Final));

        prop_assert!(batches.iter().all(|b| !b.items.is_empty() && b.items.len() <= flush_count));
        prop_assert_eq!(batches.iter().map(|b| b.items.len()).sum::<usize>(), count);
        prop_assert!(batcher.is_empty());
    }
}

// =============================================================================
// Query Builder Totality Tests
// =============================================================================

proptest! {
    /// Building never panics and never produces an empty expression
    #[test]
    fn prop_build_is_total(request in request_strategy()) {
        for escaping in [TermEscaping::Verbatim, TermEscaping::Escape] {
            let expr = QueryBuilder::new(escaping).build(&request, &schema());
            prop_assert!(!expr.is_empty());
            prop_assert_eq!(&expr, &QueryBuilder::new(escaping).build(&request, &schema()));
        }
    }

    /// Wildcard terms without filters always build to `*`
    #[test]
    fn prop_wildcard(blank in "[ \t]{0,5}", star in any::<bool>()) {
        let term = if star { format!("{}*{}", blank, blank) } else { blank };
        prop_assert_eq!(QueryBuilder::default().build(&SearchRequest::new(term), &schema()), "*");
    }

    /// Tag clauses depend on the set, not the order values were given in
    #[test]
    fn prop_tag_order_irrelevant(mut tags in prop::collection::vec("[a-z]{1,8}", 1..6)) {
        let schema = SchemaDefinition::hash("company-idx", "companies:").text("name").tag("tags");
        let builder = QueryBuilder::default();
        let forward = builder.build(&SearchRequest::match_all().with_tags(tags.clone()), &schema);
        tags.reverse();
        let reversed = builder.build(&SearchRequest::match_all().with_tags(tags.clone()), &schema);
        prop_assert_eq!(&forward, &reversed);

        let expected: BTreeSet<String> = tags.into_iter().collect();
        let members: BTreeSet<String> = forward
            .trim_start_matches("@tags:{")
            .trim_end_matches('}')
            .split('|')
            .map(str::to_string)
            .collect();
        prop_assert_eq!(members, expected);
    }

    /// Escaped terms always parse in the local evaluator
    #[test]
    fn prop_escaped_terms_parse(term in "[a-zA-Z0-9 |(){}@:\\-*]{1,20}") {
        let request = SearchRequest::new(term);
        let expr = QueryBuilder::new(TermEscaping::Escape).build(&request, &schema());
        prop_assert!(Expression::parse(&expr).is_ok(), "failed to parse {}", expr);
    }

    /// The evaluator returns errors, not panics, on arbitrary input
    #[test]
    fn fuzz_expression_parse(input in ".{0,64}") {
        let _ = Expression::parse(&input);
    }
}

// =============================================================================
// Result Mapping Tests
// =============================================================================

proptest! {
    /// Mapping keeps every document, in order
    #[test]
    fn prop_mapper_keeps_all(
        docs in prop::collection::vec(
            ("[a-z]{1,8}", prop::collection::hash_map("[a-z$]{1,6}", ".{0,20}", 0..5)),
            0..50,
        )
    ) {
        let docs: Vec<RawDocument> = docs
            .into_iter()
            .map(|(key, fields)| RawDocument { key, fields })
            .collect();
        let mapped: Vec<RawDocument> = ResultMapper::map(&docs);
        prop_assert_eq!(mapped.len(), docs.len());
        for (original, mapped) in docs.iter().zip(&mapped) {
            prop_assert_eq!(&original.key, &mapped.key);
        }
    }
}
