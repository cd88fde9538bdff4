// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Load and search example.
//!
//! Demonstrates:
//! 1. Recreating the transaction, security and company indexes
//! 2. Pipelined loading of generated transactions
//! 3. Term, amount, identifier, tag and geo searches
//! 4. Dumping the recorded metrics
//!
//! Runs against an in-memory store by default. Pass `--redis` to use the
//! Redis Stack instance from `SEARCH_REDIS_URL` (or `redis://localhost:6379`):
//!
//! ```bash
//! docker run -d -p 6379:6379 redis/redis-stack-server:latest
//! cargo run --example load_and_search -- --redis
//! ```

use std::sync::Arc;

use metrics_util::debugging::{DebugValue, DebuggingRecorder, Snapshotter};
use search_engine::ids::UuidIdGenerator;
use search_engine::kinds::company::{self, Company};
use search_engine::kinds::security::{self, SecurityValue};
use search_engine::kinds::transaction::{self, TransactionValue};
use search_engine::search::{GeoUnit, SearchRequest};
use search_engine::storage::memory::InMemoryStore;
use search_engine::{SearchEngine, SearchEngineConfig, SearchResponse};
use tracing_subscriber::EnvFilter;

const DESCRIPTIONS: &str = "\
Coffee shop downtown
Grocery store weekly shopping
Monthly rent payment
Coffee beans subscription
Electricity bill
Airline tickets to Denver
";

const SECURITIES: [&str; 3] = [
    r#"{"securityId":"1001","securityName":"Acme Corporation","securityType":"EQUITY","cusip":"000123AB1","symbol":"ACME","isin":"US000123AB12"}"#,
    r#"{"securityId":"2001","securityName":"Bitcoin","securityType":"DIGITAL_ASSET","symbol":"BTC"}"#,
    r#"{"securityId":"3001","securityName":"Acme Call Jan","securityType":"OPTION","symbol":"ACME240119C00100000","optionType":"CALL","optionStyle":"AMERICAN"}"#,
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    recorder.install().expect("failed to install metrics recorder");

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    let config = SearchEngineConfig::load()?;
    let engine = if std::env::args().any(|arg| arg == "--redis") {
        println!("Connecting to {}", config.redis_url);
        SearchEngine::connect(config).await?
    } else {
        println!("Using in-memory store");
        SearchEngine::new(Arc::new(InMemoryStore::new()), config)
    };

    // Transactions
    let records = transaction::records_from_descriptions(DESCRIPTIONS, &UuidIdGenerator, &mut rand::thread_rng());
    let summary = engine.recreate_and_load(&transaction::schema(), &records).await?;
    println!("\n{}", summary);

    for (term, min_amount) in [("*", 0.0), ("coffee", 0.0), ("coffee", 5000.0), ("nothing", 0.0)] {
        let request = transaction::search_request(term, min_amount);
        let result = engine.search::<TransactionValue>(&transaction::schema(), &request).await;
        let response: SearchResponse<TransactionValue> = result.into();
        println!("search term={} amount>={} → {}", term, min_amount, serde_json::to_string(&response)?);
    }

    // Securities
    let records = security::records_from_json(SECURITIES);
    println!("\n{}", engine.recreate_and_load(&security::schema(), &records).await?);
    for term in ["ACME", "BTC", "US000123AB12"] {
        let result = engine.search::<SecurityValue>(&security::schema(), &SearchRequest::new(term)).await;
        println!("searchsec term={} → {}", term, serde_json::to_string(&SearchResponse::from(result))?);
    }

    // Companies
    println!("\n{}", engine.recreate_and_load(&company::schema(), &company::seed_records()).await?);
    let lookups = [
        ("by_name(Redis)", company::by_name("Redis")),
        ("near(Mountain View, 30 mi)", company::near(-122.064, 37.384, 30.0, GeoUnit::Miles)),
        ("by_tags(reliable)", company::by_tags(["reliable"])),
        ("employees_between(100, 1000)", company::employees_between(100, 1000)),
        ("name_starting_with(Mic)", company::name_starting_with("Mic")),
    ];
    for (label, query) in lookups {
        let result = engine.search_query::<Company>(&company::schema(), &query, None).await;
        let names: Vec<&str> = result.records.iter().map(|c| c.name.as_str()).collect();
        println!("{} → {:?}", label, names);
    }

    println!("\nMetrics:");
    dump_metrics(&snapshotter);
    Ok(())
}

fn dump_metrics(snapshotter: &Snapshotter) {
    let mut lines: Vec<String> = snapshotter
        .snapshot()
        .into_vec()
        .into_iter()
        .map(|(composite_key, _, _, value)| {
            let (_, key) = composite_key.into_parts();
            let labels: Vec<String> = key.labels().map(|l| format!("{}={}", l.key(), l.value())).collect();
            let labels = if labels.is_empty() {
                String::new()
            } else {
                format!("{{{}}}", labels.join(","))
            };
            let value = match value {
                DebugValue::Counter(v) => v.to_string(),
                DebugValue::Gauge(v) => format!("{:.2}", v.into_inner()),
                DebugValue::Histogram(samples) => {
                    let sum: f64 = samples.iter().map(|v| v.into_inner()).sum();
                    format!("count={} sum={:.4}", samples.len(), sum)
                }
            };
            format!("  {}{} = {}", key.name(), labels, value)
        })
        .collect();
    lines.sort();
    if lines.is_empty() {
        println!("  (no metrics recorded)");
    }
    for line in lines {
        println!("{}", line);
    }
}
