// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Metrics instrumentation for search-engine.
//!
//! Uses the `metrics` crate for backend-agnostic metrics collection.
//! The host process is responsible for choosing the exporter (Prometheus, OTEL, etc.)
//!
//! # Metric Naming Convention
//! - `search_engine_` prefix for all metrics
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//! - `_bytes` suffix for size histograms
//!
//! # Labels
//! - `index`: index name
//! - `operation`: drop, create, load, search
//! - `status`: success, failure

use metrics::{counter, gauge, histogram};
use std::time::{Duration, Instant};

fn status(success: bool) -> &'static str {
    if success {
        "success"
    } else {
        "failure"
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// INDEX LIFECYCLE
// ═══════════════════════════════════════════════════════════════════════════

/// Record index creation/drop
pub fn record_index_operation(index: &str, operation: &str, success: bool) {
    counter!(
        "search_engine_index_operations_total",
        "index" => index.to_string(),
        "operation" => operation.to_string(),
        "status" => status(success)
    )
    .increment(1);
}

// ═══════════════════════════════════════════════════════════════════════════
// INGEST - Batched loading
// ═══════════════════════════════════════════════════════════════════════════

/// Record a flushed batch
pub fn record_batch_flush(index: &str, count: usize, bytes: usize, duration: Duration) {
    counter!(
        "search_engine_batches_total",
        "index" => index.to_string()
    )
    .increment(1);
    histogram!(
        "search_engine_batch_size",
        "index" => index.to_string()
    )
    .record(count as f64);
    histogram!(
        "search_engine_batch_bytes",
        "index" => index.to_string()
    )
    .record(bytes as f64);
    histogram!("search_engine_flush_seconds").record(duration.as_secs_f64());
}

/// Record records written by a load
pub fn record_records_loaded(index: &str, count: usize) {
    counter!(
        "search_engine_records_loaded_total",
        "index" => index.to_string()
    )
    .increment(count as u64);
}

/// Record records skipped because they could not be serialized
pub fn record_records_skipped(index: &str, count: usize) {
    counter!(
        "search_engine_records_skipped_total",
        "index" => index.to_string()
    )
    .increment(count as u64);
}

/// Set records buffered in the open batch
pub fn set_batch_queue_items(count: usize) {
    gauge!("search_engine_batch_queue_items").set(count as f64);
}

// ═══════════════════════════════════════════════════════════════════════════
// SEARCH
// ═══════════════════════════════════════════════════════════════════════════

/// Record a search query execution
pub fn record_search_query(index: &str, success: bool) {
    counter!(
        "search_engine_search_queries_total",
        "index" => index.to_string(),
        "status" => status(success)
    )
    .increment(1);
}

/// Record search result count
pub fn record_search_results(count: usize) {
    histogram!("search_engine_search_results").record(count as f64);
}

// ═══════════════════════════════════════════════════════════════════════════
// ERRORS
// ═══════════════════════════════════════════════════════════════════════════

/// Record a connection/backend error
pub fn record_connection_error(backend: &str) {
    counter!(
        "search_engine_connection_errors_total",
        "backend" => backend.to_string()
    )
    .increment(1);
}

/// Helper to time operations.
///
/// Records into `search_engine_operation_seconds` when dropped.
pub struct LatencyTimer {
    index: String,
    operation: &'static str,
    start: Instant,
}

impl LatencyTimer {
    pub fn new(index: &str, operation: &'static str) -> Self {
        Self {
            index: index.to_string(),
            operation,
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Drop for LatencyTimer {
    fn drop(&mut self) {
        histogram!(
            "search_engine_operation_seconds",
            "index" => self.index.clone(),
            "operation" => self.operation
        )
        .record(self.start.elapsed().as_secs_f64());
    }
}
