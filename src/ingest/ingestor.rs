// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Bulk loading through pipelined, bounded batches.
//!
//! ```text
//! records ──par_iter──→ encode ──→ WriteSession ──(every N)──→ write_batch ──→ store
//!                         │                         └──(end)──→ write_batch (remainder)
//!                         └─ RecordError → warn + skipped
//! ```
//!
//! Encoding runs on the rayon pool; enqueueing and flushing stay sequential
//! so the next batch is only built after the previous one was acknowledged.

use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::record::{encode, Record, RecordError};
use crate::batching::pipeline_batcher::{BatchConfig, FlushReason, PipelineBatcher};
use crate::clock::{Clock, SystemClock};
use crate::metrics;
use crate::search::SchemaDefinition;
use crate::storage::traits::{StorageError, StoreClient, WriteCommand};

/// Default pipeline size
pub const DEFAULT_BATCH_SIZE: usize = 1000;

#[derive(Error, Debug)]
pub enum IngestError {
    /// The store failed mid-load. Batches flushed before the failure remain written.
    ///
    /// `sent` counts acknowledged batches only. Pipelines are not atomic, so
    /// when the store rejects a single command the rest of that batch may
    /// already be stored and `sent` is a lower bound.
    #[error("Store failed after {sent} records in {flushes} batches: {source}")]
    Store {
        sent: usize,
        flushes: usize,
        #[source]
        source: StorageError,
    },
}

/// Outcome of one load
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoadStats {
    /// Records written
    pub count: usize,
    /// Records rejected before writing
    pub skipped: usize,
    /// Batches sent
    pub flushes: usize,
    pub elapsed_millis: u64,
}

/// An open pipeline against the store.
///
/// Commands are buffered until the batch threshold, then sent and awaited.
pub struct WriteSession<'a> {
    store: &'a dyn StoreClient,
    index: &'a str,
    batcher: PipelineBatcher<WriteCommand>,
    sent: usize,
    flushes: usize,
}

impl<'a> WriteSession<'a> {
    pub fn new(store: &'a dyn StoreClient, index: &'a str, config: BatchConfig) -> Self {
        Self {
            store,
            index,
            batcher: PipelineBatcher::new(config),
            sent: 0,
            flushes: 0,
        }
    }

    /// Buffer a command, flushing if the batch is full
    pub async fn enqueue(&mut self, command: WriteCommand) -> Result<(), IngestError> {
        if let Some(reason) = self.batcher.add(command) {
            self.flush(reason).await?;
        }
        Ok(())
    }

    async fn flush(&mut self, reason: FlushReason) -> Result<(), IngestError> {
        let Some(batch) = self.batcher.take(reason) else {
            return Ok(());
        };
        let started = Instant::now();
        let count = batch.items.len();

        if let Err(source) = self.store.write_batch(&batch.items).await {
            if source.is_connection() {
                metrics::record_connection_error("store");
            }
            return Err(IngestError::Store {
                sent: self.sent,
                flushes: self.flushes,
                source,
            });
        }

        self.sent += count;
        self.flushes += 1;
        metrics::record_batch_flush(self.index, count, batch.total_bytes, started.elapsed());
        metrics::set_batch_queue_items(self.batcher.len());
        debug!(index = %self.index, count, ?reason, flushes = self.flushes, "Batch flushed");
        Ok(())
    }

    /// Flush the remainder. Returns `(sent, flushes)`.
    pub async fn finish(mut self) -> Result<(usize, usize), IngestError> {
        self.flush(FlushReason::Final).await?;
        Ok((self.sent, self.flushes))
    }
}

pub struct BatchIngestor {
    store: Arc<dyn StoreClient>,
    clock: Arc<dyn Clock>,
    config: BatchConfig,
}

impl BatchIngestor {
    pub fn new(store: Arc<dyn StoreClient>) -> Self {
        Self {
            store,
            clock: Arc::new(SystemClock),
            config: BatchConfig::with_count(DEFAULT_BATCH_SIZE),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.config = BatchConfig::with_count(batch_size);
        self
    }

    pub fn with_batch_config(mut self, config: BatchConfig) -> Self {
        self.config = config;
        self
    }

    pub fn batch_size(&self) -> usize {
        self.config.flush_count
    }

    /// Write every valid record to the store under `schema`'s key prefix.
    ///
    /// Invalid records are logged and counted in `skipped`. Zero records
    /// means zero flushes.
    pub async fn load(
        &self,
        records: &[Record],
        schema: &SchemaDefinition,
    ) -> Result<LoadStats, IngestError> {
        let started = self.clock.now_millis();
        let _timer = metrics::LatencyTimer::new(&schema.index_name, "load");

        let encoded: Vec<Result<WriteCommand, RecordError>> =
            records.par_iter().map(|record| encode(record, schema)).collect();

        let mut session = WriteSession::new(self.store.as_ref(), &schema.index_name, self.config.clone());
        let mut skipped = 0;
        for (record, result) in records.iter().zip(encoded) {
            match result {
                Ok(command) => session.enqueue(command).await?,
                Err(e) => {
                    warn!(index = %schema.index_name, id = %record.id, error = %e, "Skipping record");
                    skipped += 1;
                }
            }
        }
        let (count, flushes) = session.finish().await?;

        metrics::record_records_loaded(&schema.index_name, count);
        if skipped > 0 {
            metrics::record_records_skipped(&schema.index_name, skipped);
        }

        let stats = LoadStats {
            count,
            skipped,
            flushes,
            elapsed_millis: self.clock.elapsed_since(started),
        };
        info!(
            index = %schema.index_name,
            count = stats.count,
            skipped = stats.skipped,
            flushes = stats.flushes,
            elapsed_ms = stats.elapsed_millis,
            "Load complete"
        );
        Ok(stats)
    }
}
