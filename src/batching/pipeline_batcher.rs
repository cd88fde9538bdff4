// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Bounded batching for pipelined writes.
//!
//! The [`PipelineBatcher`] collects write commands and signals a flush when
//! the batch reaches the configured item count or (optionally) byte size.
//! Nothing is time based: a bulk load flushes the remainder explicitly.
//!
//! # Example
//!
//! ```
//! use search_engine::batching::pipeline_batcher::{BatchConfig, FlushReason, PipelineBatcher, SizedItem};
//!
//! #[derive(Clone)]
//! struct Item { data: String }
//! impl SizedItem for Item {
//!     fn size_bytes(&self) -> usize { self.data.len() }
//! }
//!
//! let mut batcher: PipelineBatcher<Item> = PipelineBatcher::new(BatchConfig::with_count(2));
//! assert!(batcher.add(Item { data: "a".into() }).is_none());
//! assert_eq!(batcher.add(Item { data: "b".into() }), Some(FlushReason::Count));
//! ```

use tracing::debug;

use crate::storage::traits::WriteCommand;

/// Batch flush trigger reason
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushReason {
    /// Item count threshold reached
    Count,
    /// Byte size threshold reached
    Size,
    /// Remainder flushed at the end of a load
    Final,
}

/// Configuration for pipeline batching
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchConfig {
    /// Flush after this many items
    pub flush_count: usize,
    /// Flush after this many bytes; unbounded when `None`
    pub flush_bytes: Option<usize>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            flush_count: 1000,
            flush_bytes: None,
        }
    }
}

impl BatchConfig {
    /// Count-only batching. A zero count is treated as one.
    pub fn with_count(flush_count: usize) -> Self {
        Self {
            flush_count: flush_count.max(1),
            flush_bytes: None,
        }
    }

    /// Also flush once the pending commands reach `flush_bytes`
    pub fn with_bytes(mut self, flush_bytes: Option<usize>) -> Self {
        self.flush_bytes = flush_bytes.map(|b| b.max(1));
        self
    }
}

/// A batch of items ready for flush
#[derive(Debug)]
pub struct FlushBatch<T> {
    pub items: Vec<T>,
    pub total_bytes: usize,
    pub reason: FlushReason,
}

/// Batcher that flushes on count or size thresholds, whichever is hit first.
pub struct PipelineBatcher<T> {
    config: BatchConfig,
    items: Vec<T>,
    total_bytes: usize,
}

impl<T: SizedItem> PipelineBatcher<T> {
    pub fn new(config: BatchConfig) -> Self {
        let capacity = config.flush_count.clamp(1, 4096);
        Self {
            config,
            items: Vec::with_capacity(capacity),
            total_bytes: 0,
        }
    }

    /// Add an item, returns flush reason if a threshold was hit
    pub fn add(&mut self, item: T) -> Option<FlushReason> {
        self.total_bytes += item.size_bytes();
        self.items.push(item);

        // Check thresholds in priority order
        if self.items.len() >= self.config.flush_count {
            Some(FlushReason::Count)
        } else if self
            .config
            .flush_bytes
            .is_some_and(|limit| self.total_bytes >= limit)
        {
            Some(FlushReason::Size)
        } else {
            None
        }
    }

    /// Take the pending items; `None` when there is nothing to flush
    pub fn take(&mut self, reason: FlushReason) -> Option<FlushBatch<T>> {
        if self.items.is_empty() {
            return None;
        }
        // Capture bytes BEFORE the reset
        let total_bytes = std::mem::take(&mut self.total_bytes);
        let items = std::mem::take(&mut self.items);
        debug!(count = items.len(), bytes = total_bytes, ?reason, "Batch taken for flush");
        Some(FlushBatch {
            items,
            total_bytes,
            reason,
        })
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Get current batch stats: (items, bytes)
    #[must_use]
    pub fn stats(&self) -> (usize, usize) {
        (self.items.len(), self.total_bytes)
    }
}

/// Trait for items that know their own size
pub trait SizedItem {
    #[must_use]
    fn size_bytes(&self) -> usize;
}

impl SizedItem for WriteCommand {
    fn size_bytes(&self) -> usize {
        WriteCommand::size_bytes(self)
    }
}
