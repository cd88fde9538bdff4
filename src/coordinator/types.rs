// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::config::ConfigError;
use crate::ingest::{IngestError, LoadStats};
use crate::search::IndexError;
use crate::storage::traits::StorageError;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Index(#[from] IndexError),
    #[error(transparent)]
    Ingest(#[from] IngestError),
}

/// Result of a recreate-and-load run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadSummary {
    pub index: String,
    pub stats: LoadStats,
}

impl fmt::Display for LoadSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Inserting {} objects took {} milliseconds",
            self.stats.count, self.stats.elapsed_millis
        )
    }
}

/// One page of typed search results.
///
/// `match_count` is the store's total for the query; `records` holds at most
/// one page of it.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult<T> {
    pub match_count: usize,
    pub elapsed_millis: u64,
    pub records: Vec<T>,
}

impl<T> SearchResult<T> {
    pub fn empty(elapsed_millis: u64) -> Self {
        Self {
            match_count: 0,
            elapsed_millis,
            records: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Convert each record, e.g. into a response view type
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> SearchResult<U> {
        SearchResult {
            match_count: self.match_count,
            elapsed_millis: self.elapsed_millis,
            records: self.records.into_iter().map(f).collect(),
        }
    }
}

/// Wire shape of a search result: `{"numFound": n, "time": ms, "values": [...]}`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResponse<T> {
    #[serde(rename = "numFound")]
    pub num_found: usize,
    pub time: u64,
    pub values: Vec<T>,
}

impl<T> From<SearchResult<T>> for SearchResponse<T> {
    fn from(result: SearchResult<T>) -> Self {
        Self {
            num_found: result.match_count,
            time: result.elapsed_millis,
            values: result.records,
        }
    }
}
