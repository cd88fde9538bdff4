// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Record model and bulk ingestion.

mod ingestor;
mod record;

pub use ingestor::{BatchIngestor, IngestError, LoadStats, WriteSession, DEFAULT_BATCH_SIZE};
pub use record::{encode, FieldValue, Record, RecordError};
