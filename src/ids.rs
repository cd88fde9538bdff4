// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Record identifier generation.

use std::sync::atomic::{AtomicU64, Ordering};

use uuid::Uuid;

pub trait IdGenerator: Send + Sync {
    fn next_id(&self) -> String;
}

/// First 8 hex characters of a random v4 UUID.
///
/// Collisions are possible on large loads; a collision overwrites the
/// earlier record with the same key.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidIdGenerator;

impl IdGenerator for UuidIdGenerator {
    fn next_id(&self) -> String {
        let mut id = Uuid::new_v4().simple().to_string();
        id.truncate(8);
        id
    }
}

/// Deterministic ids: `00000001`, `00000002`, ...
#[derive(Debug, Default)]
pub struct SequentialIdGenerator {
    next: AtomicU64,
}

impl SequentialIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn next_id(&self) -> String {
        let n = self.next.fetch_add(1, Ordering::Relaxed) + 1;
        format!("{:08}", n)
    }
}
