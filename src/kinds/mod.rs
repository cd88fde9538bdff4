// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Document kinds shipped with the engine.
//!
//! Each kind is plain data over the generic machinery: a
//! [`SchemaDefinition`](crate::search::SchemaDefinition), a way to turn its
//! source data into [`Record`](crate::ingest::Record)s, and a
//! [`FromDocument`](crate::search::FromDocument) view for search hits.
//!
//! | Kind        | Index          | Prefix          | Storage |
//! |-------------|----------------|-----------------|---------|
//! | transaction | `idx1`         | `transactions:` | hash    |
//! | security    | `security-idx` | `securities:`   | JSON    |
//! | company     | `company-idx`  | `companies:`    | JSON    |

pub mod company;
pub mod security;
pub mod transaction;
