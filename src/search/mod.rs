// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Search Infrastructure
//!
//! Secondary indexes over Redis hashes and JSON documents using RediSearch.
//!
//! # Architecture
//!
//! ```text
//! SchemaDefinition ──→ IndexManager ──→ FT.DROPINDEX / FT.CREATE
//!
//! SearchRequest ──→ QueryBuilder ──┐
//!                                  ├─→ FT.SEARCH ──→ ResultMapper ──→ T
//! Query (AST) ──→ RediSearchTranslator ┘
//! ```
//!
//! # Index Definition
//!
//! ```rust
//! use search_engine::search::{QueryBuilder, SchemaDefinition, SearchRequest};
//!
//! let schema = SchemaDefinition::hash("idx1", "transactions:")
//!     .tag("acctId")
//!     .tag("trxnId")
//!     .text_weighted("description", 1.0)
//!     .numeric("amount");
//!
//! let expr = QueryBuilder::default().build(&SearchRequest::new("coffee"), &schema);
//! assert_eq!(expr, "@description:coffee");
//! ```

mod index_manager;
mod query;
mod query_builder;
mod result_mapper;
mod schema;
mod translator;

pub use index_manager::{IndexError, IndexManager};
pub use query::{FieldOperator, FieldQuery, GeoUnit, Query, QueryNode, QueryValue};
pub use query_builder::{GeoFilter, NumericRange, QueryBuilder, SearchRequest};
pub use result_mapper::{FromDocument, ResultMapper, JSON_ROOT_FIELD};
pub use schema::{FieldSpec, FieldType, SchemaDefinition, SchemaError, SearchFields, StorageKind};
pub use translator::{
    format_bound, RediSearchTranslator, TermEscaping, NUMERIC_OPEN_MAX, NUMERIC_OPEN_MIN,
};
