// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Query Builder
//!
//! Turns user-facing search parameters into one RediSearch expression.
//!
//! # Rules
//!
//! ```text
//! term "*" and no filters        → *
//! term on one field              → @description:coffee
//! term on several fields         → (@securityName:ACME)|(@symbol:{ACME})
//! numeric range                  → @amount:[50.000000,<max>]
//! tag set                        → @tags:{fast|scalable}
//! geo radius                     → @location:[-122.06 37.37 10 km]
//! ```
//!
//! Clauses are joined by a single space (implicit AND). A multi-field term
//! group is parenthesised when other clauses follow it.

use std::collections::BTreeSet;

use tracing::debug;

use super::query::GeoUnit;
use super::schema::{FieldSpec, FieldType, SchemaDefinition};
use super::translator::{numeric_range, TermEscaping};

/// Numeric range filter. Missing sides are open.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NumericRange {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl NumericRange {
    pub fn new(min: Option<f64>, max: Option<f64>) -> Self {
        Self { min, max }
    }

    pub fn at_least(min: f64) -> Self {
        Self::new(Some(min), None)
    }

    pub fn between(min: f64, max: f64) -> Self {
        Self::new(Some(min), Some(max))
    }
}

/// Point and radius filter
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoFilter {
    pub lon: f64,
    pub lat: f64,
    pub radius: f64,
    pub unit: GeoUnit,
}

/// User-facing search parameters
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    /// Free-text term; `*` matches everything
    pub term: String,
    pub numeric_range: Option<NumericRange>,
    pub tag_filter: Option<BTreeSet<String>>,
    pub geo_filter: Option<GeoFilter>,
    /// Page size; the engine's configured page limit applies when unset
    pub limit: Option<usize>,
}

impl Default for SearchRequest {
    fn default() -> Self {
        Self::match_all()
    }
}

impl SearchRequest {
    pub fn new(term: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            numeric_range: None,
            tag_filter: None,
            geo_filter: None,
            limit: None,
        }
    }

    pub fn match_all() -> Self {
        Self::new("*")
    }

    pub fn with_range(mut self, range: NumericRange) -> Self {
        self.numeric_range = Some(range);
        self
    }

    /// Lower-bounded range, the common "amount at least" filter
    pub fn with_min(self, min: f64) -> Self {
        self.with_range(NumericRange::at_least(min))
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tag_filter = Some(tags.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_geo(mut self, lon: f64, lat: f64, radius: f64, unit: GeoUnit) -> Self {
        self.geo_filter = Some(GeoFilter {
            lon,
            lat,
            radius,
            unit,
        });
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Empty and blank terms are treated as the wildcard
    pub fn is_wildcard(&self) -> bool {
        let term = self.term.trim();
        term.is_empty() || term == "*"
    }
}

/// Builds query expressions from [`SearchRequest`]s.
///
/// `build` is total: filters whose target field is missing from the schema
/// are skipped rather than reported.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryBuilder {
    escaping: TermEscaping,
}

impl QueryBuilder {
    pub fn new(escaping: TermEscaping) -> Self {
        Self { escaping }
    }

    pub fn escaping(&self) -> TermEscaping {
        self.escaping
    }

    pub fn build(&self, request: &SearchRequest, schema: &SchemaDefinition) -> String {
        let mut clauses: Vec<String> = Vec::new();
        let mut term_group = false;

        if !request.is_wildcard() {
            let targets = schema.term_targets();
            if targets.is_empty() {
                debug!(index = %schema.index_name, "No term field in schema, term ignored");
            }
            let term = self.escaping.apply(request.term.trim());
            let parts: Vec<String> = targets.iter().map(|f| term_clause(f, &term)).collect();
            match parts.len() {
                0 => {}
                1 => clauses.extend(parts),
                _ => {
                    term_group = true;
                    clauses.push(
                        parts
                            .iter()
                            .map(|p| format!("({})", p))
                            .collect::<Vec<_>>()
                            .join("|"),
                    );
                }
            }
        }

        if let Some(range) = request.numeric_range {
            match schema.range_target() {
                Some(field) => clauses.push(format!(
                    "@{}:{}",
                    field.name,
                    numeric_range(range.min, range.max)
                )),
                None => debug!(index = %schema.index_name, "No numeric field in schema, range ignored"),
            }
        }

        if let Some(tags) = request.tag_filter.as_ref().filter(|t| !t.is_empty()) {
            match schema.tag_target() {
                Some(field) => {
                    let members = tags
                        .iter()
                        .map(|t| self.escaping.apply(t))
                        .collect::<Vec<_>>()
                        .join("|");
                    clauses.push(format!("@{}:{{{}}}", field.name, members));
                }
                None => debug!(index = %schema.index_name, "No tag field in schema, tag filter ignored"),
            }
        }

        if let Some(geo) = request.geo_filter {
            match schema.geo_target() {
                Some(field) => clauses.push(format!(
                    "@{}:[{} {} {} {}]",
                    field.name,
                    geo.lon,
                    geo.lat,
                    geo.radius,
                    geo.unit.as_str()
                )),
                None => debug!(index = %schema.index_name, "No geo field in schema, geo filter ignored"),
            }
        }

        match clauses.len() {
            0 => "*".to_string(),
            1 => clauses.remove(0),
            _ => {
                if term_group {
                    clauses[0] = format!("({})", clauses[0]);
                }
                clauses.join(" ")
            }
        }
    }
}

fn term_clause(field: &FieldSpec, term: &str) -> String {
    match field.field_type {
        FieldType::Tag => format!("@{}:{{{}}}", field.name, term),
        _ => format!("@{}:{}", field.name, term),
    }
}
