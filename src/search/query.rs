// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Query AST for search queries
//!
//! Each lookup a document kind supports (by name, by tag, by numeric value or
//! range, near a point, by prefix) is one constructor here; the
//! [`RediSearchTranslator`](super::RediSearchTranslator) renders the tree.
//!
//! # Example
//!
//! ```rust
//! use search_engine::search::{GeoUnit, Query};
//!
//! let query = Query::tags("tags", vec!["fast".into(), "reliable".into()])
//!     .and(Query::numeric_range("numberOfEmployees", Some(100.0), Some(1000.0)));
//!
//! let near = Query::geo_radius("location", -122.06654, 37.37769, 10.0, GeoUnit::Kilometers);
//! # let _ = (query, near);
//! ```

use serde::{Deserialize, Serialize};

/// Search query AST
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Query {
    /// Root query node
    pub root: QueryNode,
}

impl Query {
    /// Create a new query from a root node
    pub fn new(root: QueryNode) -> Self {
        Self { root }
    }

    /// Match every document: `*`
    pub fn match_all() -> Self {
        Self::new(QueryNode::MatchAll)
    }

    fn field(field: impl Into<String>, operator: FieldOperator, value: QueryValue) -> Self {
        Self::new(QueryNode::Field(FieldQuery {
            field: field.into(),
            operator,
            value,
        }))
    }

    /// Text match against a field: @field:value
    pub fn field_eq(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::field(field, FieldOperator::Equals, QueryValue::Text(value.into()))
    }

    /// Tag membership: @tags:{value1|value2}
    pub fn tags(field: impl Into<String>, values: Vec<String>) -> Self {
        Self::field(field, FieldOperator::In, QueryValue::Tags(values))
    }

    /// Numeric equality: @field:[value value]
    pub fn numeric_eq(field: impl Into<String>, value: f64) -> Self {
        Self::field(field, FieldOperator::Equals, QueryValue::Numeric(value))
    }

    /// Numeric range, unbounded sides left open: @field:[min max]
    pub fn numeric_range(field: impl Into<String>, min: Option<f64>, max: Option<f64>) -> Self {
        Self::field(field, FieldOperator::Range, QueryValue::NumericRange { min, max })
    }

    /// Prefix match: @field:prefix*
    pub fn prefix(field: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self::field(field, FieldOperator::Prefix, QueryValue::Text(prefix.into()))
    }

    /// Geo radius: @field:[lon lat radius unit]
    pub fn geo_radius(
        field: impl Into<String>,
        lon: f64,
        lat: f64,
        radius: f64,
        unit: GeoUnit,
    ) -> Self {
        Self::field(
            field,
            FieldOperator::Within,
            QueryValue::GeoRadius {
                lon,
                lat,
                radius,
                unit,
            },
        )
    }

    /// Combine with AND
    pub fn and(self, other: Query) -> Self {
        Self::new(QueryNode::And(vec![self.root, other.root]))
    }

    /// Combine with OR
    pub fn or(self, other: Query) -> Self {
        Self::new(QueryNode::Or(vec![self.root, other.root]))
    }

    /// Negate query
    pub fn negate(self) -> Self {
        Self::new(QueryNode::Not(Box::new(self.root)))
    }
}

/// Query AST node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum QueryNode {
    /// Every document: *
    MatchAll,
    /// Field query: @field:value
    Field(FieldQuery),
    /// Boolean AND: (query1 query2)
    And(Vec<QueryNode>),
    /// Boolean OR: (query1 | query2)
    Or(Vec<QueryNode>),
    /// Boolean NOT: -query
    Not(Box<QueryNode>),
}

/// Field query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldQuery {
    /// Field name (e.g., "name", "numberOfEmployees", "tags")
    pub field: String,
    /// Comparison operator
    pub operator: FieldOperator,
    /// Query value
    pub value: QueryValue,
}

/// Field comparison operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldOperator {
    /// Text or numeric match
    Equals,
    /// Numeric range: @field:[min max]
    Range,
    /// Tag membership: @tags:{value1|value2}
    In,
    /// Prefix match: @field:prefix*
    Prefix,
    /// Geo radius: @field:[lon lat radius unit]
    Within,
}

/// Distance units understood by RediSearch geo filters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GeoUnit {
    Meters,
    Kilometers,
    Miles,
    Feet,
}

impl GeoUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            GeoUnit::Meters => "m",
            GeoUnit::Kilometers => "km",
            GeoUnit::Miles => "mi",
            GeoUnit::Feet => "ft",
        }
    }

    /// Parse the RediSearch unit keyword
    pub fn parse(unit: &str) -> Option<Self> {
        match unit.to_ascii_lowercase().as_str() {
            "m" => Some(GeoUnit::Meters),
            "km" => Some(GeoUnit::Kilometers),
            "mi" => Some(GeoUnit::Miles),
            "ft" => Some(GeoUnit::Feet),
            _ => None,
        }
    }

    pub fn to_meters(&self, distance: f64) -> f64 {
        match self {
            GeoUnit::Meters => distance,
            GeoUnit::Kilometers => distance * 1000.0,
            GeoUnit::Miles => distance * 1609.344,
            GeoUnit::Feet => distance * 0.3048,
        }
    }
}

/// Query value type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum QueryValue {
    /// Text value
    Text(String),
    /// Numeric value
    Numeric(f64),
    /// Numeric range [min, max]
    NumericRange { min: Option<f64>, max: Option<f64> },
    /// Tag values (OR semantics)
    Tags(Vec<String>),
    /// Point and radius
    GeoRadius {
        lon: f64,
        lat: f64,
        radius: f64,
        unit: GeoUnit,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_field_query() {
        let query = Query::field_eq("name", "Redis");
        assert_eq!(
            query.root,
            QueryNode::Field(FieldQuery {
                field: "name".to_string(),
                operator: FieldOperator::Equals,
                value: QueryValue::Text("Redis".to_string()),
            })
        );
    }

    #[test]
    fn test_and_or_not() {
        let query = Query::field_eq("name", "Redis")
            .and(Query::numeric_eq("yearFounded", 2011.0))
            .or(Query::prefix("name", "Micro"))
            .negate();

        let QueryNode::Not(inner) = query.root else {
            panic!("Expected Not node");
        };
        let QueryNode::Or(alternatives) = *inner else {
            panic!("Expected Or node");
        };
        assert_eq!(alternatives.len(), 2);
        assert!(matches!(alternatives[0], QueryNode::And(ref nodes) if nodes.len() == 2));
    }

    #[test]
    fn test_geo_query() {
        let query = Query::geo_radius("location", -122.0, 37.0, 5.0, GeoUnit::Miles);
        match query.root {
            QueryNode::Field(FieldQuery { operator, value, .. }) => {
                assert_eq!(operator, FieldOperator::Within);
                assert!(matches!(value, QueryValue::GeoRadius { unit: GeoUnit::Miles, .. }));
            }
            _ => panic!("Expected Field node"),
        }
    }

    #[test]
    fn test_geo_units() {
        assert_eq!(GeoUnit::parse("KM"), Some(GeoUnit::Kilometers));
        assert_eq!(GeoUnit::parse("yd"), None);
        assert_eq!(GeoUnit::Kilometers.to_meters(2.5), 2500.0);
        assert_eq!(GeoUnit::Miles.as_str(), "mi");
    }
}
