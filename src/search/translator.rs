// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! RediSearch Translator
//!
//! Translates Query AST to RediSearch FT.SEARCH syntax.
//!
//! # RediSearch Query Syntax
//!
//! ```text
//! *                         - Match all
//! @field:value              - Text match
//! @field:[min,max]          - Numeric range
//! @tags:{value1|value2}     - Tag membership
//! @field:prefix*            - Prefix match
//! @geo:[lon lat r unit]     - Geo radius
//! query1 query2             - AND (implicit)
//! query1 | query2           - OR
//! -query                    - NOT
//! (query1 query2)           - Grouping
//! ```

use super::query::{FieldOperator, FieldQuery, Query, QueryNode, QueryValue};

/// Upper bound substituted for an open-ended numeric range
pub const NUMERIC_OPEN_MAX: f64 = f32::MAX as f64;
/// Lower bound substituted for an open-ended numeric range
pub const NUMERIC_OPEN_MIN: f64 = -NUMERIC_OPEN_MAX;

/// How user-supplied terms and tag values are interpolated.
///
/// `Verbatim` hands values to the engine unchanged, so a value containing
/// query syntax changes the query. `Escape` backslash-escapes syntax
/// characters first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TermEscaping {
    #[default]
    Verbatim,
    Escape,
}

impl TermEscaping {
    pub fn apply(&self, value: &str) -> String {
        match self {
            TermEscaping::Verbatim => value.to_string(),
            TermEscaping::Escape => escape_value(value),
        }
    }
}

/// Format a numeric bound the way range clauses carry it (six decimals)
pub fn format_bound(value: f64) -> String {
    format!("{:.6}", value)
}

/// Render a numeric range clause body: `[min,max]`
pub fn numeric_range(min: Option<f64>, max: Option<f64>) -> String {
    format!(
        "[{},{}]",
        format_bound(min.unwrap_or(NUMERIC_OPEN_MIN)),
        format_bound(max.unwrap_or(NUMERIC_OPEN_MAX))
    )
}

/// Escape RediSearch syntax characters, including spaces.
fn escape_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            ',' | '.' | '<' | '>' | '{' | '}' | '[' | ']' | '"' | '\'' | ':' | ';' | '!' | '@'
            | '#' | '$' | '%' | '^' | '&' | '*' | '(' | ')' | '-' | '+' | '=' | '~' | '|'
            | '/' | '\\' | ' ' => {
                escaped.push('\\');
                escaped.push(c);
            }
            _ => escaped.push(c),
        }
    }
    escaped
}

/// RediSearch query translator
#[derive(Debug, Clone, Copy, Default)]
pub struct RediSearchTranslator {
    escaping: TermEscaping,
}

impl RediSearchTranslator {
    pub fn new(escaping: TermEscaping) -> Self {
        Self { escaping }
    }

    /// Translate Query AST to RediSearch FT.SEARCH syntax
    pub fn translate(&self, query: &Query) -> String {
        self.translate_node(&query.root)
    }

    fn translate_node(&self, node: &QueryNode) -> String {
        match node {
            QueryNode::MatchAll => "*".to_string(),
            QueryNode::Field(field_query) => self.translate_field(field_query),
            QueryNode::And(nodes) => {
                let parts: Vec<String> = nodes.iter().map(|n| self.translate_node(n)).collect();
                if parts.len() == 1 {
                    parts[0].clone()
                } else {
                    format!("({})", parts.join(" "))
                }
            }
            QueryNode::Or(nodes) => {
                let parts: Vec<String> = nodes.iter().map(|n| self.translate_node(n)).collect();
                if parts.len() == 1 {
                    parts[0].clone()
                } else {
                    format!("({})", parts.join(" | "))
                }
            }
            QueryNode::Not(inner) => {
                format!("-({})", self.translate_node(inner))
            }
        }
    }

    fn translate_field(&self, field: &FieldQuery) -> String {
        let name = escape_field_name(&field.field);

        match (&field.operator, &field.value) {
            (FieldOperator::Equals, QueryValue::Text(text)) => {
                let text = self.escaping.apply(text);
                // Multi-word values are grouped so every word binds to the field
                if text.contains(' ') && self.escaping == TermEscaping::Verbatim {
                    format!("@{}:({})", name, text)
                } else {
                    format!("@{}:{}", name, text)
                }
            }
            (FieldOperator::Equals, QueryValue::Numeric(n)) => {
                format!("@{}:{}", name, numeric_range(Some(*n), Some(*n)))
            }
            (FieldOperator::Range, QueryValue::NumericRange { min, max }) => {
                format!("@{}:{}", name, numeric_range(*min, *max))
            }
            (FieldOperator::In, QueryValue::Tags(tags)) => {
                let tag_str = tags
                    .iter()
                    .map(|t| self.escaping.apply(t))
                    .collect::<Vec<_>>()
                    .join("|");
                format!("@{}:{{{}}}", name, tag_str)
            }
            (FieldOperator::Prefix, QueryValue::Text(text)) => {
                format!("@{}:{}*", name, self.escaping.apply(text))
            }
            (
                FieldOperator::Within,
                QueryValue::GeoRadius {
                    lon,
                    lat,
                    radius,
                    unit,
                },
            ) => {
                format!("@{}:[{} {} {} {}]", name, lon, lat, radius, unit.as_str())
            }
            (operator, value) => {
                // Operator/value mismatch: render the value as a plain text match
                tracing::debug!(field = %field.field, ?operator, ?value, "Unsupported field query");
                format!("@{}:{}", name, self.escaping.apply(&value_text(value)))
            }
        }
    }
}

fn value_text(value: &QueryValue) -> String {
    match value {
        QueryValue::Text(text) => text.clone(),
        QueryValue::Numeric(n) => n.to_string(),
        QueryValue::Tags(tags) => tags.join(" "),
        QueryValue::NumericRange { min, max } => format!(
            "{} {}",
            min.map(|v| v.to_string()).unwrap_or_default(),
            max.map(|v| v.to_string()).unwrap_or_default()
        ),
        QueryValue::GeoRadius { lon, lat, .. } => format!("{} {}", lon, lat),
    }
}

fn escape_field_name(field: &str) -> String {
    // Field names with special chars need backtick escaping
    if field.contains(|c: char| !c.is_alphanumeric() && c != '_') {
        format!("`{}`", field)
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::query::GeoUnit;

    fn translate(query: &Query) -> String {
        RediSearchTranslator::default().translate(query)
    }

    #[test]
    fn test_simple_field_query() {
        assert_eq!(translate(&Query::field_eq("name", "Redis")), "@name:Redis");
    }

    #[test]
    fn test_field_with_spaces() {
        assert_eq!(translate(&Query::field_eq("name", "Redis Labs")), "@name:(Redis Labs)");
    }

    #[test]
    fn test_match_all() {
        assert_eq!(translate(&Query::match_all()), "*");
    }

    #[test]
    fn test_numeric_range() {
        let query = Query::numeric_range("numberOfEmployees", Some(100.0), Some(1000.0));
        assert_eq!(translate(&query), "@numberOfEmployees:[100.000000,1000.000000]");
    }

    #[test]
    fn test_numeric_range_open_above() {
        let query = Query::numeric_range("amount", Some(50.0), None);
        assert_eq!(
            translate(&query),
            format!("@amount:[50.000000,{}]", format_bound(NUMERIC_OPEN_MAX))
        );
    }

    #[test]
    fn test_numeric_eq() {
        assert_eq!(
            translate(&Query::numeric_eq("yearFounded", 2011.0)),
            "@yearFounded:[2011.000000,2011.000000]"
        );
    }

    #[test]
    fn test_tag_query() {
        let query = Query::tags("tags", vec!["fast".to_string(), "scalable".to_string()]);
        assert_eq!(translate(&query), "@tags:{fast|scalable}");
    }

    #[test]
    fn test_geo_query() {
        let query = Query::geo_radius("location", -122.06654, 37.37769, 10.0, GeoUnit::Kilometers);
        assert_eq!(translate(&query), "@location:[-122.06654 37.37769 10 km]");
    }

    #[test]
    fn test_prefix_query() {
        assert_eq!(translate(&Query::prefix("name", "Red")), "@name:Red*");
    }

    #[test]
    fn test_boolean_composition() {
        let query = Query::field_eq("name", "Redis")
            .and(Query::tags("tags", vec!["fast".into()]))
            .or(Query::field_eq("name", "Microsoft"));
        assert_eq!(translate(&query), "((@name:Redis @tags:{fast}) | @name:Microsoft)");
        assert_eq!(translate(&Query::field_eq("deleted", "true").negate()), "-(@deleted:true)");
    }

    #[test]
    fn test_verbatim_leaves_syntax_alone() {
        assert_eq!(translate(&Query::field_eq("email", "user@example")), "@email:user@example");
    }

    #[test]
    fn test_escaping_policy() {
        let translator = RediSearchTranslator::new(TermEscaping::Escape);
        assert_eq!(
            translator.translate(&Query::field_eq("email", "user@example.com")),
            "@email:user\\@example\\.com"
        );
        assert_eq!(
            translator.translate(&Query::tags("t", vec!["a b".into(), "c|d".into()])),
            "@t:{a\\ b|c\\|d}"
        );
    }

    #[test]
    fn test_field_name_escaping() {
        assert_eq!(translate(&Query::field_eq("first-name", "x")), "@`first-name`:x");
    }
}
