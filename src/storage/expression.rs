// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Evaluator for the RediSearch expression subset emitted by this crate.
//!
//! ```text
//! *                          - Match all
//! word  word*                - Text term / prefix on any TEXT field
//! @field:word                - Text term on one field
//! @field:(w1 w2)             - Grouped terms on one field
//! @field:{a|b}               - Tag membership
//! @field:[min,max]           - Numeric range ("(" exclusive, -inf/+inf)
//! @field:[lon lat r unit]    - Geo radius
//! a b                        - AND
//! a | b                      - OR (binds loosest)
//! -a                         - NOT
//! ( ... )                    - Grouping
//! ```
//!
//! Matching is case-insensitive. Text fields are tokenized on
//! non-alphanumeric characters; tag fields are split on `,`.

use std::collections::HashMap;

use thiserror::Error;

use crate::search::{FieldType, GeoUnit};

/// Mean earth radius in meters, as used by Redis geo commands
const EARTH_RADIUS_M: f64 = 6_372_797.560856;

/// Deepest nesting of groups and negations accepted
const MAX_DEPTH: usize = 128;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExpressionError {
    #[error("Syntax error at offset {offset}: {message}")]
    Syntax { offset: usize, message: String },
}

/// Indexed view of one document: field name → type and raw values
#[derive(Debug, Clone, Default)]
pub struct IndexedFields {
    fields: HashMap<String, (FieldType, Vec<String>)>,
}

impl IndexedFields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, field_type: FieldType, values: Vec<String>) {
        self.fields.insert(name.into(), (field_type, values));
    }

    fn get(&self, name: &str) -> Option<&(FieldType, Vec<String>)> {
        self.fields.get(name)
    }

    fn text_values(&self) -> impl Iterator<Item = &String> {
        self.fields
            .values()
            .filter(|(t, _)| *t == FieldType::Text)
            .flat_map(|(_, values)| values.iter())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Bound {
    value: f64,
    exclusive: bool,
}

#[derive(Debug, Clone, PartialEq)]
enum Node {
    All,
    Term {
        field: Option<String>,
        word: String,
        prefix: bool,
    },
    Tags {
        field: String,
        values: Vec<String>,
    },
    Range {
        field: String,
        min: Bound,
        max: Bound,
    },
    Geo {
        field: String,
        lon: f64,
        lat: f64,
        radius_m: f64,
    },
    And(Vec<Node>),
    Or(Vec<Node>),
    Not(Box<Node>),
}

/// A parsed query expression
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    root: Node,
}

impl Expression {
    pub fn parse(input: &str) -> Result<Self, ExpressionError> {
        let mut parser = Parser {
            chars: input.chars().collect(),
            pos: 0,
            depth: 0,
        };
        let root = parser.parse_union()?;
        parser.skip_ws();
        if let Some(c) = parser.peek() {
            return Err(parser.error(format!("unexpected '{}'", c)));
        }
        Ok(Self { root })
    }

    pub fn matches(&self, doc: &IndexedFields) -> bool {
        eval(&self.root, doc)
    }
}

struct Parser {
    chars: Vec<char>,
    pos: usize,
    depth: usize,
}

fn is_word_boundary(c: char) -> bool {
    c.is_whitespace() || matches!(c, '(' | ')' | '|' | '{' | '}' | '[' | ']' | '@' | ':')
}

impl Parser {
    fn error(&self, message: impl Into<String>) -> ExpressionError {
        ExpressionError::Syntax {
            offset: self.pos,
            message: message.into(),
        }
    }

    fn nested(
        &mut self,
        parse: impl FnOnce(&mut Self) -> Result<Node, ExpressionError>,
    ) -> Result<Node, ExpressionError> {
        if self.depth >= MAX_DEPTH {
            return Err(self.error("expression nested too deeply"));
        }
        self.depth += 1;
        let node = parse(self);
        self.depth -= 1;
        node
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn eat(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, c: char) -> Result<(), ExpressionError> {
        if self.eat(c) {
            Ok(())
        } else {
            Err(self.error(format!("expected '{}'", c)))
        }
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn parse_union(&mut self) -> Result<Node, ExpressionError> {
        let mut alternatives = vec![self.parse_intersection()?];
        loop {
            self.skip_ws();
            if !self.eat('|') {
                break;
            }
            alternatives.push(self.parse_intersection()?);
        }
        Ok(collapse(alternatives, Node::Or))
    }

    fn parse_intersection(&mut self) -> Result<Node, ExpressionError> {
        let mut parts = Vec::new();
        loop {
            self.skip_ws();
            match self.peek() {
                None | Some(')') | Some('|') => break,
                _ => parts.push(self.parse_unary()?),
            }
        }
        if parts.is_empty() {
            return Err(self.error("empty expression"));
        }
        Ok(collapse(parts, Node::And))
    }

    fn parse_unary(&mut self) -> Result<Node, ExpressionError> {
        if self.eat('-') {
            let inner = self.nested(Self::parse_unary)?;
            return Ok(Node::Not(Box::new(inner)));
        }
        self.parse_atom()
    }

    fn parse_atom(&mut self) -> Result<Node, ExpressionError> {
        match self.peek() {
            Some('(') => {
                self.pos += 1;
                let inner = self.nested(Self::parse_union)?;
                self.skip_ws();
                self.expect(')')?;
                Ok(inner)
            }
            Some('@') => {
                self.pos += 1;
                self.parse_field_clause()
            }
            Some('*') if self.chars.get(self.pos + 1).map_or(true, |c| is_word_boundary(*c)) => {
                self.pos += 1;
                Ok(Node::All)
            }
            _ => self.parse_term(None),
        }
    }

    fn parse_field_name(&mut self) -> Result<String, ExpressionError> {
        if self.eat('`') {
            let start = self.pos;
            while self.peek().is_some_and(|c| c != '`') {
                self.pos += 1;
            }
            let name: String = self.chars[start..self.pos].iter().collect();
            self.expect('`')?;
            return Ok(name);
        }
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_alphanumeric() || c == '_' || c == '.') {
            self.pos += 1;
        }
        if start == self.pos {
            return Err(self.error("expected field name"));
        }
        Ok(self.chars[start..self.pos].iter().collect())
    }

    fn parse_field_clause(&mut self) -> Result<Node, ExpressionError> {
        let field = self.parse_field_name()?;
        self.expect(':')?;
        match self.peek() {
            Some('{') => {
                self.pos += 1;
                let body = self.read_until('}')?;
                let values = split_unescaped(&body, '|')
                    .into_iter()
                    .map(|v| unescape(v.trim()))
                    .filter(|v| !v.is_empty())
                    .collect();
                Ok(Node::Tags { field, values })
            }
            Some('[') => {
                self.pos += 1;
                let body = self.read_until(']')?;
                self.parse_bracket(field, &body)
            }
            Some('(') => {
                self.pos += 1;
                let inner = self.nested(Self::parse_union)?;
                self.skip_ws();
                self.expect(')')?;
                Ok(scope(inner, &field))
            }
            Some('-') => {
                self.pos += 1;
                let inner = self.parse_field_body_term(&field)?;
                Ok(Node::Not(Box::new(inner)))
            }
            _ => self.parse_field_body_term(&field),
        }
    }

    fn parse_field_body_term(&mut self, field: &str) -> Result<Node, ExpressionError> {
        self.parse_term(Some(field.to_string()))
    }

    fn parse_term(&mut self, field: Option<String>) -> Result<Node, ExpressionError> {
        let start = self.pos;
        let mut raw = String::new();
        while let Some(c) = self.peek() {
            if c == '\\' {
                self.pos += 1;
                if let Some(escaped) = self.peek() {
                    raw.push('\\');
                    raw.push(escaped);
                    self.pos += 1;
                }
                continue;
            }
            if is_word_boundary(c) {
                break;
            }
            raw.push(c);
            self.pos += 1;
        }
        if raw.is_empty() {
            self.pos = start;
            return Err(self.error("expected term"));
        }
        let prefix = raw.ends_with('*') && !raw.ends_with("\\*");
        let word = unescape(raw.strip_suffix('*').filter(|_| prefix).unwrap_or(&raw));
        Ok(Node::Term {
            field,
            word,
            prefix,
        })
    }

    fn read_until(&mut self, close: char) -> Result<String, ExpressionError> {
        let mut body = String::new();
        while let Some(c) = self.peek() {
            self.pos += 1;
            if c == '\\' {
                body.push(c);
                if let Some(escaped) = self.peek() {
                    body.push(escaped);
                    self.pos += 1;
                }
                continue;
            }
            if c == close {
                return Ok(body);
            }
            body.push(c);
        }
        Err(self.error(format!("unterminated clause, expected '{}'", close)))
    }

    fn parse_bracket(&self, field: String, body: &str) -> Result<Node, ExpressionError> {
        let parts: Vec<&str> = body
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|p| !p.is_empty())
            .collect();
        match parts.as_slice() {
            [min, max] => Ok(Node::Range {
                field,
                min: self.parse_bound(min)?,
                max: self.parse_bound(max)?,
            }),
            [lon, lat, radius, unit] => {
                let unit = GeoUnit::parse(unit)
                    .ok_or_else(|| self.error(format!("unknown geo unit '{}'", unit)))?;
                Ok(Node::Geo {
                    field,
                    lon: self.parse_number(lon)?,
                    lat: self.parse_number(lat)?,
                    radius_m: unit.to_meters(self.parse_number(radius)?),
                })
            }
            _ => Err(self.error(format!("bad numeric or geo clause '[{}]'", body))),
        }
    }

    fn parse_bound(&self, raw: &str) -> Result<Bound, ExpressionError> {
        let (exclusive, raw) = match raw.strip_prefix('(') {
            Some(rest) => (true, rest),
            None => (false, raw),
        };
        let value = match raw.to_ascii_lowercase().as_str() {
            "inf" | "+inf" => f64::INFINITY,
            "-inf" => f64::NEG_INFINITY,
            other => self.parse_number(other)?,
        };
        Ok(Bound { value, exclusive })
    }

    fn parse_number(&self, raw: &str) -> Result<f64, ExpressionError> {
        raw.parse::<f64>()
            .map_err(|_| self.error(format!("invalid number '{}'", raw)))
    }
}

fn collapse(mut nodes: Vec<Node>, combine: fn(Vec<Node>) -> Node) -> Node {
    if nodes.len() == 1 {
        nodes.remove(0)
    } else {
        combine(nodes)
    }
}

/// Bind unscoped terms inside `@field:( ... )` to the field
fn scope(node: Node, field: &str) -> Node {
    match node {
        Node::Term {
            field: None,
            word,
            prefix,
        } => Node::Term {
            field: Some(field.to_string()),
            word,
            prefix,
        },
        Node::And(nodes) => Node::And(nodes.into_iter().map(|n| scope(n, field)).collect()),
        Node::Or(nodes) => Node::Or(nodes.into_iter().map(|n| scope(n, field)).collect()),
        Node::Not(inner) => Node::Not(Box::new(scope(*inner, field))),
        other => other,
    }
}

fn split_unescaped(body: &str, separator: char) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            current.push(c);
            if let Some(escaped) = chars.next() {
                current.push(escaped);
            }
        } else if c == separator {
            parts.push(std::mem::take(&mut current));
        } else {
            current.push(c);
        }
    }
    parts.push(current);
    parts
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(escaped) = chars.next() {
                out.push(escaped);
            }
        } else {
            out.push(c);
        }
    }
    out
}

fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric() && c != '_')
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
}

fn text_matches<'a>(values: impl Iterator<Item = &'a String>, word: &str, prefix: bool) -> bool {
    let wanted: Vec<String> = tokenize(word).collect();
    if wanted.is_empty() {
        return false;
    }
    let tokens: Vec<String> = values.flat_map(|v| tokenize(v)).collect();
    wanted.iter().enumerate().all(|(i, w)| {
        let last = i + 1 == wanted.len();
        tokens
            .iter()
            .any(|t| t == w || (prefix && last && t.starts_with(w.as_str())))
    })
}

fn parse_point(value: &str) -> Option<(f64, f64)> {
    let (lon, lat) = value.split_once(',')?;
    Some((lon.trim().parse().ok()?, lat.trim().parse().ok()?))
}

fn haversine_m(lon1: f64, lat1: f64, lon2: f64, lat2: f64) -> f64 {
    let (phi1, phi2) = (lat1.to_radians(), lat2.to_radians());
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lon2 - lon1).to_radians();
    let a = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * a.sqrt().asin()
}

fn within(value: f64, min: Bound, max: Bound) -> bool {
    let above = if min.exclusive { value > min.value } else { value >= min.value };
    let below = if max.exclusive { value < max.value } else { value <= max.value };
    above && below
}

fn eval(node: &Node, doc: &IndexedFields) -> bool {
    match node {
        Node::All => true,
        Node::Term {
            field: None,
            word,
            prefix,
        } => text_matches(doc.text_values(), word, *prefix),
        Node::Term {
            field: Some(field),
            word,
            prefix,
        } => doc
            .get(field)
            .is_some_and(|(_, values)| text_matches(values.iter(), word, *prefix)),
        Node::Tags { field, values } => doc.get(field).is_some_and(|(_, stored)| {
            stored
                .iter()
                .flat_map(|v| v.split(','))
                .map(str::trim)
                .any(|tag| values.iter().any(|wanted| wanted.eq_ignore_ascii_case(tag)))
        }),
        Node::Range { field, min, max } => doc.get(field).is_some_and(|(_, values)| {
            values
                .iter()
                .filter_map(|v| v.trim().parse::<f64>().ok())
                .any(|v| within(v, *min, *max))
        }),
        Node::Geo {
            field,
            lon,
            lat,
            radius_m,
        } => doc.get(field).is_some_and(|(_, values)| {
            values
                .iter()
                .filter_map(|v| parse_point(v))
                .any(|(plon, plat)| haversine_m(*lon, *lat, plon, plat) <= *radius_m)
        }),
        Node::And(nodes) => nodes.iter().all(|n| eval(n, doc)),
        Node::Or(nodes) => nodes.iter().any(|n| eval(n, doc)),
        Node::Not(inner) => !eval(inner, doc),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn txn(description: &str, amount: &str, acct: &str) -> IndexedFields {
        let mut doc = IndexedFields::new();
        doc.insert("description", FieldType::Text, vec![description.to_string()]);
        doc.insert("amount", FieldType::Numeric, vec![amount.to_string()]);
        doc.insert("acctId", FieldType::Tag, vec![acct.to_string()]);
        doc
    }

    fn company(name: &str, location: &str, tags: &[&str]) -> IndexedFields {
        let mut doc = IndexedFields::new();
        doc.insert("name", FieldType::Text, vec![name.to_string()]);
        doc.insert("location", FieldType::Geo, vec![location.to_string()]);
        doc.insert("tags", FieldType::Tag, tags.iter().map(|t| t.to_string()).collect());
        doc
    }

    fn matches(expr: &str, doc: &IndexedFields) -> bool {
        Expression::parse(expr).unwrap().matches(doc)
    }

    #[test]
    fn test_match_all() {
        assert!(matches("*", &txn("coffee", "1", "a")));
    }

    #[test]
    fn test_text_terms() {
        let doc = txn("Blue Bottle Coffee #42", "4.5", "acct1");
        assert!(matches("@description:coffee", &doc));
        assert!(matches("@description:COFFEE", &doc));
        assert!(!matches("@description:tea", &doc));
        assert!(matches("coffee", &doc));
        assert!(matches("@description:bot*", &doc));
        assert!(matches("@description:(blue coffee)", &doc));
        assert!(!matches("@description:(blue tea)", &doc));
    }

    #[test]
    fn test_numeric_ranges() {
        let doc = txn("coffee", "50", "a");
        assert!(matches("@amount:[50.000000,340282346638528859811704183484516925440.000000]", &doc));
        assert!(matches("@amount:[-inf 50]", &doc));
        assert!(!matches("@amount:[(50 +inf]", &doc));
        assert!(!matches("@amount:[0,49.99]", &doc));
    }

    #[test]
    fn test_tags() {
        let doc = company("Redis", "-122.066540,37.377690", &["fast", "scalable", "reliable"]);
        assert!(matches("@tags:{fast}", &doc));
        assert!(matches("@tags:{innovative|reliable}", &doc));
        assert!(!matches("@tags:{innovative}", &doc));

        let joined = txn("x", "1", "acct1,acct2");
        assert!(matches("@acctId:{acct2}", &joined));
    }

    #[test]
    fn test_escaped_tag_value() {
        let doc = txn("x", "1", "a b");
        assert!(matches("@acctId:{a\\ b}", &doc));
    }

    #[test]
    fn test_geo_radius() {
        let redis = company("Redis", "-122.066540,37.377690", &[]);
        let microsoft = company("Microsoft", "-122.124500,47.640160", &[]);
        let expr = "@location:[-122.064 37.384 30 km]";
        assert!(matches(expr, &redis));
        assert!(!matches(expr, &microsoft));
        assert!(matches("@location:[-122.064 37.384 1500 mi]", &microsoft));
    }

    #[test]
    fn test_boolean_operators() {
        let doc = txn("coffee shop", "12", "a");
        assert!(matches("@description:coffee @amount:[10,20]", &doc));
        assert!(!matches("@description:coffee @amount:[30,40]", &doc));
        assert!(matches("(@description:tea)|(@acctId:{a})", &doc));
        assert!(matches("((@description:tea)|(@acctId:{a})) @amount:[10,20]", &doc));
        assert!(!matches("-(@description:coffee)", &doc));
        assert!(matches("@description:tea | @description:shop", &doc));
    }

    #[test]
    fn test_unknown_field_never_matches() {
        assert!(!matches("@missing:coffee", &txn("coffee", "1", "a")));
    }

    #[test]
    fn test_syntax_errors() {
        assert!(Expression::parse("").is_err());
        assert!(Expression::parse("@amount:[1,2").is_err());
        assert!(Expression::parse("(coffee").is_err());
        assert!(Expression::parse("@location:[1 2 3 parsecs]").is_err());
        assert!(Expression::parse("@amount:[a,b]").is_err());
    }

    #[test]
    fn test_deep_nesting_rejected() {
        let err = Expression::parse(&"(".repeat(10_000)).unwrap_err();
        assert!(err.to_string().contains("nested too deeply"));
        assert!(Expression::parse(&"-".repeat(10_000)).is_err());
        assert!(Expression::parse(&"@description:(".repeat(10_000)).is_err());

        let shallow = format!("{}coffee{}", "(".repeat(100), ")".repeat(100));
        assert!(matches(&shallow, &txn("coffee", "1", "a")));
    }
}
