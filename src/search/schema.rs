// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Index schema definitions.
//!
//! A [`SchemaDefinition`] declares, for one document kind, which fields are
//! indexed, their RediSearch types, and the key prefix that binds stored
//! records to the index.
//!
//! # RediSearch Index Creation
//!
//! ```text
//! FT.CREATE idx1
//!   ON HASH
//!   PREFIX 1 transactions:
//!   SCHEMA
//!     acctId TAG
//!     trxnId TAG
//!     description TEXT WEIGHT 1
//!     amount NUMERIC
//!
//! FT.CREATE security-idx
//!   ON JSON
//!   PREFIX 1 securities:
//!   SCHEMA
//!     $.securityId AS securityId TAG
//!     $.securityName AS securityName TEXT WEIGHT 1
//! ```

use std::collections::HashSet;
use std::fmt;
use thiserror::Error;

/// How records of a kind are laid out in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKind {
    /// Flat Redis hash, every field stored as a string
    Hash,
    /// RedisJSON document stored at the root path `$`
    JsonDocument,
}

impl StorageKind {
    /// Keyword used in `FT.CREATE ... ON <kind>`
    pub fn as_keyword(&self) -> &'static str {
        match self {
            StorageKind::Hash => "HASH",
            StorageKind::JsonDocument => "JSON",
        }
    }
}

/// Search field types supported by RediSearch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    /// Exact-match field, supports OR over members
    Tag,
    /// Full-text searchable field
    Text,
    /// Numeric field (supports range queries)
    Numeric,
    /// Geographic field (longitude, latitude)
    Geo,
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Tag => write!(f, "TAG"),
            FieldType::Text => write!(f, "TEXT"),
            FieldType::Numeric => write!(f, "NUMERIC"),
            FieldType::Geo => write!(f, "GEO"),
        }
    }
}

/// One indexed field
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    /// Field name (used in queries as `@name`)
    pub name: String,
    /// JSON path alias, required for JSON documents
    pub path: Option<String>,
    /// Field type
    pub field_type: FieldType,
    /// Relevance weight, text fields only
    pub weight: Option<f64>,
    /// Whether the field is sortable
    pub sortable: bool,
}

impl FieldSpec {
    fn new(name: String, path: Option<String>, field_type: FieldType) -> Self {
        Self {
            name,
            path,
            field_type,
            weight: None,
            sortable: false,
        }
    }

    fn to_schema_args(&self) -> Vec<String> {
        let mut args = Vec::with_capacity(7);
        if let Some(ref path) = self.path {
            args.push(path.clone());
            args.push("AS".to_string());
        }
        args.push(self.name.clone());
        args.push(self.field_type.to_string());

        if let Some(weight) = self.weight {
            args.push("WEIGHT".to_string());
            args.push(weight.to_string());
        }
        if self.sortable {
            args.push("SORTABLE".to_string());
        }
        args
    }
}

/// Fields the query builder targets for each kind of search parameter.
///
/// Anything left unset is derived from the field list: the first text field
/// takes free-text terms, the first numeric/tag/geo field takes the
/// corresponding filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchFields {
    pub term_fields: Vec<String>,
    pub range_field: Option<String>,
    pub tag_field: Option<String>,
    pub geo_field: Option<String>,
}

/// Schema validation failures
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemaError {
    #[error("index name must not be empty")]
    EmptyIndexName,
    #[error("key prefix must not be empty")]
    EmptyKeyPrefix,
    #[error("schema '{0}' declares no fields")]
    NoFields(String),
    #[error("duplicate field '{0}'")]
    DuplicateField(String),
    #[error("field '{0}' needs a JSON path on a JSON document index")]
    MissingPath(String),
    #[error("field '{0}' has a JSON path but the index stores hashes")]
    UnexpectedPath(String),
    #[error("field '{field}' has invalid weight {weight}")]
    InvalidWeight { field: String, weight: f64 },
    #[error("search field '{field}' must be one of {expected}")]
    SearchFieldType { field: String, expected: &'static str },
    #[error("search field '{0}' is not declared in the schema")]
    UnknownSearchField(String),
}

/// Index schema for one document kind.
///
/// Immutable once built; constructed at startup and shared by reference.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaDefinition {
    /// Index name as passed to FT.CREATE / FT.SEARCH
    pub index_name: String,
    /// Key prefix this index covers (e.g., "transactions:")
    pub key_prefix: String,
    /// Hash or JSON storage
    pub storage_kind: StorageKind,
    /// Field definitions for the index, in declaration order
    pub fields: Vec<FieldSpec>,
    search: SearchFields,
}

impl SchemaDefinition {
    /// Create a schema for records stored as flat hashes
    pub fn hash(index_name: impl Into<String>, key_prefix: impl Into<String>) -> Self {
        Self::new(index_name, key_prefix, StorageKind::Hash)
    }

    /// Create a schema for records stored as JSON documents
    pub fn json(index_name: impl Into<String>, key_prefix: impl Into<String>) -> Self {
        Self::new(index_name, key_prefix, StorageKind::JsonDocument)
    }

    pub fn new(
        index_name: impl Into<String>,
        key_prefix: impl Into<String>,
        storage_kind: StorageKind,
    ) -> Self {
        Self {
            index_name: index_name.into(),
            key_prefix: key_prefix.into(),
            storage_kind,
            fields: Vec::new(),
            search: SearchFields::default(),
        }
    }

    fn push(mut self, field: FieldSpec) -> Self {
        self.fields.push(field);
        self
    }

    /// Add a tag field
    pub fn tag(self, name: impl Into<String>) -> Self {
        self.push(FieldSpec::new(name.into(), None, FieldType::Tag))
    }

    /// Add a tag field with custom JSON path
    pub fn tag_at(self, name: impl Into<String>, json_path: impl Into<String>) -> Self {
        self.push(FieldSpec::new(name.into(), Some(json_path.into()), FieldType::Tag))
    }

    /// Add a text field
    pub fn text(self, name: impl Into<String>) -> Self {
        self.push(FieldSpec::new(name.into(), None, FieldType::Text))
    }

    /// Add a text field with a relevance weight
    pub fn text_weighted(self, name: impl Into<String>, weight: f64) -> Self {
        let mut field = FieldSpec::new(name.into(), None, FieldType::Text);
        field.weight = Some(weight);
        self.push(field)
    }

    /// Add a weighted text field with custom JSON path
    pub fn text_at(self, name: impl Into<String>, json_path: impl Into<String>, weight: f64) -> Self {
        let mut field = FieldSpec::new(name.into(), Some(json_path.into()), FieldType::Text);
        field.weight = Some(weight);
        self.push(field)
    }

    /// Add a numeric field
    pub fn numeric(self, name: impl Into<String>) -> Self {
        self.push(FieldSpec::new(name.into(), None, FieldType::Numeric))
    }

    /// Add a numeric field with custom JSON path
    pub fn numeric_at(self, name: impl Into<String>, json_path: impl Into<String>) -> Self {
        self.push(FieldSpec::new(name.into(), Some(json_path.into()), FieldType::Numeric))
    }

    /// Add a sortable numeric field with custom JSON path
    pub fn numeric_sortable_at(self, name: impl Into<String>, json_path: impl Into<String>) -> Self {
        let mut field = FieldSpec::new(name.into(), Some(json_path.into()), FieldType::Numeric);
        field.sortable = true;
        self.push(field)
    }

    /// Add a geo field
    pub fn geo(self, name: impl Into<String>) -> Self {
        self.push(FieldSpec::new(name.into(), None, FieldType::Geo))
    }

    /// Add a geo field with custom JSON path
    pub fn geo_at(self, name: impl Into<String>, json_path: impl Into<String>) -> Self {
        self.push(FieldSpec::new(name.into(), Some(json_path.into()), FieldType::Geo))
    }

    /// Free-text terms are matched against these fields, OR'd together
    pub fn term_fields<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.search.term_fields = names.into_iter().map(Into::into).collect();
        self
    }

    /// Numeric range filters apply to this field
    pub fn range_field(mut self, name: impl Into<String>) -> Self {
        self.search.range_field = Some(name.into());
        self
    }

    /// Tag-set filters apply to this field
    pub fn tag_field(mut self, name: impl Into<String>) -> Self {
        self.search.tag_field = Some(name.into());
        self
    }

    /// Geo radius filters apply to this field
    pub fn geo_field(mut self, name: impl Into<String>) -> Self {
        self.search.geo_field = Some(name.into());
        self
    }

    /// Look up a declared field by name
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    fn first_of(&self, field_type: FieldType) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.field_type == field_type)
    }

    /// Fields a free-text term is matched against
    pub fn term_targets(&self) -> Vec<&FieldSpec> {
        if self.search.term_fields.is_empty() {
            return self.first_of(FieldType::Text).into_iter().collect();
        }
        self.search
            .term_fields
            .iter()
            .filter_map(|name| self.field(name))
            .collect()
    }

    /// Field used for numeric range filters
    pub fn range_target(&self) -> Option<&FieldSpec> {
        self.designated(self.search.range_field.as_deref(), FieldType::Numeric)
    }

    /// Field used for tag-set filters
    pub fn tag_target(&self) -> Option<&FieldSpec> {
        self.designated(self.search.tag_field.as_deref(), FieldType::Tag)
    }

    /// Field used for geo filters
    pub fn geo_target(&self) -> Option<&FieldSpec> {
        self.designated(self.search.geo_field.as_deref(), FieldType::Geo)
    }

    fn designated(&self, name: Option<&str>, field_type: FieldType) -> Option<&FieldSpec> {
        match name {
            Some(name) => self.field(name).filter(|f| f.field_type == field_type),
            None => self.first_of(field_type),
        }
    }

    /// Check the schema invariants.
    pub fn validate(&self) -> Result<(), SchemaError> {
        if self.index_name.trim().is_empty() {
            return Err(SchemaError::EmptyIndexName);
        }
        if self.key_prefix.is_empty() {
            return Err(SchemaError::EmptyKeyPrefix);
        }
        if self.fields.is_empty() {
            return Err(SchemaError::NoFields(self.index_name.clone()));
        }

        let mut seen = HashSet::new();
        for field in &self.fields {
            if !seen.insert(field.name.as_str()) {
                return Err(SchemaError::DuplicateField(field.name.clone()));
            }
            match (self.storage_kind, &field.path) {
                (StorageKind::JsonDocument, None) => {
                    return Err(SchemaError::MissingPath(field.name.clone()))
                }
                (StorageKind::Hash, Some(_)) => {
                    return Err(SchemaError::UnexpectedPath(field.name.clone()))
                }
                _ => {}
            }
            if let Some(weight) = field.weight {
                if field.field_type != FieldType::Text || !weight.is_finite() || weight <= 0.0 {
                    return Err(SchemaError::InvalidWeight {
                        field: field.name.clone(),
                        weight,
                    });
                }
            }
        }

        for name in &self.search.term_fields {
            let field = self
                .field(name)
                .ok_or_else(|| SchemaError::UnknownSearchField(name.clone()))?;
            if !matches!(field.field_type, FieldType::Text | FieldType::Tag) {
                return Err(SchemaError::SearchFieldType {
                    field: name.clone(),
                    expected: "TEXT or TAG",
                });
            }
        }
        self.check_designated(self.search.range_field.as_deref(), FieldType::Numeric, "NUMERIC")?;
        self.check_designated(self.search.tag_field.as_deref(), FieldType::Tag, "TAG")?;
        self.check_designated(self.search.geo_field.as_deref(), FieldType::Geo, "GEO")?;
        Ok(())
    }

    fn check_designated(
        &self,
        name: Option<&str>,
        field_type: FieldType,
        expected: &'static str,
    ) -> Result<(), SchemaError> {
        let Some(name) = name else { return Ok(()) };
        let field = self
            .field(name)
            .ok_or_else(|| SchemaError::UnknownSearchField(name.to_string()))?;
        if field.field_type != field_type {
            return Err(SchemaError::SearchFieldType {
                field: name.to_string(),
                expected,
            });
        }
        Ok(())
    }

    /// Generate the FT.CREATE command arguments (without the command name)
    pub fn to_ft_create_args(&self) -> Vec<String> {
        let mut args = vec![
            self.index_name.clone(),
            "ON".to_string(),
            self.storage_kind.as_keyword().to_string(),
            "PREFIX".to_string(),
            "1".to_string(),
            self.key_prefix.clone(),
            "SCHEMA".to_string(),
        ];

        for field in &self.fields {
            args.extend(field.to_schema_args());
        }

        args
    }

    /// Storage key for a record identifier
    pub fn key_for(&self, id: &str) -> String {
        format!("{}{}", self.key_prefix, id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transactions() -> SchemaDefinition {
        SchemaDefinition::hash("idx1", "transactions:")
            .tag("acctId")
            .tag("trxnId")
            .text_weighted("description", 1.0)
            .numeric("amount")
    }

    #[test]
    fn test_hash_schema_args() {
        let args = transactions().to_ft_create_args();
        let cmd = format!("FT.CREATE {}", args.join(" "));
        assert_eq!(
            cmd,
            "FT.CREATE idx1 ON HASH PREFIX 1 transactions: SCHEMA \
             acctId TAG trxnId TAG description TEXT WEIGHT 1 amount NUMERIC"
        );
    }

    #[test]
    fn test_json_schema_args() {
        let schema = SchemaDefinition::json("security-idx", "securities:")
            .tag_at("securityId", "$.securityId")
            .text_at("securityName", "$.securityName", 1.0)
            .numeric_sortable_at("price", "$.price");

        let cmd = format!("FT.CREATE {}", schema.to_ft_create_args().join(" "));
        assert!(cmd.contains("ON JSON PREFIX 1 securities:"));
        assert!(cmd.contains("$.securityId AS securityId TAG"));
        assert!(cmd.contains("$.securityName AS securityName TEXT WEIGHT 1"));
        assert!(cmd.contains("$.price AS price NUMERIC SORTABLE"));
    }

    #[test]
    fn test_fractional_weight_rendered() {
        let schema = SchemaDefinition::hash("i", "p:").text_weighted("body", 0.5);
        assert!(schema.to_ft_create_args().contains(&"0.5".to_string()));
    }

    #[test]
    fn test_valid_schemas_pass() {
        assert!(transactions().validate().is_ok());
    }

    #[test]
    fn test_duplicate_field_rejected() {
        let schema = SchemaDefinition::hash("i", "p:").tag("a").text("a");
        assert_eq!(schema.validate(), Err(SchemaError::DuplicateField("a".into())));
    }

    #[test]
    fn test_path_required_for_json() {
        let schema = SchemaDefinition::json("i", "p:").tag("a");
        assert_eq!(schema.validate(), Err(SchemaError::MissingPath("a".into())));
    }

    #[test]
    fn test_path_rejected_for_hash() {
        let schema = SchemaDefinition::hash("i", "p:").tag_at("a", "$.a");
        assert_eq!(schema.validate(), Err(SchemaError::UnexpectedPath("a".into())));
    }

    #[test]
    fn test_empty_schema_rejected() {
        assert!(matches!(
            SchemaDefinition::hash("i", "p:").validate(),
            Err(SchemaError::NoFields(_))
        ));
        assert_eq!(
            SchemaDefinition::hash("", "p:").tag("a").validate(),
            Err(SchemaError::EmptyIndexName)
        );
        assert_eq!(
            SchemaDefinition::hash("i", "").tag("a").validate(),
            Err(SchemaError::EmptyKeyPrefix)
        );
    }

    #[test]
    fn test_bad_weight_rejected() {
        let schema = SchemaDefinition::hash("i", "p:").text_weighted("a", 0.0);
        assert!(matches!(schema.validate(), Err(SchemaError::InvalidWeight { .. })));
    }

    #[test]
    fn test_default_search_targets() {
        let schema = transactions();
        let terms: Vec<_> = schema.term_targets().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(terms, vec!["description"]);
        assert_eq!(schema.range_target().map(|f| f.name.as_str()), Some("amount"));
        assert_eq!(schema.tag_target().map(|f| f.name.as_str()), Some("acctId"));
        assert!(schema.geo_target().is_none());
    }

    #[test]
    fn test_explicit_search_targets() {
        let schema = transactions().term_fields(["description", "trxnId"]).tag_field("trxnId");
        assert!(schema.validate().is_ok());
        assert_eq!(schema.term_targets().len(), 2);
        assert_eq!(schema.tag_target().map(|f| f.name.as_str()), Some("trxnId"));
    }

    #[test]
    fn test_search_target_type_checked() {
        let schema = transactions().range_field("description");
        assert!(matches!(
            schema.validate(),
            Err(SchemaError::SearchFieldType { .. })
        ));

        let schema = transactions().term_fields(["missing"]);
        assert_eq!(
            schema.validate(),
            Err(SchemaError::UnknownSearchField("missing".into()))
        );
    }

    #[test]
    fn test_key_for() {
        assert_eq!(transactions().key_for("ab12cd34"), "transactions:ab12cd34");
    }
}
