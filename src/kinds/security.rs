// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Securities, stored as JSON documents.
//!
//! A free-text term is matched against the name and every identifier:
//!
//! ```text
//! (@securityName:T)|(@securityId:{T})|(@cusip:{T})|(@isin:{T})|(@symbol:{T})
//! ```

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::ingest::Record;
use crate::search::{FromDocument, SchemaDefinition};
use crate::storage::traits::RawDocument;

pub const INDEX_NAME: &str = "security-idx";
pub const KEY_PREFIX: &str = "securities:";

pub fn schema() -> SchemaDefinition {
    SchemaDefinition::json(INDEX_NAME, KEY_PREFIX)
        .tag_at("securityId", "$.securityId")
        .tag_at("cusip", "$.cusip")
        .text_at("securityName", "$.securityName", 1.0)
        .tag_at("isin", "$.isin")
        .tag_at("symbol", "$.symbol")
        .term_fields(["securityName", "securityId", "cusip", "isin", "symbol"])
}

/// Security reference data. Unknown members are ignored on input and unset
/// members are omitted from the stored document.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Security {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cusip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub isin: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub option_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub option_style: Option<String>,
}

impl Security {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Keyed by security id. A security without one encodes to a record
    /// with an empty id, which the ingestor skips.
    pub fn to_record(&self) -> Record {
        let mut record = Record::new(self.security_id.clone().unwrap_or_default());
        let members = [
            ("securityId", &self.security_id),
            ("securityName", &self.security_name),
            ("securityType", &self.security_type),
            ("cusip", &self.cusip),
            ("symbol", &self.symbol),
            ("isin", &self.isin),
            ("optionType", &self.option_type),
            ("optionStyle", &self.option_style),
        ];
        for (name, value) in members {
            if let Some(value) = value {
                record.set(name, value.as_str());
            }
        }
        record
    }
}

/// Parse one security per JSON document. Documents that fail to parse are
/// logged and left out.
pub fn records_from_json<I, S>(documents: I) -> Vec<Record>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    documents
        .into_iter()
        .filter_map(|json| match Security::from_json(json.as_ref()) {
            Ok(security) => {
                debug!(id = ?security.security_id, symbol = ?security.symbol, "Parsed security");
                Some(security.to_record())
            }
            Err(e) => {
                warn!(error = %e, "Skipping malformed security document");
                None
            }
        })
        .collect()
}

/// Security as returned by search
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct SecurityValue {
    pub name: String,
    pub symbol: String,
    pub id: String,
    pub cusip: String,
    pub isin: String,
}

impl FromDocument for SecurityValue {
    fn from_document(doc: &RawDocument) -> Self {
        Self {
            name: doc.get("securityName").to_string(),
            symbol: doc.get("symbol").to_string(),
            id: doc.get("securityId").to_string(),
            cusip: doc.get("cusip").to_string(),
            isin: doc.get("isin").to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::encode;
    use crate::search::{QueryBuilder, ResultMapper, SearchRequest};
    use crate::storage::traits::WriteCommand;

    const EQUITY: &str = r#"{
        "securityId": "1001",
        "securityName": "Acme Corporation",
        "securityType": "EQUITY",
        "cusip": "000123AB1",
        "symbol": "ACME",
        "isin": "US000123AB12",
        "exchange": "NYSE"
    }"#;

    #[test]
    fn test_schema_is_valid() {
        assert!(schema().validate().is_ok());
        assert_eq!(
            &schema().to_ft_create_args()[..8],
            ["security-idx", "ON", "JSON", "PREFIX", "1", "securities:", "SCHEMA", "$.securityId"]
        );
    }

    #[test]
    fn test_term_matches_every_identifier() {
        let expr = QueryBuilder::default().build(&SearchRequest::new("ACME"), &schema());
        assert_eq!(
            expr,
            "(@securityName:ACME)|(@securityId:{ACME})|(@cusip:{ACME})|(@isin:{ACME})|(@symbol:{ACME})"
        );
    }

    #[test]
    fn test_unknown_members_ignored_and_unset_omitted() {
        let records = records_from_json([EQUITY, r#"{"securityId": "2002"}"#, "not json"]);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, "1001");

        let WriteCommand::Json { key, document } = encode(&records[1], &schema()).unwrap() else {
            panic!("Expected JSON command");
        };
        assert_eq!(key, "securities:2002");
        assert_eq!(document, r#"{"securityId":"2002"}"#);
    }

    #[test]
    fn test_value_from_json_hit() {
        let hit = RawDocument::new("securities:1001").with_field("$", EQUITY);
        let values: Vec<SecurityValue> = ResultMapper::map(&[hit]);
        assert_eq!(values[0].name, "Acme Corporation");
        assert_eq!(values[0].id, "1001");
        assert_eq!(values[0].isin, "US000123AB12");
    }
}
