// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Account transactions, stored as hashes.
//!
//! Seed data is one description per line; account and transaction ids come
//! from an [`IdGenerator`] and the amount is drawn uniformly from
//! `[MIN_AMOUNT, MAX_AMOUNT)`.

use rand::Rng;
use serde::Serialize;

use crate::ids::IdGenerator;
use crate::ingest::Record;
use crate::search::{FromDocument, SchemaDefinition, SearchRequest};
use crate::storage::traits::RawDocument;

pub const INDEX_NAME: &str = "idx1";
pub const KEY_PREFIX: &str = "transactions:";

pub const MIN_AMOUNT: f64 = 0.1;
pub const MAX_AMOUNT: f64 = 10000.0;

pub fn schema() -> SchemaDefinition {
    SchemaDefinition::hash(INDEX_NAME, KEY_PREFIX)
        .tag("acctId")
        .tag("trxnId")
        .text_weighted("description", 1.0)
        .numeric("amount")
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub acct_id: String,
    pub trxn_id: String,
    pub description: String,
    pub amount: f64,
}

impl Transaction {
    pub fn new(
        acct_id: impl Into<String>,
        trxn_id: impl Into<String>,
        description: impl Into<String>,
        amount: f64,
    ) -> Self {
        Self {
            acct_id: acct_id.into(),
            trxn_id: trxn_id.into(),
            description: description.into(),
            amount,
        }
    }

    /// Keyed by transaction id
    pub fn to_record(&self) -> Record {
        Record::new(self.trxn_id.as_str())
            .with("acctId", self.acct_id.as_str())
            .with("trxnId", self.trxn_id.as_str())
            .with("description", self.description.as_str())
            .with("amount", self.amount)
    }
}

/// One transaction per non-blank line of `text`.
pub fn records_from_descriptions<R: Rng>(
    text: &str,
    ids: &dyn IdGenerator,
    rng: &mut R,
) -> Vec<Record> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|description| {
            let amount = rng.gen_range(MIN_AMOUNT..MAX_AMOUNT);
            Transaction::new(ids.next_id(), ids.next_id(), description, amount).to_record()
        })
        .collect()
}

/// Search parameters for the transaction search endpoint.
///
/// A non-positive `min_amount` means no amount filter.
pub fn search_request(term: impl Into<String>, min_amount: f64) -> SearchRequest {
    let request = SearchRequest::new(term);
    if min_amount > 0.0 {
        request.with_min(min_amount)
    } else {
        request
    }
}

/// Transaction as returned by search. The amount stays in its stored form.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionValue {
    pub trxn_id: String,
    pub description: String,
    pub amount: String,
}

impl FromDocument for TransactionValue {
    fn from_document(doc: &RawDocument) -> Self {
        Self {
            trxn_id: doc.get("trxnId").to_string(),
            description: doc.get("description").to_string(),
            amount: doc.get("amount").to_string(),
        }
    }
}
