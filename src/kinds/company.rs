// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Companies, stored as JSON documents, with lookups expressed as queries.
//!
//! | Lookup                          | Expression                                            |
//! |---------------------------------|-------------------------------------------------------|
//! | `by_name("Redis")`              | `@name:Redis`                                         |
//! | `near(lon, lat, 10.0, Miles)`   | `@location:[lon lat 10 mi]`                           |
//! | `by_tags(["fast"])`             | `@tags:{fast}`                                        |
//! | `by_employees(526)`             | `@numberOfEmployees:[526.000000,526.000000]`          |
//! | `employees_between(100, 1000)`  | `@numberOfEmployees:[100.000000,1000.000000]`         |
//! | `name_starting_with("Mic")`     | `@name:Mic*`                                          |

use serde::Serialize;

use crate::ingest::{FieldValue, Record};
use crate::search::{FromDocument, GeoUnit, Query, SchemaDefinition};
use crate::storage::traits::RawDocument;

pub const INDEX_NAME: &str = "company-idx";
pub const KEY_PREFIX: &str = "companies:";

pub fn schema() -> SchemaDefinition {
    SchemaDefinition::json(INDEX_NAME, KEY_PREFIX)
        .text_at("name", "$.name", 1.0)
        .tag_at("url", "$.url")
        .geo_at("location", "$.location")
        .numeric_sortable_at("numberOfEmployees", "$.numberOfEmployees")
        .numeric_at("yearFounded", "$.yearFounded")
        .tag_at("tags", "$.tags")
        .range_field("numberOfEmployees")
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    pub id: String,
    pub name: String,
    pub url: String,
    /// `(longitude, latitude)`
    pub location: Option<(f64, f64)>,
    pub number_of_employees: u64,
    pub year_founded: u32,
    pub tags: Vec<String>,
}

impl Company {
    pub fn to_record(&self) -> Record {
        let mut record = Record::new(self.id.as_str())
            .with("name", self.name.as_str())
            .with("url", self.url.as_str());
        if let Some((lon, lat)) = self.location {
            record.set("location", FieldValue::geo(lon, lat));
        }
        record
            .with("numberOfEmployees", self.number_of_employees as f64)
            .with("yearFounded", f64::from(self.year_founded))
            .with("tags", FieldValue::tags(self.tags.iter().cloned()))
    }
}

impl FromDocument for Company {
    fn from_document(doc: &RawDocument) -> Self {
        let location = doc.get("location").split_once(',').and_then(|(lon, lat)| {
            Some((lon.trim().parse().ok()?, lat.trim().parse().ok()?))
        });
        Self {
            id: doc.key.strip_prefix(KEY_PREFIX).unwrap_or(&doc.key).to_string(),
            name: doc.get("name").to_string(),
            url: doc.get("url").to_string(),
            location,
            number_of_employees: parse_whole(doc.get("numberOfEmployees")) as u64,
            year_founded: parse_whole(doc.get("yearFounded")) as u32,
            tags: doc
                .get("tags")
                .split(',')
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }
}

/// Stored numbers may come back as `526` or `526.0`
fn parse_whole(value: &str) -> f64 {
    value.parse::<f64>().map(f64::trunc).unwrap_or(0.0).max(0.0)
}

/// The two companies loaded at startup
pub fn seed_records() -> Vec<Record> {
    seed_companies().iter().map(Company::to_record).collect()
}

pub fn seed_companies() -> Vec<Company> {
    vec![
        Company {
            id: "redis".to_string(),
            name: "Redis".to_string(),
            url: "https://redis.com".to_string(),
            location: Some((-122.066540, 37.377690)),
            number_of_employees: 526,
            year_founded: 2011,
            tags: vec!["fast".into(), "scalable".into(), "reliable".into()],
        },
        Company {
            id: "microsoft".to_string(),
            name: "Microsoft".to_string(),
            url: "https://microsoft.com".to_string(),
            location: Some((-122.124500, 47.640160)),
            number_of_employees: 182268,
            year_founded: 1975,
            tags: vec!["innovative".into(), "reliable".into()],
        },
    ]
}

pub fn by_name(name: &str) -> Query {
    Query::field_eq("name", name)
}

pub fn near(lon: f64, lat: f64, radius: f64, unit: GeoUnit) -> Query {
    Query::geo_radius("location", lon, lat, radius, unit)
}

/// Companies carrying any of `tags`
pub fn by_tags<I, S>(tags: I) -> Query
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    Query::tags("tags", tags.into_iter().map(Into::into).collect())
}

pub fn by_employees(count: u64) -> Query {
    Query::numeric_eq("numberOfEmployees", count as f64)
}

/// Inclusive on both ends
pub fn employees_between(min: u64, max: u64) -> Query {
    Query::numeric_range("numberOfEmployees", Some(min as f64), Some(max as f64))
}

pub fn name_starting_with(prefix: &str) -> Query {
    Query::prefix("name", prefix)
}
