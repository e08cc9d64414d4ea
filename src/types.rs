use crate::congress::BillKey;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// A per-bill `data.json` document from the bill-status corpus.
///
/// Only the fields this crate reads are typed; everything else is kept in
/// `extra` so projections can still reach it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BillRecord {
    #[serde(default)]
    pub bill_id: Option<String>,
    #[serde(default)]
    pub bill_type: Option<String>,
    #[serde(default)]
    pub titles: Vec<Title>,
    #[serde(default)]
    pub sponsor: Option<Sponsor>,
    #[serde(default)]
    pub cosponsors: Vec<Cosponsor>,
    #[serde(default)]
    pub committees: Vec<BillCommittee>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One entry of a bill's `titles` list
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Title {
    #[serde(default, alias = "text")]
    pub title: Option<String>,
    #[serde(default)]
    pub is_for_portion: bool,
    /// Stage label, e.g. "introduced"
    #[serde(default, rename = "as")]
    pub stage: Option<String>,
    #[serde(default, rename = "type")]
    pub title_type: Option<String>,
}

/// A cosponsor as listed on the bill record.
///
/// Absent fields stay absent when serialized, so an untouched cosponsor
/// round-trips to its source object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cosponsor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bioguide_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub party: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub district: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_cosponsor: Option<bool>,
    /// Committee rank; only integer values count as ranked
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rank: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Cosponsor {
    pub fn is_original(&self) -> bool {
        self.original_cosponsor.unwrap_or(false)
    }

    pub fn integer_rank(&self) -> Option<i64> {
        self.rank.as_ref().and_then(Value::as_i64)
    }
}

/// The bill's sponsor
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Sponsor {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub bioguide_id: Option<String>,
    #[serde(default)]
    pub party: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub district: Option<Value>,
}

/// A committee the bill was referred to
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BillCommittee {
    #[serde(default)]
    pub committee_id: Option<String>,
    /// Committee display name
    #[serde(default)]
    pub committee: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Name and bioguide id, the cosponsor projection kept in the metadata index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CosponsorRef {
    pub name: Option<String>,
    pub bioguide_id: Option<String>,
}

/// Metadata kept per bill in [`BillsMeta`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillMetaEntry {
    pub titles: Vec<String>,
    pub titles_whole_bill: Vec<String>,
    pub cosponsors: Vec<CosponsorRef>,
}

/// The aggregated metadata index, keyed by bill key.
/// A `BTreeMap` keeps serialization order stable across runs.
pub type BillsMeta = BTreeMap<BillKey, BillMetaEntry>;

/// One result row from the similarity backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarityMatch {
    #[serde(default)]
    pub bill_congress_type_number: String,
    #[serde(default)]
    pub score: f64,
    /// Comma-joined reason strings
    #[serde(default)]
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
}

impl SimilarityMatch {
    pub fn key(&self) -> BillKey {
        BillKey::new(self.bill_congress_type_number.trim())
    }
}

/// A bill-data file found by the walker
#[derive(Debug, Clone)]
pub struct BillFile {
    pub path: PathBuf,
    pub relative_path: String,
}

/// A summary of one bill record, as emitted by the record stream
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillSummary {
    pub bill_congress_type_number: BillKey,
    pub filename: String,
    pub titles: Vec<String>,
    pub cosponsors: Vec<Map<String, Value>>,
}
