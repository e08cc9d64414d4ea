//! Selectors over a single bill record: key, titles and cosponsors.

use crate::congress::{normalize_bill_id, BillKey};
use crate::types::{BillRecord, CosponsorRef, Title};
use serde_json::{Map, Value};
use tracing::error;

/// Title stage filter. Codes without a known label do not filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    All,
    Introduced,
    ReportedToHouse,
}

impl Stage {
    /// The `as` label titles carry for this stage
    pub fn label(&self) -> Option<&'static str> {
        match self {
            Stage::All => None,
            Stage::Introduced => Some("introduced"),
            Stage::ReportedToHouse => Some("reported to house"),
        }
    }
}

impl From<&str> for Stage {
    fn from(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "ih" => Stage::Introduced,
            "rh" => Stage::ReportedToHouse,
            _ => Stage::All,
        }
    }
}

/// The record's [`BillKey`], or `None` (logged) when `bill_id` is missing or malformed
pub fn bill_key(record: &BillRecord) -> Option<BillKey> {
    match record.bill_id.as_deref() {
        Some(bill_id) => match normalize_bill_id(bill_id) {
            Ok(key) => Some(key),
            Err(e) => {
                error!("{}", e);
                None
            }
        },
        None => {
            error!(
                "No bill_id: {}",
                record.bill_type.as_deref().unwrap_or("unknown bill type")
            );
            None
        }
    }
}

/// Titles of the record in source order.
///
/// With `include_partial == false`, titles for a portion of the bill are
/// dropped. A recognized `stage` keeps only titles given at that stage.
pub fn extract_titles(record: &BillRecord, include_partial: bool, stage: Stage) -> Vec<&Title> {
    record
        .titles
        .iter()
        .filter(|title| include_partial || !title.is_for_portion)
        .filter(|title| match stage.label() {
            Some(label) => title.stage.as_deref() == Some(label),
            None => true,
        })
        .collect()
}

/// Title strings, skipping entries without text
pub fn title_texts<'a>(titles: impl IntoIterator<Item = &'a Title>) -> Vec<String> {
    titles
        .into_iter()
        .filter_map(|title| title.title.clone())
        .collect()
}

/// Cosponsors as JSON objects, projected onto `fields` when any are given.
/// Fields missing on a cosponsor come back as `null`.
pub fn extract_cosponsors(record: &BillRecord, fields: &[String]) -> Vec<Map<String, Value>> {
    record
        .cosponsors
        .iter()
        .map(|cosponsor| {
            let full = match serde_json::to_value(cosponsor) {
                Ok(Value::Object(map)) => map,
                _ => Map::new(),
            };
            if fields.is_empty() {
                return full;
            }
            fields
                .iter()
                .map(|field| (field.clone(), full.get(field).cloned().unwrap_or(Value::Null)))
                .collect()
        })
        .collect()
}

/// The `{name, bioguide_id}` projection stored in the metadata index
pub fn cosponsor_refs(record: &BillRecord) -> Vec<CosponsorRef> {
    record
        .cosponsors
        .iter()
        .map(|cosponsor| CosponsorRef {
            name: cosponsor.name.clone(),
            bioguide_id: cosponsor.bioguide_id.clone(),
        })
        .collect()
}
