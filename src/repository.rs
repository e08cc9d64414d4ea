//! Read access to the bill database.
//!
//! [`BillRepository`] is the seam to whatever stores bills, legislators,
//! CRS reports and bill-numbered documents. [`MemoryRepository`] is a
//! JSON-backed implementation used by the CLI and the tests.

use crate::congress::BillKey;
use crate::error::{Error, Result};
use crate::types::{BillCommittee, Cosponsor, SimilarityMatch, Sponsor};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::path::Path;

pub type BillRowId = i64;

/// A stored bill with the fields the detail page reads
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BillRow {
    pub id: BillRowId,
    pub bill_congress_type_number: BillKey,
    #[serde(default)]
    pub titles: Vec<String>,
    #[serde(default)]
    pub sponsor: Option<Sponsor>,
    #[serde(default)]
    pub cosponsors: Vec<Cosponsor>,
    #[serde(default)]
    pub committees: Vec<BillCommittee>,
    /// Precomputed similarity results for this bill
    #[serde(default)]
    pub similar_bills: Vec<SimilarityMatch>,
}

/// A legislator's committee assignment
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommitteeAssignment {
    /// Committee id
    #[serde(default)]
    pub committee: Option<String>,
    #[serde(default)]
    pub rank: Option<Value>,
    #[serde(default)]
    pub bioguide: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

/// A legislator who cosponsors bills
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Legislator {
    pub bioguide_id: String,
    #[serde(default)]
    pub name_full_official: Option<String>,
    #[serde(default)]
    pub party: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub leadership: Option<String>,
    #[serde(default)]
    pub committees: Vec<CommitteeAssignment>,
    /// Ids of the bills this legislator cosponsored
    #[serde(default)]
    pub bills: Vec<BillRowId>,
}

/// One (legislator, bill) cosponsorship, projected to the roster fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CosponsorRow {
    pub bioguide_id: String,
    pub name_full_official: Option<String>,
    pub party: Option<String>,
    pub state: Option<String>,
    pub leadership: Option<String>,
    pub committees: Vec<CommitteeAssignment>,
    pub bill: BillRowId,
}

/// A CRS report and the bills it covers
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CrsReport {
    pub title: String,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default)]
    pub html_url: Option<String>,
    /// Raw JSON metadata as stored
    #[serde(default)]
    pub metadata: Option<String>,
    #[serde(default)]
    pub bills: Vec<BillKey>,
}

/// A committee report, hearing or markup filed against a bill
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommitteeDocument {
    pub title: String,
    /// Bill number without the congress prefix, e.g. `hr299`
    pub bill_number: String,
    pub congress: String,
    #[serde(default)]
    pub committee: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub original_pdf_link: Option<String>,
}

/// A statement of administration policy on a bill
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Statement {
    pub bill_number: String,
    pub congress: String,
    #[serde(default)]
    pub bill_title: Option<String>,
    #[serde(default)]
    pub agency: Option<String>,
    #[serde(default)]
    pub date_issued: Option<String>,
    #[serde(default)]
    pub permanent_pdf_link: Option<String>,
}

/// A CBO cost estimate
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CboReport {
    pub title: String,
    pub bill_number: String,
    pub congress: String,
    #[serde(default)]
    pub pub_date: Option<String>,
    #[serde(default)]
    pub original_pdf_link: Option<String>,
}

/// Documents filed by bill number within a congress
pub trait BillNumbered {
    fn bill_number(&self) -> &str;
    fn congress(&self) -> &str;
}

impl BillNumbered for CommitteeDocument {
    fn bill_number(&self) -> &str {
        &self.bill_number
    }

    fn congress(&self) -> &str {
        &self.congress
    }
}

impl BillNumbered for Statement {
    fn bill_number(&self) -> &str {
        &self.bill_number
    }

    fn congress(&self) -> &str {
        &self.congress
    }
}

impl BillNumbered for CboReport {
    fn bill_number(&self) -> &str {
        &self.bill_number
    }

    fn congress(&self) -> &str {
        &self.congress
    }
}

/// Documents for any of `bill_numbers` in `congress`. Both comparisons
/// ignore case and surrounding whitespace.
pub fn filter_by_bill_number<T>(
    documents: &[T],
    bill_numbers: &[String],
    congress: u32,
) -> Vec<T>
where
    T: BillNumbered + Clone,
{
    let congress = congress.to_string();
    documents
        .iter()
        .filter(|doc| doc.congress().trim().eq_ignore_ascii_case(&congress))
        .filter(|doc| {
            bill_numbers
                .iter()
                .any(|number| doc.bill_number().trim().eq_ignore_ascii_case(number.trim()))
        })
        .cloned()
        .collect()
}

/// Read-only queries issued while building a bill detail page
pub trait BillRepository {
    fn bill(&self, key: &BillKey) -> Result<BillRow>;

    fn bill_row_id(&self, key: &BillKey) -> Result<BillRowId> {
        self.bill(key).map(|bill| bill.id)
    }

    /// Cosponsorship rows for any of `bill_ids`, in storage order
    fn cosponsor_rows(&self, bill_ids: &[BillRowId]) -> Result<Vec<CosponsorRow>>;

    /// Exactly one legislator with this bioguide id; `Ok(None)` when there is none
    fn legislator(&self, bioguide_id: &str) -> Result<Option<Legislator>>;

    /// CRS reports covering any of `keys`
    fn crs_reports(&self, keys: &[BillKey]) -> Result<Vec<CrsReport>>;

    fn committee_documents(
        &self,
        bill_numbers: &[String],
        congress: u32,
    ) -> Result<Vec<CommitteeDocument>>;

    fn statements(&self, bill_numbers: &[String], congress: u32) -> Result<Vec<Statement>>;

    fn cbo_reports(&self, bill_numbers: &[String], congress: u32) -> Result<Vec<CboReport>>;
}

/// In-memory repository, loadable from a JSON fixture
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryRepository {
    #[serde(default)]
    pub bills: Vec<BillRow>,
    #[serde(default)]
    pub legislators: Vec<Legislator>,
    #[serde(default)]
    pub crs_reports: Vec<CrsReport>,
    #[serde(default)]
    pub committee_documents: Vec<CommitteeDocument>,
    #[serde(default)]
    pub statements: Vec<Statement>,
    #[serde(default)]
    pub cbo_reports: Vec<CboReport>,
}

impl MemoryRepository {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }
}

impl BillRepository for MemoryRepository {
    fn bill(&self, key: &BillKey) -> Result<BillRow> {
        self.bills
            .iter()
            .find(|bill| bill.bill_congress_type_number == *key)
            .cloned()
            .ok_or_else(|| Error::BillNotFound(key.to_string()))
    }

    fn cosponsor_rows(&self, bill_ids: &[BillRowId]) -> Result<Vec<CosponsorRow>> {
        let wanted: HashSet<BillRowId> = bill_ids.iter().copied().collect();
        Ok(self
            .legislators
            .iter()
            .flat_map(|legislator| {
                legislator
                    .bills
                    .iter()
                    .filter(|bill| wanted.contains(bill))
                    .map(move |bill| CosponsorRow {
                        bioguide_id: legislator.bioguide_id.clone(),
                        name_full_official: legislator.name_full_official.clone(),
                        party: legislator.party.clone(),
                        state: legislator.state.clone(),
                        leadership: legislator.leadership.clone(),
                        committees: legislator.committees.clone(),
                        bill: *bill,
                    })
            })
            .collect())
    }

    fn legislator(&self, bioguide_id: &str) -> Result<Option<Legislator>> {
        let mut found = self
            .legislators
            .iter()
            .filter(|legislator| legislator.bioguide_id == bioguide_id);
        match (found.next(), found.next()) {
            (Some(legislator), None) => Ok(Some(legislator.clone())),
            (None, _) => Ok(None),
            (Some(_), Some(_)) => Err(Error::Repository(format!(
                "more than one legislator with bioguide id {}",
                bioguide_id
            ))),
        }
    }

    fn crs_reports(&self, keys: &[BillKey]) -> Result<Vec<CrsReport>> {
        Ok(self
            .crs_reports
            .iter()
            .filter(|report| report.bills.iter().any(|bill| keys.contains(bill)))
            .cloned()
            .collect())
    }

    fn committee_documents(
        &self,
        bill_numbers: &[String],
        congress: u32,
    ) -> Result<Vec<CommitteeDocument>> {
        Ok(filter_by_bill_number(&self.committee_documents, bill_numbers, congress))
    }

    fn statements(&self, bill_numbers: &[String], congress: u32) -> Result<Vec<Statement>> {
        Ok(filter_by_bill_number(&self.statements, bill_numbers, congress))
    }

    fn cbo_reports(&self, bill_numbers: &[String], congress: u32) -> Result<Vec<CboReport>> {
        Ok(filter_by_bill_number(&self.cbo_reports, bill_numbers, congress))
    }
}
