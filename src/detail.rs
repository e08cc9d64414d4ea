//! Context for a single bill's detail page.
//!
//! A [`BillDetail`] lives for one page build. The identical-bill set is
//! computed on first use and reused by every section that needs it.

use crate::congress::BillKey;
use crate::error::Result;
use crate::repository::{
    BillRepository, BillRow, CboReport, CommitteeDocument, CrsReport, Statement,
};
use crate::roster::{self, CommitteesMap, DisplayCosponsor, LookupReport, MergedCosponsor};
use crate::similarity;
use crate::types::{BillCommittee, SimilarityMatch};
use serde::Serialize;
use serde_json::Value;
use std::cell::OnceCell;
use std::collections::HashSet;

const EVERYCRS_FILES: &str = "https://www.everycrsreport.com/files/";
const EVERYCRS_REPORTS: &str = "https://www.everycrsreport.com/reports/";

/// Query keys for documents filed against the current bill or its identical bills
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelatedDocumentKeys {
    /// Congress of the current bill
    pub congress: Option<u32>,
    /// Bill numbers without the congress prefix (`hr299`), current bill first.
    /// Used for committee documents, statements and CBO reports.
    pub bill_numbers: Vec<String>,
    /// Full keys, current bill first. Used for CRS reports.
    pub bill_keys: Vec<BillKey>,
}

pub fn related_document_keys(current: &BillKey, identical: &[BillKey]) -> RelatedDocumentKeys {
    let mut bill_numbers: Vec<String> = Vec::new();
    let mut bill_keys: Vec<BillKey> = Vec::new();

    for key in std::iter::once(current).chain(identical) {
        let number = key.bill_number().to_string();
        if !bill_numbers.contains(&number) {
            bill_numbers.push(number);
        }
        if !bill_keys.contains(key) {
            bill_keys.push(key.clone());
        }
    }

    RelatedDocumentKeys {
        congress: current.congress(),
        bill_numbers,
        bill_keys,
    }
}

/// A CRS report with its everycrsreport.com links
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrsReportContext {
    pub title: String,
    /// Query keys this report covers
    pub identical_bill_number: Vec<BillKey>,
    /// Every bill the report covers
    pub identical_bill_numbers: Vec<BillKey>,
    pub date: Option<String>,
    pub main_everycrs: String,
    pub html_everycrs: String,
    pub pdf_everycrs: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

pub fn crs_report_context(report: &CrsReport, query_keys: &[BillKey]) -> CrsReportContext {
    let mut pdf_everycrs = String::new();
    let mut main_everycrs = String::new();
    if let Some(file) = report.file.as_deref().filter(|f| !f.is_empty()) {
        pdf_everycrs = format!("{}{}", EVERYCRS_FILES, file);
        let parts: Vec<&str> = file.split('_').collect();
        if parts.len() == 3 {
            main_everycrs = format!("{}{}.html", EVERYCRS_REPORTS, parts[1]);
        }
    }

    let html_everycrs = report
        .html_url
        .as_deref()
        .filter(|u| !u.is_empty())
        .map(|u| format!("{}{}", EVERYCRS_FILES, u))
        .unwrap_or_default();

    let link = report
        .metadata
        .as_deref()
        .and_then(|raw| serde_json::from_str::<Value>(raw).ok())
        .and_then(|meta| {
            meta.get("versions")?
                .as_array()?
                .first()
                .map(|version| {
                    version
                        .get("sourceLink")
                        .and_then(Value::as_str)
                        .unwrap_or("")
                        .to_string()
                })
        });

    CrsReportContext {
        title: report.title.clone(),
        identical_bill_number: report
            .bills
            .iter()
            .filter(|bill| query_keys.contains(bill))
            .cloned()
            .collect(),
        identical_bill_numbers: report.bills.clone(),
        date: report.date.clone(),
        main_everycrs,
        html_everycrs,
        pdf_everycrs,
        link,
    }
}

/// Everything the detail page shows about a bill
#[derive(Debug, Clone, Serialize)]
pub struct DetailContext {
    pub bill_congress_type_number: BillKey,
    pub identical_bill_numbers: Vec<BillKey>,
    pub current_bill_score: Option<f64>,
    pub cosponsors: Vec<DisplayCosponsor>,
    pub cosponsor_lookups: LookupReport,
    pub committees_deduped: Vec<BillCommittee>,
    pub committees_map: CommitteesMap,
    pub related_documents: RelatedDocumentKeys,
    pub crs_reports: Vec<CrsReportContext>,
    pub committee_documents: Vec<CommitteeDocument>,
    pub statements: Vec<Statement>,
    pub cbo_reports: Vec<CboReport>,
    pub cosponsors_for_bills: Vec<MergedCosponsor>,
}

/// Section-level matches between a bill and one other bill
#[derive(Debug, Clone, Serialize)]
pub struct BillComparison {
    pub second_bill: BillRow,
    pub bill_to_bill: Vec<SimilarityMatch>,
}

/// Per-request builder for a bill's detail context
pub struct BillDetail<'r> {
    bill: BillRow,
    repo: &'r dyn BillRepository,
    identical: OnceCell<Vec<BillKey>>,
}

impl<'r> BillDetail<'r> {
    pub fn load(repo: &'r dyn BillRepository, key: &BillKey) -> Result<Self> {
        Ok(Self::new(repo.bill(key)?, repo))
    }

    pub fn new(bill: BillRow, repo: &'r dyn BillRepository) -> Self {
        Self {
            bill,
            repo,
            identical: OnceCell::new(),
        }
    }

    pub fn bill(&self) -> &BillRow {
        &self.bill
    }

    pub fn key(&self) -> &BillKey {
        &self.bill.bill_congress_type_number
    }

    /// The bill's own score in its similarity results
    pub fn current_score(&self) -> Option<f64> {
        similarity::current_bill_score(self.key(), &self.bill.similar_bills)
    }

    /// Identical bills, resolved once per builder
    pub fn identical_bill_numbers(&self) -> &[BillKey] {
        self.identical.get_or_init(|| {
            similarity::resolve_identical(
                self.key(),
                &self.bill.similar_bills,
                self.current_score(),
            )
        })
    }

    pub fn committees_deduped(&self) -> Vec<BillCommittee> {
        roster::dedupe_committees(&self.bill.committees)
    }

    pub fn committees_map(&self) -> CommitteesMap {
        roster::committees_map(&self.bill.committees)
    }

    pub fn cosponsors(&self) -> (Vec<DisplayCosponsor>, LookupReport) {
        roster::order_cosponsors(
            self.bill.sponsor.as_ref(),
            &self.bill.cosponsors,
            &self.bill.committees,
            self.repo,
        )
    }

    pub fn cosponsors_for_bills(&self) -> Result<Vec<MergedCosponsor>> {
        roster::merge_roster(
            self.identical_bill_numbers(),
            self.key(),
            &self.committees_map(),
            self.repo,
        )
    }

    pub fn related_documents(&self) -> RelatedDocumentKeys {
        related_document_keys(self.key(), self.identical_bill_numbers())
    }

    /// CRS reports for the bill and its identical bills, one per title
    pub fn crs_reports(&self) -> Result<Vec<CrsReportContext>> {
        let keys = self.related_documents().bill_keys;
        let mut titles = HashSet::new();
        Ok(self
            .repo
            .crs_reports(&keys)?
            .iter()
            .filter(|report| titles.insert(report.title.clone()))
            .map(|report| crs_report_context(report, &keys))
            .collect())
    }

    /// Committee documents for the bill and its identical bills in the bill's congress
    pub fn committee_documents(&self) -> Result<Vec<CommitteeDocument>> {
        let keys = self.related_documents();
        match keys.congress {
            Some(congress) => self.repo.committee_documents(&keys.bill_numbers, congress),
            None => Ok(Vec::new()),
        }
    }

    pub fn statements(&self) -> Result<Vec<Statement>> {
        let keys = self.related_documents();
        match keys.congress {
            Some(congress) => self.repo.statements(&keys.bill_numbers, congress),
            None => Ok(Vec::new()),
        }
    }

    pub fn cbo_reports(&self) -> Result<Vec<CboReport>> {
        let keys = self.related_documents();
        match keys.congress {
            Some(congress) => self.repo.cbo_reports(&keys.bill_numbers, congress),
            None => Ok(Vec::new()),
        }
    }

    /// The other bill plus this bill's similarity rows that point at it.
    /// An unknown `second` is an error; no matching rows is an empty list.
    pub fn compare(&self, second: &BillKey) -> Result<BillComparison> {
        let second_bill = self.repo.bill(second)?;
        let bill_to_bill = self
            .bill
            .similar_bills
            .iter()
            .filter(|m| m.key() == *second)
            .cloned()
            .collect();
        Ok(BillComparison {
            second_bill,
            bill_to_bill,
        })
    }

    pub fn context(&self) -> Result<DetailContext> {
        let (cosponsors, cosponsor_lookups) = self.cosponsors();
        Ok(DetailContext {
            bill_congress_type_number: self.key().clone(),
            identical_bill_numbers: self.identical_bill_numbers().to_vec(),
            current_bill_score: self.current_score(),
            cosponsors,
            cosponsor_lookups,
            committees_deduped: self.committees_deduped(),
            committees_map: self.committees_map(),
            related_documents: self.related_documents(),
            crs_reports: self.crs_reports()?,
            committee_documents: self.committee_documents()?,
            statements: self.statements()?,
            cbo_reports: self.cbo_reports()?,
            cosponsors_for_bills: self.cosponsors_for_bills()?,
        })
    }
}
