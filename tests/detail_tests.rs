use std::path::PathBuf;

use billdata::prelude::*;
use serde_json::json;

fn fixture_repo() -> MemoryRepository {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join("detail.json");
    MemoryRepository::load(&path).expect("fixture should load")
}

fn keys(detail: &[BillKey]) -> Vec<&str> {
    detail.iter().map(BillKey::as_str).collect()
}

#[test]
fn test_identical_bills() {
    let repo = fixture_repo();
    let detail = BillDetail::load(&repo, &BillKey::from("116hr299")).unwrap();

    assert_eq!(detail.current_score(), Some(100.0));
    // s1195 is within the score threshold, hr300 has an identical reason
    assert_eq!(
        keys(detail.identical_bill_numbers()),
        vec!["116hr299", "116hr300", "116s1195"]
    );
}

#[test]
fn test_context() {
    let repo = fixture_repo();
    let detail = BillDetail::load(&repo, &BillKey::from("116hr299")).unwrap();
    let context = detail.context().unwrap();

    let names: Vec<&str> = context
        .cosponsors
        .iter()
        .map(|c| c.name.as_deref().unwrap_or(""))
        .collect();
    assert_eq!(
        names,
        vec!["Takano, Mark", "Roe, Phil", "Amodei, Mark E.", "Bilirakis, Gus M."]
    );
    assert!(context.cosponsors[0].sponsor);
    assert_eq!(context.cosponsors[0].bracket(), "[D-CA41]");
    assert!(context.cosponsors[1].current);
    assert_eq!(context.cosponsors[1].rank, Some(json!(1)));
    assert_eq!(context.cosponsor_lookups.skipped().count(), 2);

    assert_eq!(context.committees_deduped.len(), 2);
    assert_eq!(
        context.related_documents.bill_numbers,
        vec!["hr299", "hr300", "s1195"]
    );

    assert_eq!(context.crs_reports.len(), 1);
    let report = &context.crs_reports[0];
    assert_eq!(keys(&report.identical_bill_number), vec!["116hr299", "116s1195"]);
    assert_eq!(
        report.main_everycrs,
        "https://www.everycrsreport.com/reports/R45777.html"
    );
    assert_eq!(
        report.link.as_deref(),
        Some("https://crsreports.congress.gov/product/pdf/R/R45777")
    );
}

#[test]
fn test_merged_roster() {
    let repo = fixture_repo();
    let detail = BillDetail::load(&repo, &BillKey::from("116hr299")).unwrap();
    let roster = detail.cosponsors_for_bills().unwrap();

    let summary: Vec<String> = roster
        .iter()
        .map(|c| {
            format!(
                "{}:{}",
                c.row.bioguide_id,
                keys(&c.bill_congress_type_numbers).join("+")
            )
        })
        .collect();
    insta::assert_snapshot!(summary.join(" "), @"R000582:116hr299+116s1195 B001257:116hr299 M000355:116hr300");

    assert_eq!(roster[0].committees_named, vec!["House Veterans' Affairs"]);
    assert_eq!(roster[0].ranks, vec![Some(json!(1))]);
}

#[test]
fn test_related_documents() {
    let repo = fixture_repo();
    let detail = BillDetail::load(&repo, &BillKey::from("116hr299")).unwrap();
    let context = detail.context().unwrap();

    // Bill numbers match case-insensitively, and only within the 116th congress
    let committee_titles: Vec<&str> = context
        .committee_documents
        .iter()
        .map(|doc| doc.title.as_str())
        .collect();
    assert_eq!(committee_titles, vec!["Markup of H.R. 299", "Hearing on S. 1195"]);

    assert_eq!(context.statements.len(), 1);
    assert_eq!(context.statements[0].agency.as_deref(), Some("OMB"));

    // hr301 is similar but not identical
    assert_eq!(context.cbo_reports.len(), 1);
    assert_eq!(context.cbo_reports[0].title, "S. 1195 cost estimate");
}

#[test]
fn test_compare_bills() {
    let repo = fixture_repo();
    let detail = BillDetail::load(&repo, &BillKey::from("116hr299")).unwrap();

    let comparison = detail.compare(&BillKey::from("116s1195")).unwrap();
    assert_eq!(comparison.second_bill.id, 2);
    let sections: Vec<Option<&str>> = comparison
        .bill_to_bill
        .iter()
        .map(|m| m.section.as_deref())
        .collect();
    assert_eq!(
        sections,
        vec![None, Some("SEC. 2. Presumptions of service connection")]
    );

    // Known bill, but no similarity rows point at it
    let detail = BillDetail::load(&repo, &BillKey::from("116hr301")).unwrap();
    let comparison = detail.compare(&BillKey::from("116hr299")).unwrap();
    assert!(comparison.bill_to_bill.is_empty());

    assert!(matches!(
        detail.compare(&BillKey::from("116hr9999")),
        Err(Error::BillNotFound(_))
    ));
}

#[test]
fn test_unknown_bill() {
    let repo = fixture_repo();
    let result = BillDetail::load(&repo, &BillKey::from("116hr9999"));
    assert!(matches!(result, Err(Error::BillNotFound(_))));
}

#[test]
fn test_bill_without_similarity_results() {
    let repo = fixture_repo();
    let detail = BillDetail::load(&repo, &BillKey::from("116hr301")).unwrap();

    assert_eq!(detail.current_score(), None);
    assert!(detail.identical_bill_numbers().is_empty());

    // The roster still covers the bill itself
    let roster = detail.cosponsors_for_bills().unwrap();
    assert_eq!(roster.len(), 1);
    assert_eq!(keys(&roster[0].bill_congress_type_numbers), vec!["116hr301"]);
    assert!(roster[0].committees_named.is_empty());
    let context = detail.context().unwrap();
    assert!(context.cosponsors.is_empty());
    assert!(context.crs_reports.is_empty());
    assert!(context.statements.is_empty());
    assert_eq!(context.cbo_reports.len(), 1);
}
