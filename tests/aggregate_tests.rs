use std::fs;
use std::path::Path;

use billdata::prelude::*;
use billdata::store;
use serde_json::json;
use tempfile::tempdir;

fn write_record(root: &Path, relative: &str, record: serde_json::Value) {
    let dir = root.join(relative);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("data.json"), record.to_string()).unwrap();
}

fn corpus(root: &Path) {
    write_record(
        root,
        "116/bills/hr/hr299",
        json!({
            "bill_id": "hr299-116",
            "bill_type": "hr",
            "titles": [
                {"title": "Blue Water Navy Vietnam Veterans Act of 2019", "is_for_portion": false, "as": "introduced", "type": "short"},
                {"title": "Short portion", "is_for_portion": true, "as": "introduced", "type": "short"}
            ],
            "cosponsors": [
                {"name": "Roe, Phil", "bioguide_id": "R000582", "state": "TN", "district": 1, "original_cosponsor": true}
            ]
        }),
    );
    write_record(
        root,
        "116/bills/s/s1195",
        json!({
            "bill_id": "s1195-116",
            "titles": [{"title": "Senate companion", "is_for_portion": false}],
            "cosponsors": []
        }),
    );
    // Parent-only layout
    write_record(
        root,
        "115/bills/hr1",
        json!({"bill_id": "hr1-115", "titles": [], "cosponsors": []}),
    );
    // Not a bill directory
    write_record(root, "116/amendments/hamdt/hamdt1", json!({"amendment_id": "hamdt1-116"}));
}

const SESSION: CongressSession = CongressSession {
    congress: 116,
    session: 2,
};

fn aggregate(data: &Path, meta_path: &Path) -> (BillsMeta, billdata::AggregationReport) {
    let config = ConfigBuilder::new(data, SESSION)
        .meta_path(meta_path)
        .build()
        .unwrap();
    let mut aggregator = BillsMetaAggregator::new(config, BillsMeta::new());
    let report = aggregator.run().unwrap().clone();
    (aggregator.into_meta(), report)
}

#[test]
fn test_index_contents() {
    let data = tempdir().unwrap();
    let out = tempdir().unwrap();
    corpus(data.path());

    let (meta, report) = aggregate(data.path(), &out.path().join("billsMeta.json"));

    let keys: Vec<&str> = meta.keys().map(BillKey::as_str).collect();
    assert_eq!(keys, vec!["115hr1", "116hr299", "116s1195"]);
    assert_eq!(report.files_seen, 3);
    assert!(report.skipped.is_empty());

    let entry = serde_json::to_string(&meta[&BillKey::from("116hr299")]).unwrap();
    insta::assert_snapshot!(entry, @r#"{"titles":["Blue Water Navy Vietnam Veterans Act of 2019","Short portion"],"titles_whole_bill":["Blue Water Navy Vietnam Veterans Act of 2019"],"cosponsors":[{"name":"Roe, Phil","bioguide_id":"R000582"}]}"#);
}

#[test]
fn test_reruns_are_byte_identical() {
    let data = tempdir().unwrap();
    let out = tempdir().unwrap();
    corpus(data.path());

    let first = out.path().join("first/billsMeta.json");
    let second = out.path().join("second/billsMeta.json");
    let (_, a) = aggregate(data.path(), &first);
    let (_, b) = aggregate(data.path(), &second);

    assert_eq!(a.digest, b.digest);
    assert_eq!(fs::read(&first).unwrap(), fs::read(&second).unwrap());
}

#[test]
fn test_gzip_sibling_matches_plain() {
    let data = tempdir().unwrap();
    let out = tempdir().unwrap();
    corpus(data.path());
    let meta_path = out.path().join("billsMeta.json");

    let (meta, _) = aggregate(data.path(), &meta_path);

    assert!(store::gz_path(&meta_path).is_file());
    let plain = store::load_bills_meta(&meta_path, false).unwrap();
    let compressed = store::load_bills_meta(&meta_path, true).unwrap();
    assert_eq!(plain, meta);
    assert_eq!(compressed, meta);
}

#[test]
fn test_single_congress_walk() {
    let data = tempdir().unwrap();
    let out = tempdir().unwrap();
    corpus(data.path());

    let config = ConfigBuilder::new(data.path(), SESSION)
        .meta_path(out.path().join("billsMeta.json"))
        .congress(115)
        .build()
        .unwrap();
    let mut aggregator = BillsMetaAggregator::new(config, BillsMeta::new());
    aggregator.run().unwrap();
    let meta = aggregator.into_meta();

    assert_eq!(meta.len(), 1);
    assert!(meta.contains_key(&BillKey::from("115hr1")));
}

#[test]
fn test_missing_index_is_an_error() {
    let out = tempdir().unwrap();
    let result = store::load_bills_meta(&out.path().join("billsMeta.json"), true);
    assert!(matches!(result, Err(Error::MetadataNotFound(_))));
}
