use crate::config::Config;
use crate::error::{Error, Result};
use crate::selectors::{self, Stage};
use crate::store;
use crate::types::{BillMetaEntry, BillRecord, BillSummary, BillsMeta};
use crate::walker;
use async_stream::stream;
use futures::Stream;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Lifecycle of a metadata aggregation run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AggregatorState {
    Idle,
    Walking,
    Accumulating,
    Checkpointing,
    Done,
}

/// A bill file that did not make it into the index
#[derive(Debug, Clone, Serialize)]
pub struct SkippedRecord {
    pub path: PathBuf,
    pub reason: String,
}

/// Summary of an aggregation run
#[derive(Debug, Clone, Default, Serialize)]
pub struct AggregationReport {
    pub files_seen: usize,
    pub accumulated: usize,
    pub new_keys: usize,
    pub checkpoints: usize,
    pub total_keys: usize,
    pub skipped: Vec<SkippedRecord>,
    /// SHA-256 of the final snapshot
    pub digest: String,
}

/// Build the index entry for one record
pub fn meta_entry(record: &BillRecord) -> BillMetaEntry {
    let titles = selectors::extract_titles(record, true, Stage::All);
    BillMetaEntry {
        titles: selectors::title_texts(titles.iter().copied()),
        titles_whole_bill: selectors::title_texts(
            titles.iter().copied().filter(|title| !title.is_for_portion),
        ),
        cosponsors: selectors::cosponsor_refs(record),
    }
}

/// Read and parse a single `data.json`
pub fn load_record(path: &Path) -> Result<BillRecord> {
    let contents = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}

/// Walks the bill corpus and accumulates [`BillsMeta`], checkpointing the
/// full index every `save_every` new keys and once more at the end.
pub struct BillsMetaAggregator {
    config: Config,
    meta: BillsMeta,
    state: AggregatorState,
    report: AggregationReport,
    failure: Option<Error>,
}

impl BillsMetaAggregator {
    /// Start from an existing index (empty for a fresh run). Keys already
    /// present are overwritten when their bill is seen again.
    pub fn new(config: Config, meta: BillsMeta) -> Self {
        Self {
            config,
            meta,
            state: AggregatorState::Idle,
            report: AggregationReport::default(),
            failure: None,
        }
    }

    pub fn state(&self) -> AggregatorState {
        self.state
    }

    pub fn meta(&self) -> &BillsMeta {
        &self.meta
    }

    pub fn report(&self) -> &AggregationReport {
        &self.report
    }

    /// Hand back the accumulated index
    pub fn into_meta(self) -> BillsMeta {
        self.meta
    }

    /// Walk the corpus, then write the final checkpoint.
    ///
    /// On failure the aggregator stays in the state it failed in.
    pub fn run(&mut self) -> Result<&AggregationReport> {
        let root = self.config.walk_root();
        info!("Walking bill data in {}", root.display());
        self.state = AggregatorState::Walking;

        walker::walk_bill_dirs(
            &root,
            walker::is_bill_top_level,
            walker::is_data_json,
            |dir, file_name| self.accumulate(dir, file_name),
        );

        if let Some(e) = self.failure.take() {
            return Err(e);
        }

        self.checkpoint()?;
        self.state = AggregatorState::Done;
        self.report.total_keys = self.meta.len();
        self.report.digest = store::digest(&self.meta)?;

        info!(
            "Aggregated {} bills ({} new, {} skipped, {} checkpoints)",
            self.report.total_keys,
            self.report.new_keys,
            self.report.skipped.len(),
            self.report.checkpoints
        );
        Ok(&self.report)
    }

    fn accumulate(&mut self, dir: &Path, file_name: &str) {
        if self.failure.is_some() {
            return;
        }

        self.state = AggregatorState::Accumulating;
        self.report.files_seen += 1;
        let path = dir.join(file_name);
        debug!("Processing: {}", path.display());

        let record = match load_record(&path) {
            Ok(record) => record,
            Err(e) => {
                warn!("Skipping unreadable bill file {}: {}", path.display(), e);
                self.skip(path, e.to_string());
                return;
            }
        };

        // bill_key logs the reason
        let Some(key) = selectors::bill_key(&record) else {
            self.skip(path, "no usable bill_id".to_string());
            return;
        };

        let is_new = self.meta.insert(key, meta_entry(&record)).is_none();
        self.report.accumulated += 1;

        if is_new {
            self.report.new_keys += 1;
            if self.meta.len() % self.config.save_every == 0 {
                if let Err(e) = self.checkpoint() {
                    self.failure = Some(e);
                    return;
                }
            }
        }

        self.state = AggregatorState::Walking;
    }

    fn skip(&mut self, path: PathBuf, reason: String) {
        self.report.skipped.push(SkippedRecord { path, reason });
        self.state = AggregatorState::Walking;
    }

    fn checkpoint(&mut self) -> Result<()> {
        self.state = AggregatorState::Checkpointing;
        info!(
            "Saving {} bills to {}",
            self.meta.len(),
            self.config.meta_path.display()
        );
        store::save_bills_meta(&self.meta, &self.config.meta_path, self.config.compress)?;
        self.report.checkpoints += 1;
        Ok(())
    }
}

/// Options for the record stream
#[derive(Debug, Clone)]
pub struct RecordOptions {
    pub include_partial: bool,
    pub stage: Stage,
    pub cosponsor_fields: Vec<String>,
    pub limit: Option<usize>,
}

impl Default for RecordOptions {
    fn default() -> Self {
        Self {
            include_partial: true,
            stage: Stage::All,
            cosponsor_fields: vec!["name".to_string(), "bioguide_id".to_string()],
            limit: None,
        }
    }
}

/// Stream a [`BillSummary`] for every bill file under `root`.
/// Discovery runs on the blocking pool; records without a key are skipped.
pub fn stream_records(
    root: PathBuf,
    options: RecordOptions,
) -> impl Stream<Item = Result<BillSummary>> {
    Box::pin(stream! {
        let discovery_root = root.clone();
        let files = match tokio::task::spawn_blocking(move || {
            walker::discover_bill_files(&discovery_root)
        }).await {
            Ok(Ok(files)) => files,
            Ok(Err(e)) => {
                yield Err(e);
                return;
            }
            Err(e) => {
                yield Err(Error::Io(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    format!("Task join error: {}", e)
                )));
                return;
            }
        };

        let limit = options.limit.unwrap_or(usize::MAX);
        let mut emitted = 0;

        for file in files {
            if emitted >= limit {
                break;
            }

            let contents = match tokio::fs::read_to_string(&file.path).await {
                Ok(c) => c,
                Err(e) => {
                    yield Err(Error::Io(e));
                    continue;
                }
            };
            let record: BillRecord = match serde_json::from_str(&contents) {
                Ok(r) => r,
                Err(e) => {
                    yield Err(Error::Json(e));
                    continue;
                }
            };
            let key = match selectors::bill_key(&record) {
                Some(key) => key,
                None => continue,
            };

            let titles = selectors::extract_titles(&record, options.include_partial, options.stage);
            emitted += 1;
            yield Ok(BillSummary {
                bill_congress_type_number: key,
                filename: file.relative_path,
                titles: selectors::title_texts(titles),
                cosponsors: selectors::extract_cosponsors(&record, &options.cosponsor_fields),
            });
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigBuilder;
    use crate::congress::{BillKey, CongressSession};
    use serde_json::json;
    use tempfile::tempdir;

    const FIXED: CongressSession = CongressSession {
        congress: 116,
        session: 1,
    };

    fn builder(data: &Path) -> ConfigBuilder {
        ConfigBuilder::new(data, FIXED)
    }

    fn write_bill(root: &Path, congress: u32, bill_type: &str, number: u32) {
        let dir = root
            .join(congress.to_string())
            .join("bills")
            .join(bill_type)
            .join(format!("{}{}", bill_type, number));
        fs::create_dir_all(&dir).unwrap();
        let record = json!({
            "bill_id": format!("{}{}-{}", bill_type, number, congress),
            "titles": [
                {"title": format!("Title {}", number), "is_for_portion": false, "as": "introduced"},
                {"title": "Portion", "is_for_portion": true, "as": "introduced"}
            ],
            "cosponsors": [{"name": "Roe, Phil", "bioguide_id": "R000582", "party": "R"}]
        });
        fs::write(dir.join("data.json"), record.to_string()).unwrap();
    }

    #[test]
    fn test_meta_entry() {
        let record: BillRecord = serde_json::from_value(json!({
            "bill_id": "hr1-116",
            "titles": [
                {"title": "Whole", "is_for_portion": false},
                {"title": "Part", "is_for_portion": true},
                {"is_for_portion": false}
            ],
            "cosponsors": [{"name": "A", "bioguide_id": "A1", "state": "CA"}]
        }))
        .unwrap();

        let entry = meta_entry(&record);
        assert_eq!(entry.titles, vec!["Whole", "Part"]);
        assert_eq!(entry.titles_whole_bill, vec!["Whole"]);
        assert_eq!(entry.cosponsors.len(), 1);
        assert_eq!(entry.cosponsors[0].bioguide_id.as_deref(), Some("A1"));
    }

    #[test]
    fn test_checkpoints_every_n_new_keys() {
        let data = tempdir().unwrap();
        let out = tempdir().unwrap();
        for n in 1..=5 {
            write_bill(data.path(), 116, "hr", n);
        }

        let config = builder(data.path())
            .meta_path(out.path().join("billsMeta.json"))
            .save_every(2)
            .build()
            .unwrap();

        let mut aggregator = BillsMetaAggregator::new(config, BillsMeta::new());
        assert_eq!(aggregator.state(), AggregatorState::Idle);
        let report = aggregator.run().unwrap();

        // keys 2 and 4, plus the final save
        assert_eq!(report.checkpoints, 3);
        assert_eq!(aggregator.state(), AggregatorState::Done);
        assert_eq!(aggregator.into_meta().len(), 5);
        assert!(out.path().join("billsMeta.json.gz").exists());
    }

    #[test]
    fn test_only_new_keys_advance_checkpoints() {
        let data = tempdir().unwrap();
        let out = tempdir().unwrap();
        for n in [1, 2, 4, 5] {
            write_bill(data.path(), 116, "hr", n);
        }
        let keyless = data.path().join("116/bills/hr/hr3");
        fs::create_dir_all(&keyless).unwrap();
        fs::write(keyless.join("data.json"), r#"{"bill_type": "hr"}"#).unwrap();

        let mut existing = BillsMeta::new();
        existing.insert(BillKey::from("116hr1"), BillMetaEntry::default());
        existing.insert(BillKey::from("116hr2"), BillMetaEntry::default());
        existing.insert(BillKey::from("115s9"), BillMetaEntry::default());

        let config = builder(data.path())
            .meta_path(out.path().join("billsMeta.json"))
            .save_every(2)
            .resume(true)
            .build()
            .unwrap();
        let mut aggregator = BillsMetaAggregator::new(config, existing);
        let report = aggregator.run().unwrap().clone();

        assert_eq!(report.accumulated, 4);
        assert_eq!(report.new_keys, 2);
        assert_eq!(report.skipped.len(), 1);
        // hr4 brings the index to 4 keys; hr1, hr2 and the keyless record never count
        assert_eq!(report.checkpoints, 2);
        assert_eq!(aggregator.into_meta().len(), 5);
    }

    #[test]
    fn test_resume_overwrites_existing_keys() {
        let data = tempdir().unwrap();
        let out = tempdir().unwrap();
        write_bill(data.path(), 116, "hr", 1);

        let mut existing = BillsMeta::new();
        existing.insert(BillKey::from("116hr1"), BillMetaEntry::default());
        existing.insert(BillKey::from("115s9"), BillMetaEntry::default());

        let config = builder(data.path())
            .meta_path(out.path().join("billsMeta.json"))
            .compress(false)
            .build()
            .unwrap();
        let mut aggregator = BillsMetaAggregator::new(config, existing);
        assert_eq!(aggregator.run().unwrap().new_keys, 0);

        let meta = aggregator.into_meta();
        assert_eq!(meta.len(), 2);
        assert_eq!(meta[&BillKey::from("116hr1")].titles_whole_bill, vec!["Title 1"]);
        assert!(!out.path().join("billsMeta.json.gz").exists());
    }

    #[test]
    fn test_records_without_key_are_skipped() {
        let data = tempdir().unwrap();
        let out = tempdir().unwrap();
        write_bill(data.path(), 116, "hr", 1);
        let bad = data.path().join("116/bills/hr/hr2");
        fs::create_dir_all(&bad).unwrap();
        fs::write(bad.join("data.json"), r#"{"bill_type": "hr"}"#).unwrap();
        let broken = data.path().join("116/bills/hr/hr3");
        fs::create_dir_all(&broken).unwrap();
        fs::write(broken.join("data.json"), "{not json").unwrap();

        let config = builder(data.path())
            .meta_path(out.path().join("billsMeta.json"))
            .save_every(1)
            .build()
            .unwrap();
        let mut aggregator = BillsMetaAggregator::new(config, BillsMeta::new());
        let report = aggregator.run().unwrap();

        assert_eq!(report.files_seen, 3);
        assert_eq!(report.skipped.len(), 2);
        // one for the single key, one final
        assert_eq!(report.checkpoints, 2);
        assert_eq!(aggregator.into_meta().len(), 1);
    }

    #[test]
    fn test_failed_checkpoint_keeps_state() {
        let data = tempdir().unwrap();
        let out = tempdir().unwrap();
        write_bill(data.path(), 116, "hr", 1);
        // A directory where the artifact should go makes every save fail
        let meta_path = out.path().join("billsMeta.json");
        fs::create_dir_all(&meta_path).unwrap();

        let config = builder(data.path())
            .meta_path(&meta_path)
            .save_every(1)
            .build()
            .unwrap();
        let mut aggregator = BillsMetaAggregator::new(config, BillsMeta::new());

        assert!(aggregator.run().is_err());
        assert_eq!(aggregator.state(), AggregatorState::Checkpointing);
    }

    #[tokio::test]
    async fn test_stream_records() {
        use futures::StreamExt;

        let data = tempdir().unwrap();
        write_bill(data.path(), 116, "hr", 1);
        write_bill(data.path(), 116, "s", 2);

        let options = RecordOptions {
            include_partial: false,
            ..RecordOptions::default()
        };
        let summaries: Vec<BillSummary> = stream_records(data.path().to_path_buf(), options)
            .filter_map(|r| async move { r.ok() })
            .collect()
            .await;

        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].bill_congress_type_number.as_str(), "116hr1");
        assert_eq!(summaries[0].titles, vec!["Title 1"]);
        assert_eq!(summaries[1].filename, "116/bills/s/s2/data.json");
        assert_eq!(summaries[1].cosponsors[0].len(), 2);
    }
}
