//! Traversal of the bill-status directory tree.
//!
//! Expected layout: `<root>/<congress>/bills/<type>/<type><number>/data.json`.
//! The flat `<root>/<congress>/bills/<type><number>/data.json` layout is
//! accepted too.

use crate::error::{Error, Result};
use crate::types::BillFile;
use jwalk::{Parallelism, WalkDir};
use regex::Regex;
use std::path::{Component, Path};
use std::sync::OnceLock;
use tracing::{debug, info};

/// Name of the per-bill status file
pub const DATA_JSON: &str = "data.json";

fn bill_dir_regex() -> &'static Regex {
    static BILL_DIR: OnceLock<Regex> = OnceLock::new();
    BILL_DIR.get_or_init(|| Regex::new(r"^[a-z]+[0-9]+$").expect("static bill dir pattern"))
}

fn segments(path: &Path) -> Vec<String> {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().to_string()),
            _ => None,
        })
        .collect()
}

/// True for the top-level directory of a single bill, e.g. `.../116/bills/hr/hr1`
pub fn is_bill_top_level(dir: &Path) -> bool {
    let parts = segments(dir);
    let n = parts.len();
    if n < 2 || !bill_dir_regex().is_match(&parts[n - 1]) {
        return false;
    }
    parts[n - 2] == "bills" || (n >= 3 && parts[n - 3] == "bills")
}

pub fn is_data_json(file_name: &str) -> bool {
    file_name == DATA_JSON
}

/// Walk `root` and call `on_file(directory, file_name)` for every file accepted
/// by `file_match` inside a directory accepted by `dir_match`.
///
/// Traversal is serial and sorted. Unreadable entries are skipped.
/// Returns the number of files handed to the callback.
pub fn walk_bill_dirs<D, F, P>(root: &Path, dir_match: D, file_match: F, mut on_file: P) -> usize
where
    D: Fn(&Path) -> bool,
    F: Fn(&str) -> bool,
    P: FnMut(&Path, &str),
{
    let mut matched = 0;

    for entry_result in WalkDir::new(root)
        .parallelism(Parallelism::Serial)
        .sort(true)
        .into_iter()
    {
        let entry = match entry_result {
            Ok(e) => e,
            Err(e) => {
                debug!("Skipping unreadable entry: {}", e);
                continue;
            }
        };

        if entry.file_type().is_dir() {
            if dir_match(&entry.path()) {
                info!("Entering directory: {}", entry.path().display());
            }
            continue;
        }

        if !entry.file_type().is_file() {
            continue;
        }

        let parent = entry.parent_path();
        let file_name = entry.file_name().to_string_lossy();
        if dir_match(parent) && file_match(&file_name) {
            on_file(parent, &file_name);
            matched += 1;
        }
    }

    matched
}

/// Collect every `data.json` under `root` with its path relative to `root`
pub fn discover_bill_files(root: &Path) -> Result<Vec<BillFile>> {
    if !root.is_dir() {
        return Err(Error::Path(format!(
            "Bill data directory does not exist: {}",
            root.display()
        )));
    }

    let mut files = Vec::new();
    walk_bill_dirs(root, is_bill_top_level, is_data_json, |dir, file_name| {
        let path = dir.join(file_name);
        let relative_path = pathdiff::diff_paths(&path, root)
            .map(|p| p.to_string_lossy().to_string())
            .unwrap_or_else(|| path.to_string_lossy().to_string());
        files.push(BillFile {
            path,
            relative_path,
        });
    });

    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_is_bill_top_level() {
        assert!(is_bill_top_level(Path::new("data/116/bills/hr/hr1")));
        assert!(is_bill_top_level(Path::new("data/116/bills/hr1")));
        assert!(is_bill_top_level(Path::new("/congress/data/93/bills/sjres/sjres12")));
        assert!(!is_bill_top_level(Path::new("data/116/bills/hr1/text-versions")));
        assert!(!is_bill_top_level(Path::new("data/116/bills/hr/hr1/text-versions")));
        assert!(!is_bill_top_level(Path::new("data/116/bills/hr")));
        assert!(!is_bill_top_level(Path::new("data/116/amendments/hamdt/hamdt1")));
    }

    #[test]
    fn test_is_data_json() {
        assert!(is_data_json("data.json"));
        assert!(!is_data_json("data.xml"));
        assert!(!is_data_json("fdsys_billstatus.xml"));
    }

    #[test]
    fn test_walk_bill_dirs_matches_layout() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        for rel in [
            "116/bills/hr/hr1/data.json",
            "116/bills/hr/hr1/data.xml",
            "116/bills/hr/hr1/text-versions/ih/data.json",
            "116/bills/s/s5/data.json",
            "116/amendments/samdt/samdt1/data.json",
        ] {
            let path = root.join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(&path, "{}").unwrap();
        }

        let mut seen = Vec::new();
        let count = walk_bill_dirs(root, is_bill_top_level, is_data_json, |dir, name| {
            seen.push(dir.join(name));
        });

        assert_eq!(count, 2);
        assert_eq!(
            seen,
            vec![
                root.join("116/bills/hr/hr1/data.json"),
                root.join("116/bills/s/s5/data.json"),
            ]
        );

        let files = discover_bill_files(root).unwrap();
        assert_eq!(files[0].relative_path, "116/bills/hr/hr1/data.json");
    }

    #[test]
    fn test_discover_missing_root() {
        assert!(discover_bill_files(Path::new("/definitely/not/here")).is_err());
    }
}
