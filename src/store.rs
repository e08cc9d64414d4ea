use crate::error::{Error, Result};
use crate::types::BillsMeta;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Path of the gzip sibling of a metadata artifact (`billsMeta.json.gz`)
pub fn gz_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".gz");
    PathBuf::from(name)
}

/// Serialize the metadata index. Key order is fixed by the map type, so
/// equal indexes always produce equal bytes.
pub fn to_bytes(meta: &BillsMeta) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(meta)?)
}

/// Hex SHA-256 of the serialized index
pub fn digest(meta: &BillsMeta) -> Result<String> {
    let bytes = to_bytes(meta)?;
    let hash = Sha256::digest(&bytes);
    Ok(hash.iter().map(|b| format!("{:02x}", b)).collect())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

/// Write through a `.tmp` sibling and rename it over `path`, so a reader
/// sees either the previous file or the complete new one.
fn replace_file<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(File) -> std::io::Result<()>,
{
    let tmp = tmp_path(path);
    let written = File::create(&tmp)
        .and_then(write)
        .and_then(|_| fs::rename(&tmp, path));
    if let Err(e) = written {
        let _ = fs::remove_file(&tmp);
        return Err(e.into());
    }
    Ok(())
}

/// Write a full snapshot of `meta` to `path`, and to `path.gz` when `compress` is set.
/// Each file is replaced whole; a failed save leaves the previous snapshot in place.
pub fn save_bills_meta(meta: &BillsMeta, path: &Path, compress: bool) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let bytes = to_bytes(meta)?;

    replace_file(path, |file| {
        let mut writer = BufWriter::new(file);
        writer.write_all(&bytes)?;
        writer.into_inner().map_err(|e| e.into_error())?.sync_all()
    })?;

    if compress {
        replace_file(&gz_path(path), |file| {
            let mut encoder = GzEncoder::new(file, Compression::default());
            encoder.write_all(&bytes)?;
            encoder.finish()?.sync_all()
        })?;
    }

    Ok(())
}

/// Load a metadata index. With `compressed`, reads `path.gz` instead of `path`.
/// A missing file is an error; there is no partial load.
pub fn load_bills_meta(path: &Path, compressed: bool) -> Result<BillsMeta> {
    let source = if compressed { gz_path(path) } else { path.to_path_buf() };
    if !source.is_file() {
        return Err(Error::MetadataNotFound(source.display().to_string()));
    }

    let file = File::open(&source)?;
    let meta = if compressed {
        serde_json::from_reader(BufReader::new(GzDecoder::new(file)))?
    } else {
        serde_json::from_reader(BufReader::new(file))?
    };
    Ok(meta)
}
