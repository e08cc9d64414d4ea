use crate::congress::CongressSession;
use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default location of the bill-status corpus
pub const DEFAULT_DATA_DIR: &str = "../congress/data";
/// Default location of the metadata artifact
pub const DEFAULT_META_PATH: &str = "../billsMeta.json";
/// Entries accumulated between checkpoints
pub const SAVE_ON_COUNT: usize = 1000;

/// Configuration for the metadata aggregator
#[derive(Debug, Clone)]
pub struct Config {
    pub data_dir: PathBuf,
    pub meta_path: PathBuf,
    pub save_every: usize,
    pub compress: bool,
    /// Restrict the walk to a single congress directory
    pub congress: Option<u32>,
    /// Load the existing artifact before walking
    pub resume: bool,
    /// Congress in session when the process started
    pub current: CongressSession,
}

impl Config {
    /// Default settings for `data_dir`. `current` is computed once by the
    /// caller; nothing here reads the clock.
    pub fn new(data_dir: impl Into<PathBuf>, current: CongressSession) -> Self {
        Self {
            data_dir: data_dir.into(),
            meta_path: PathBuf::from(DEFAULT_META_PATH),
            save_every: SAVE_ON_COUNT,
            compress: true,
            congress: None,
            resume: false,
            current,
        }
    }

    /// Directory the walker starts from
    pub fn walk_root(&self) -> PathBuf {
        match self.congress {
            Some(congress) => self.data_dir.join(congress.to_string()),
            None => self.data_dir.clone(),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        let root = self.walk_root();
        if !root.exists() {
            return Err(Error::Config(format!(
                "Data directory does not exist: {}",
                root.display()
            )));
        }

        if !root.is_dir() {
            return Err(Error::Config(format!(
                "Data directory is not a directory: {}",
                root.display()
            )));
        }

        if self.save_every == 0 {
            return Err(Error::Config("save_every must be at least 1".to_string()));
        }

        Ok(())
    }
}

/// Settings read from a `billdata.yml` file. Every key is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub data_dir: Option<PathBuf>,
    pub meta_path: Option<PathBuf>,
    pub save_every: Option<usize>,
    pub compress: Option<bool>,
    pub congress: Option<String>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;
        Ok(serde_yaml::from_str(&contents)?)
    }
}

/// Builder for creating configurations
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder with default settings
    pub fn new(data_dir: impl Into<PathBuf>, current: CongressSession) -> Self {
        Self {
            config: Config::new(data_dir, current),
        }
    }

    /// Apply values from a config file on top of the current settings
    pub fn file(mut self, file: FileConfig) -> Result<Self> {
        if let Some(dir) = file.data_dir {
            self.config.data_dir = dir;
        }
        if let Some(path) = file.meta_path {
            self.config.meta_path = path;
        }
        if let Some(n) = file.save_every {
            self.config.save_every = n;
        }
        if let Some(compress) = file.compress {
            self.config.compress = compress;
        }
        if let Some(congress) = file.congress {
            self = self.congress_str(&congress)?;
        }
        Ok(self)
    }

    /// Set the bill data directory
    pub fn data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.data_dir = dir.into();
        self
    }

    /// Set the metadata artifact path
    pub fn meta_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.meta_path = path.into();
        self
    }

    /// Set the checkpoint interval
    pub fn save_every(mut self, n: usize) -> Self {
        self.config.save_every = n;
        self
    }

    /// Enable or disable the gzip sibling
    pub fn compress(mut self, compress: bool) -> Self {
        self.config.compress = compress;
        self
    }

    pub fn resume(mut self, resume: bool) -> Self {
        self.config.resume = resume;
        self
    }

    /// Restrict the walk to one congress
    pub fn congress(mut self, congress: u32) -> Self {
        self.config.congress = Some(congress);
        self
    }

    /// Set the congress restriction from a string: a number, `current`, or `all`
    pub fn congress_str(mut self, congress: &str) -> Result<Self> {
        let trimmed = congress.trim();
        self.config.congress = match trimmed.to_lowercase().as_str() {
            "" | "all" => None,
            "current" => Some(self.config.current.congress),
            n => Some(n.parse().map_err(|_| {
                Error::Config(format!(
                    "Invalid congress '{}'. Allowed values are: a congress number, current, all",
                    trimmed
                ))
            })?),
        };
        Ok(self)
    }

    /// Build the final configuration
    pub fn build(self) -> Result<Config> {
        self.config.validate()?;
        Ok(self.config)
    }
}
