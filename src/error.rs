use thiserror::Error;

/// Result alias used across the billdata crate
pub type Result<T> = std::result::Result<T, Error>;

/// Failures from aggregation, index storage and detail lookups
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Bad data path: {0}")]
    Path(String),

    #[error("Invalid bill_id '{0}': expected <type><number>-<congress>")]
    InvalidBillId(String),

    #[error("Bill metadata index not found: {0}")]
    MetadataNotFound(String),

    #[error("Bill not found: {0}")]
    BillNotFound(String),

    #[error("Repository error: {0}")]
    Repository(String),
}
