use thiserror::Error;

use crate::assembler::Column;
use crate::source::DatasetKind;

#[derive(Error, Debug)]
pub enum FpnaError {
    #[error("Invalid period range: {0}")]
    InvalidPeriod(String),

    #[error("No companies selected for the report")]
    EmptyCompanyScope,

    #[error("Unknown company: {0}")]
    UnknownCompany(String),

    #[error("Duplicate key '{key}' in {kind} dataset")]
    DuplicateKey { kind: DatasetKind, key: String },

    #[error("Record '{key}' does not carry a {kind} value")]
    RecordKindMismatch { kind: DatasetKind, key: String },

    #[error("Missing {kind} index for the {column} column")]
    MissingIndexKind { column: Column, kind: DatasetKind },

    #[error("A {kind} index cannot feed the {column} column")]
    IndexKindMismatch { column: Column, kind: DatasetKind },

    #[error("Fetching {kind} failed: {source}")]
    Fetch {
        kind: DatasetKind,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Template error: {0}")]
    Template(String),

    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, FpnaError>;
