// errors.rs
use crate::scraper::FetchError;
use thiserror::Error;

/// Errors raised anywhere between the raw listing source and the warehouse.
#[derive(Error, Debug)]
pub enum EtlError {
    /// A required column is missing from every record of a batch.
    #[error("Schema error: required column '{column}' is absent from every record")]
    Schema { column: String },

    /// A malformed nested field. Normalizers recover from this locally.
    #[error("Parse error in '{field}': {reason}")]
    Parse { field: String, reason: String },

    #[error("Floor parse error for listing {property_code}: {raw}")]
    FloorParse { property_code: String, raw: String },

    #[error("Type coercion error for listing {property_code}: column '{column}' expected {expected}, found {found}")]
    TypeCoercion {
        property_code: String,
        column: String,
        expected: &'static str,
        found: String,
    },

    #[error("Cluster model error: {0}")]
    ClusterModel(String),

    #[error("Domain error: {0}")]
    Domain(String),

    #[error("Artifact error: {0}")]
    Artifact(String),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Spreadsheet error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, EtlError>;
