//! Error types shared across MBP crates

use thiserror::Error;

/// Result type alias for MBP operations
pub type Result<T> = std::result::Result<T, PortalError>;

/// Main error type for MBP
#[derive(Error, Debug)]
pub enum PortalError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch { expected: String, actual: String },

    #[error("Dataset not found: {0}")]
    DatasetNotFound(i64),

    #[error("Unreadable file: {0}")]
    UnreadableFile(String),

    #[error("Unsupported dataset type: {0}")]
    UnsupportedDatasetType(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Parse error: {0}")]
    Parse(String),
}
