//! Errors raised while building the date window or writing the report.

use std::path::PathBuf;

use thiserror::Error;

/// Errors from core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The requested date window cannot be built.
    #[error("invalid date window: {0}")]
    InvalidWindow(String),

    /// The configured time zone is not a known IANA identifier.
    #[error("unknown time zone '{0}'")]
    UnknownTimeZone(String),

    /// The report could not be serialized.
    #[error("failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The report could not be written to disk.
    #[error("failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A specialized Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;
