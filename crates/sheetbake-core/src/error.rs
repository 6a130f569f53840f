//! Error types for sheetbake-core

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in sheetbake-core
///
/// Sheet-level problems (missing schema, missing converter) are recoverable:
/// the driver logs them, skips the sheet and keeps going. I/O and invariant
/// errors abort the whole run.
#[derive(Debug, Error)]
pub enum Error {
    /// Failed to read a file
    #[error("failed to read file '{path}': {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write a file
    #[error("failed to write file '{path}': {source}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// CSV error from the csv crate
    #[error("CSV error in '{path}': {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// Directory traversal error
    #[error("failed to traverse directory: {0}")]
    WalkDir(#[from] walkdir::Error),

    /// No schema binding declared for a sheet
    #[error("no schema binding for sheet '{0}'")]
    SchemaNotFound(String),

    /// A binding exists but no converter was registered for its record kind
    #[error("no converter registered for record kind '{record_kind}' bound to sheet '{sheet}'")]
    ConversionMissing { sheet: String, record_kind: String },

    /// A sheet name was requested that the source does not contain
    #[error("no sheet named '{0}' in source")]
    SheetNotFound(String),

    /// Internal bookkeeping invariant broken; indicates a bug, never self-healed
    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
