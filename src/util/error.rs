//! Unified error types for GmesLog.
//!
//! Parsing itself never fails: every extraction step has a fallback. The
//! errors here belong to the surrounding I/O: reading files, worker
//! threads and writing output.

use std::path::PathBuf;

/// Unified error type used by the file and output layers.
#[derive(Debug, thiserror::Error)]
pub enum GmesLogError {
    /// A log file could not be read.
    #[error("Failed to read {}: {source}", path.display())]
    ReadFile {
        /// Path of the file that failed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The log kind could not be determined from a name or argument.
    #[error("Unknown log kind: {0}")]
    UnknownLogKind(String),

    /// Writing JSON or CSV output failed.
    #[error("Export failed: {0}")]
    Export(String),

    /// A worker thread could not be spawned or panicked.
    #[error("Reader thread failed: {0}")]
    Thread(String),

    /// Catch-all for I/O errors (stdout writes, etc.).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, GmesLogError>;

/// Wrap an I/O error with the path of the file being read.
pub fn read_err(path: impl Into<PathBuf>, source: std::io::Error) -> GmesLogError {
    GmesLogError::ReadFile {
        path: path.into(),
        source,
    }
}
