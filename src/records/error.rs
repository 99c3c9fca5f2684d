//! Error types for record persistence and archive extraction

use std::path::PathBuf;
use thiserror::Error;

/// Result type for record operations
pub type RecordResult<T> = Result<T, RecordError>;

/// Errors raised while reading or writing session records
#[derive(Error, Debug)]
pub enum RecordError {
    /// Filesystem failure
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding or decoding failure
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Zip archive could not be read
    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// Extraction produced no entries
    #[error("Archive extracted no entries: {path}")]
    EmptyArchive {
        /// Archive file
        path: PathBuf,
    },

    /// A write target that cannot be used
    #[error("Storage error: {message}")]
    Storage {
        /// What went wrong
        message: String,
    },
}

impl RecordError {
    /// Create a storage error
    pub fn storage<S: Into<String>>(message: S) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Create an empty archive error
    pub fn empty_archive<P: Into<PathBuf>>(path: P) -> Self {
        Self::EmptyArchive { path: path.into() }
    }
}
