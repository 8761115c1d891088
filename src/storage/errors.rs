//! # Document Storage Errors

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Document storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Document not found: {0}")]
    NotFound(String),

    #[error("Invalid document id: {0:?}")]
    InvalidId(String),

    #[error("Document {id} is corrupted: {reason}")]
    Corrupted { id: String, reason: String },

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl StorageError {
    /// Wraps an I/O error with the path it occurred on
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        StorageError::Io {
            path: path.into(),
            source,
        }
    }

    /// Stable error code
    pub fn code(&self) -> &'static str {
        match self {
            StorageError::NotFound(_) => "SHELF_DOCUMENT_NOT_FOUND",
            StorageError::InvalidId(_) => "SHELF_DOCUMENT_INVALID_ID",
            StorageError::Corrupted { .. } => "SHELF_DOCUMENT_CORRUPTED",
            StorageError::Io { .. } => "SHELF_STORAGE_IO_ERROR",
        }
    }

    /// Returns true if this error reports a missing document
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound(_))
    }
}
