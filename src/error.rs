//! Crate-level error type
//!
//! Subsystem errors keep their own codes; `DbError` wraps them so callers
//! that span several subsystems (collections, the catalog, the CLI) deal in
//! one type.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::index::{IndexError, IndexErrorCode};
use crate::query::QueryError;
use crate::storage::StorageError;

/// Result type for database operations
pub type DbResult<T> = Result<T, DbError>;

/// Database errors
#[derive(Debug, Error)]
pub enum DbError {
    #[error(transparent)]
    Query(#[from] QueryError),

    #[error(transparent)]
    Index(#[from] IndexError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid name: {0}")]
    InvalidName(String),

    #[error("Database not found: {0}")]
    DatabaseNotFound(String),

    #[error("Database already exists: {0}")]
    DatabaseExists(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl DbError {
    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create an I/O error for `path`
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Stable error code
    pub fn code(&self) -> &'static str {
        match self {
            Self::Query(e) => e.code().code(),
            Self::Index(e) => e.code().code(),
            Self::Storage(e) => e.code(),
            Self::Validation(_) => "SHELF_VALIDATION_ERROR",
            Self::InvalidName(_) => "SHELF_INVALID_NAME",
            Self::DatabaseNotFound(_) => "SHELF_DATABASE_NOT_FOUND",
            Self::DatabaseExists(_) => "SHELF_DATABASE_EXISTS",
            Self::Config(_) => "SHELF_CONFIG_INVALID",
            Self::Io { .. } => "SHELF_IO_ERROR",
        }
    }

    /// Whether a document, index or database was missing
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Index(e) => e.is_not_found(),
            Self::Storage(e) => e.is_not_found(),
            Self::DatabaseNotFound(_) => true,
            _ => false,
        }
    }

    /// Whether the caller's input was malformed
    pub fn is_validation(&self) -> bool {
        match self {
            Self::Query(_) | Self::Validation(_) | Self::InvalidName(_) => true,
            Self::Index(e) => matches!(
                e.code(),
                IndexErrorCode::ShelfIndexInvalidField | IndexErrorCode::ShelfIndexInvalidDegree
            ),
            Self::Storage(StorageError::InvalidId(_)) => true,
            _ => false,
        }
    }
}
