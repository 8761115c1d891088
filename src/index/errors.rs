//! Index error types
//!
//! Error codes:
//! - SHELF_INDEX_NOT_FOUND (REJECT)
//! - SHELF_INDEX_INVALID_FIELD (REJECT)
//! - SHELF_INDEX_INVALID_DEGREE (REJECT)
//! - SHELF_INDEX_BUILD_FAILED (ERROR)
//! - SHELF_INDEX_IO_ERROR (ERROR)
//! - SHELF_INDEX_CORRUPTED (FATAL)

use std::fmt;
use std::io;
use std::path::Path;

/// Severity levels for index errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Caller asked for something that does not exist or is malformed
    Reject,
    /// Operation failed; state on disk is unchanged
    Error,
    /// Persisted index cannot be trusted
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Reject => write!(f, "REJECT"),
            Severity::Error => write!(f, "ERROR"),
            Severity::Fatal => write!(f, "FATAL"),
        }
    }
}

/// Index-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexErrorCode {
    /// No index on the requested field
    ShelfIndexNotFound,
    /// Field path cannot name an index
    ShelfIndexInvalidField,
    /// Tree degree outside the supported range
    ShelfIndexInvalidDegree,
    /// Backfill could not read the collection
    ShelfIndexBuildFailed,
    /// Reading or writing an index blob failed
    ShelfIndexIoError,
    /// Index blob failed verification
    ShelfIndexCorrupted,
}

impl IndexErrorCode {
    /// Returns the stable string code
    pub fn code(&self) -> &'static str {
        match self {
            IndexErrorCode::ShelfIndexNotFound => "SHELF_INDEX_NOT_FOUND",
            IndexErrorCode::ShelfIndexInvalidField => "SHELF_INDEX_INVALID_FIELD",
            IndexErrorCode::ShelfIndexInvalidDegree => "SHELF_INDEX_INVALID_DEGREE",
            IndexErrorCode::ShelfIndexBuildFailed => "SHELF_INDEX_BUILD_FAILED",
            IndexErrorCode::ShelfIndexIoError => "SHELF_INDEX_IO_ERROR",
            IndexErrorCode::ShelfIndexCorrupted => "SHELF_INDEX_CORRUPTED",
        }
    }

    /// Returns the severity level for this error
    pub fn severity(&self) -> Severity {
        match self {
            IndexErrorCode::ShelfIndexNotFound
            | IndexErrorCode::ShelfIndexInvalidField
            | IndexErrorCode::ShelfIndexInvalidDegree => Severity::Reject,
            IndexErrorCode::ShelfIndexBuildFailed | IndexErrorCode::ShelfIndexIoError => {
                Severity::Error
            }
            IndexErrorCode::ShelfIndexCorrupted => Severity::Fatal,
        }
    }
}

impl fmt::Display for IndexErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Index error type with full context
#[derive(Debug)]
pub struct IndexError {
    code: IndexErrorCode,
    message: String,
    field: Option<String>,
    source: Option<io::Error>,
}

impl IndexError {
    /// Create an index not found error
    pub fn not_found(field: impl Into<String>) -> Self {
        let field = field.into();
        Self {
            code: IndexErrorCode::ShelfIndexNotFound,
            message: format!("No index on field '{}'", field),
            field: Some(field),
            source: None,
        }
    }

    /// Create an invalid field error
    pub fn invalid_field(field: impl Into<String>, reason: impl Into<String>) -> Self {
        let field = field.into();
        Self {
            code: IndexErrorCode::ShelfIndexInvalidField,
            message: format!("Cannot index '{}': {}", field, reason.into()),
            field: Some(field),
            source: None,
        }
    }

    /// Create an invalid degree error
    pub fn invalid_degree(degree: usize, min: usize, max: usize) -> Self {
        Self {
            code: IndexErrorCode::ShelfIndexInvalidDegree,
            message: format!("Degree {} is outside {}..={}", degree, min, max),
            field: None,
            source: None,
        }
    }

    /// Create an index build failed error
    pub fn build_failed(field: impl Into<String>, reason: impl Into<String>) -> Self {
        let field = field.into();
        Self {
            code: IndexErrorCode::ShelfIndexBuildFailed,
            message: format!("Building index on '{}' failed: {}", field, reason.into()),
            field: Some(field),
            source: None,
        }
    }

    /// Create an I/O error for an index file
    pub fn io(path: &Path, source: io::Error) -> Self {
        Self {
            code: IndexErrorCode::ShelfIndexIoError,
            message: format!("I/O error on {}: {}", path.display(), source),
            field: None,
            source: Some(source),
        }
    }

    /// Create a corrupted blob error
    pub fn corrupted(path: &Path, reason: impl Into<String>) -> Self {
        Self {
            code: IndexErrorCode::ShelfIndexCorrupted,
            message: format!("Index file {} is corrupted: {}", path.display(), reason.into()),
            field: None,
            source: None,
        }
    }

    /// Returns the error code
    pub fn code(&self) -> IndexErrorCode {
        self.code
    }

    /// Returns the severity level
    pub fn severity(&self) -> Severity {
        self.code.severity()
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the field this error concerns, if known
    pub fn field(&self) -> Option<&str> {
        self.field.as_deref()
    }

    /// Returns true for a missing index
    pub fn is_not_found(&self) -> bool {
        self.code == IndexErrorCode::ShelfIndexNotFound
    }

    /// Returns whether this is a fatal error
    pub fn is_fatal(&self) -> bool {
        self.code.severity() == Severity::Fatal
    }
}

impl fmt::Display for IndexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.code.severity(), self.code.code(), self.message)
    }
}

impl std::error::Error for IndexError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|e| e as &(dyn std::error::Error + 'static))
    }
}

/// Result type for index operations
pub type IndexResult<T> = Result<T, IndexError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(IndexErrorCode::ShelfIndexNotFound.code(), "SHELF_INDEX_NOT_FOUND");
        assert_eq!(IndexErrorCode::ShelfIndexCorrupted.code(), "SHELF_INDEX_CORRUPTED");
    }

    #[test]
    fn test_severities() {
        assert_eq!(IndexErrorCode::ShelfIndexNotFound.severity(), Severity::Reject);
        assert_eq!(IndexErrorCode::ShelfIndexIoError.severity(), Severity::Error);
        assert!(IndexError::corrupted(Path::new("age.idx"), "bad checksum").is_fatal());
    }

    #[test]
    fn test_error_display() {
        let err = IndexError::corrupted(Path::new("indexes/age.idx"), "checksum mismatch");
        let display = format!("{}", err);
        assert!(display.contains("SHELF_INDEX_CORRUPTED"));
        assert!(display.contains("FATAL"));
        assert!(display.contains("age.idx"));
    }
}
