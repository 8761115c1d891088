//! Query error types
//!
//! Error codes:
//! - SHELF_QUERY_INVALID (REJECT)
//! - SHELF_QUERY_UNKNOWN_OPERATOR (REJECT)
//! - SHELF_QUERY_INVALID_OPERAND (REJECT)
//! - SHELF_QUERY_INVALID_PATH (REJECT)
//!
//! Every query error is a validation failure of the filter itself. Soft
//! failures at match time (bad regex, incomparable types, unparsable dates)
//! never surface here; they make the condition false.

use std::fmt;

/// Severity levels for query errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Client request rejected
    Reject,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Reject => write!(f, "REJECT"),
        }
    }
}

/// Query-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryErrorCode {
    /// Malformed filter structure
    ShelfQueryInvalid,
    /// `@token` that names no operator or combinator
    ShelfQueryUnknownOperator,
    /// Operator given an operand of the wrong shape
    ShelfQueryInvalidOperand,
    /// Field path that cannot be parsed
    ShelfQueryInvalidPath,
}

impl QueryErrorCode {
    /// Returns the stable string code
    pub fn code(&self) -> &'static str {
        match self {
            QueryErrorCode::ShelfQueryInvalid => "SHELF_QUERY_INVALID",
            QueryErrorCode::ShelfQueryUnknownOperator => "SHELF_QUERY_UNKNOWN_OPERATOR",
            QueryErrorCode::ShelfQueryInvalidOperand => "SHELF_QUERY_INVALID_OPERAND",
            QueryErrorCode::ShelfQueryInvalidPath => "SHELF_QUERY_INVALID_PATH",
        }
    }

    /// Returns the severity level for this error
    pub fn severity(&self) -> Severity {
        Severity::Reject
    }
}

impl fmt::Display for QueryErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Query error type with full context
#[derive(Debug, Clone)]
pub struct QueryError {
    code: QueryErrorCode,
    message: String,
    field: Option<String>,
}

impl QueryError {
    /// Create a malformed filter error
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self {
            code: QueryErrorCode::ShelfQueryInvalid,
            message: reason.into(),
            field: None,
        }
    }

    /// Create an unknown operator error
    pub fn unknown_operator(token: &str) -> Self {
        Self {
            code: QueryErrorCode::ShelfQueryUnknownOperator,
            message: format!("Unknown operator '{}'", token),
            field: None,
        }
    }

    /// Create an invalid operand error
    pub fn invalid_operand(field: &str, token: &str, expected: &str) -> Self {
        Self {
            code: QueryErrorCode::ShelfQueryInvalidOperand,
            message: format!("Operator '{}' on '{}' expects {}", token, field, expected),
            field: Some(field.to_string()),
        }
    }

    /// Create an invalid path error
    pub fn invalid_path(path: &str, reason: impl Into<String>) -> Self {
        Self {
            code: QueryErrorCode::ShelfQueryInvalidPath,
            message: format!("Invalid field path '{}': {}", path, reason.into()),
            field: Some(path.to_string()),
        }
    }

    /// Returns the error code
    pub fn code(&self) -> QueryErrorCode {
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

    /// Returns the field this error concerns, if any
    pub fn field(&self) -> Option<&str> {
        self.field.as_deref()
    }
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.code.severity(), self.code.code(), self.message)
    }
}

impl std::error::Error for QueryError {}

/// Result type for query operations
pub type QueryResult<T> = Result<T, QueryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(QueryErrorCode::ShelfQueryInvalid.code(), "SHELF_QUERY_INVALID");
        assert_eq!(
            QueryErrorCode::ShelfQueryUnknownOperator.code(),
            "SHELF_QUERY_UNKNOWN_OPERATOR"
        );
    }

    #[test]
    fn test_error_display() {
        let err = QueryError::invalid_operand("name", "@regex", "a string pattern");
        let display = format!("{}", err);
        assert!(display.contains("REJECT"));
        assert!(display.contains("SHELF_QUERY_INVALID_OPERAND"));
        assert_eq!(err.field(), Some("name"));
    }
}
