//! Field path parsing and resolution
//!
//! A path is a dotted sequence of segments (`address.city`). A numeric
//! segment indexes into an array (`tags.0`); the bracket form `tags[0]` is
//! sugar for the same thing. Resolution never fails: a segment that cannot
//! be applied yields no value.

use std::fmt;

use serde_json::Value;

use super::errors::{QueryError, QueryResult};

/// Paths with more segments than this resolve to nothing
pub const MAX_PATH_DEPTH: usize = 50;

/// Parsed field path
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldPath {
    segments: Vec<String>,
}

impl FieldPath {
    /// Parses a path expression.
    ///
    /// Empty segments and malformed brackets are rejected.
    pub fn parse(expr: &str) -> QueryResult<Self> {
        if expr.is_empty() {
            return Err(QueryError::invalid_path(expr, "path is empty"));
        }

        let mut segments = Vec::new();
        for part in expr.split('.') {
            let (name, mut rest) = match part.find('[') {
                Some(pos) => part.split_at(pos),
                None => (part, ""),
            };
            if name.is_empty() {
                return Err(QueryError::invalid_path(expr, "empty segment"));
            }
            if name.contains(']') {
                return Err(QueryError::invalid_path(expr, "unmatched ']'"));
            }
            segments.push(name.to_string());

            while !rest.is_empty() {
                let close = rest
                    .find(']')
                    .ok_or_else(|| QueryError::invalid_path(expr, "unclosed '['"))?;
                let index = &rest[1..close];
                if index.is_empty() || !index.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(QueryError::invalid_path(expr, "bracket index must be a number"));
                }
                segments.push(index.to_string());
                rest = &rest[close + 1..];
                if !rest.is_empty() && !rest.starts_with('[') {
                    return Err(QueryError::invalid_path(expr, "unexpected text after ']'"));
                }
            }
        }

        Ok(Self { segments })
    }

    /// Segments of the path
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Resolves the path against a document.
    pub fn resolve<'a>(&self, document: &'a Value) -> Option<&'a Value> {
        if self.segments.len() > MAX_PATH_DEPTH {
            return None;
        }

        let mut current = document;
        for segment in &self.segments {
            current = match current {
                Value::Object(map) => map.get(segment)?,
                Value::Array(items) => {
                    let index: usize = segment.parse().ok()?;
                    items.get(index)?
                }
                _ => return None,
            };
        }
        Some(current)
    }

    /// Resolves the path and flattens one level of array.
    ///
    /// This is the set of values an index stores for a document: a scalar
    /// contributes itself, an array contributes each element, null and
    /// absent contribute nothing.
    pub fn resolve_all<'a>(&self, document: &'a Value) -> Vec<&'a Value> {
        match self.resolve(document) {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items.iter().collect(),
            Some(value) => vec![value],
        }
    }
}

impl fmt::Display for FieldPath {
    /// Canonical dotted form, used to name indexes
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("."))
    }
}
