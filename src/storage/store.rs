//! Document store contract

use serde_json::Value;
use uuid::Uuid;

use super::errors::{StorageError, StorageResult};

/// Persistence for individual documents keyed by id.
///
/// Implementations hold one blob per document. `iterate_all` returns a
/// snapshot sorted by id so scans are deterministic.
pub trait DocumentStore: std::fmt::Debug {
    /// Write (or overwrite) a document
    fn put(&mut self, id: &str, document: &Value) -> StorageResult<()>;

    /// Read a document, `None` if absent
    fn get(&self, id: &str) -> StorageResult<Option<Value>>;

    /// Delete a document, `NotFound` if absent
    fn delete(&mut self, id: &str) -> StorageResult<()>;

    /// All documents, sorted by id
    fn iterate_all(&self) -> StorageResult<Vec<(String, Value)>>;

    /// All document ids, sorted
    fn ids(&self) -> StorageResult<Vec<String>>;
}

/// Generates a fresh document id
pub fn generate_id() -> String {
    Uuid::new_v4().to_string()
}

/// Rejects ids that could escape the collection directory.
///
/// Ids are restricted to ASCII alphanumerics, `-` and `_`.
pub fn validate_id(id: &str) -> StorageResult<()> {
    let valid = !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidId(id.to_string()))
    }
}
