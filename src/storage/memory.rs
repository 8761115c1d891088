//! In-memory document store

use std::collections::BTreeMap;

use serde_json::Value;

use super::errors::{StorageError, StorageResult};
use super::store::DocumentStore;

/// Document store backed by a `BTreeMap`, for tests and scratch collections.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    documents: BTreeMap<String, Value>,
}

impl MemoryStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored documents
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Returns true if no documents are stored
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

impl DocumentStore for MemoryStore {
    fn put(&mut self, id: &str, document: &Value) -> StorageResult<()> {
        self.documents.insert(id.to_string(), document.clone());
        Ok(())
    }

    fn get(&self, id: &str) -> StorageResult<Option<Value>> {
        Ok(self.documents.get(id).cloned())
    }

    fn delete(&mut self, id: &str) -> StorageResult<()> {
        self.documents
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| StorageError::NotFound(id.to_string()))
    }

    fn iterate_all(&self) -> StorageResult<Vec<(String, Value)>> {
        Ok(self
            .documents
            .iter()
            .map(|(id, doc)| (id.clone(), doc.clone()))
            .collect())
    }

    fn ids(&self) -> StorageResult<Vec<String>> {
        Ok(self.documents.keys().cloned().collect())
    }
}
