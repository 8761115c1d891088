//! Index Manager for shelfdb
//!
//! Owns the secondary indexes of one collection, one B-tree per field, and
//! keeps them in step with document writes. Every mutation is persisted
//! before the call returns.
//!
//! # API
//!
//! - `open(dir, degree)` - Load every persisted index in `dir`
//! - `create_index(field, store)` - Backfill a new index from the store
//! - `on_insert(doc, id)` / `on_delete(id, doc)` - Keep indexes current
//! - `indexed_lookup(field, op, operand)` - Candidate ids for one condition

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde_json::Value;

use super::blob;
use super::btree::CompareOp;
use super::errors::{IndexError, IndexResult};
use super::key::IndexKey;
use super::IndexTree;
use crate::observability::{log_event_with_fields, Event};
use crate::query::FieldPath;
use crate::storage::DocumentStore;

/// Name of the index directory inside a collection
pub const INDEX_DIR: &str = "indexes";

/// Default minimum degree for new trees
pub const DEFAULT_DEGREE: usize = 3;

/// A secondary index on one field
#[derive(Debug)]
pub struct Index {
    path: FieldPath,
    tree: IndexTree,
}

impl Index {
    /// Canonical field name
    pub fn field(&self) -> String {
        self.path.to_string()
    }

    /// The underlying tree
    pub fn tree(&self) -> &IndexTree {
        &self.tree
    }

    /// Distinct keys `document` contributes to this index
    fn keys_for(&self, document: &Value) -> Vec<IndexKey> {
        let mut keys: Vec<IndexKey> = self
            .path
            .resolve_all(document)
            .into_iter()
            .filter_map(IndexKey::from_json)
            .collect();
        keys.sort();
        keys.dedup();
        keys
    }
}

/// Index Manager for one collection
#[derive(Debug)]
pub struct IndexManager {
    dir: PathBuf,
    degree: usize,
    /// Canonical field name -> index
    indexes: BTreeMap<String, Index>,
}

impl IndexManager {
    /// Opens the index directory, creating it if missing, and loads every
    /// persisted index.
    ///
    /// A blob that fails verification aborts the open.
    pub fn open(dir: impl Into<PathBuf>, degree: usize) -> IndexResult<Self> {
        let dir = dir.into();
        if degree < IndexTree::MIN_DEGREE || degree > blob::MAX_DEGREE {
            return Err(IndexError::invalid_degree(
                degree,
                IndexTree::MIN_DEGREE,
                blob::MAX_DEGREE,
            ));
        }
        fs::create_dir_all(&dir).map_err(|e| IndexError::io(&dir, e))?;

        let mut indexes = BTreeMap::new();
        for blob_path in blob::list_blobs(&dir)? {
            let (field, tree) = blob::load(&blob_path)?;
            let path = FieldPath::parse(&field).map_err(|e| {
                IndexError::corrupted(&blob_path, format!("bad field in header: {}", e.message()))
            })?;
            let name = path.to_string();
            if indexes.contains_key(&name) {
                return Err(IndexError::corrupted(
                    &blob_path,
                    format!("second index for field '{}'", name),
                ));
            }

            let keys = tree.len().to_string();
            log_event_with_fields(Event::IndexLoaded, &[("field", &name), ("keys", &keys)]);
            indexes.insert(name, Index { path, tree });
        }

        Ok(Self {
            dir,
            degree,
            indexes,
        })
    }

    /// Index directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Degree used for new trees
    pub fn degree(&self) -> usize {
        self.degree
    }

    /// Creates an index on `field`, backfilled from `store`.
    ///
    /// Returns the number of (key, id) pairs inserted, or 0 if the index
    /// already exists.
    pub fn create_index<S: DocumentStore>(&mut self, field: &str, store: &S) -> IndexResult<usize> {
        let path = Self::parse_field(field)?;
        let name = path.to_string();
        if self.indexes.contains_key(&name) {
            return Ok(0);
        }

        let documents = store
            .iterate_all()
            .map_err(|e| IndexError::build_failed(&name, e.to_string()))?;

        let mut index = Index {
            path,
            tree: IndexTree::new(self.degree),
        };
        let mut pairs = 0;
        for (id, document) in &documents {
            for key in index.keys_for(document) {
                index.tree.insert(key, id.clone());
                pairs += 1;
            }
        }

        blob::persist(&self.dir, &name, &index.tree)?;

        let pairs_str = pairs.to_string();
        let docs_str = documents.len().to_string();
        log_event_with_fields(
            Event::IndexCreated,
            &[("field", &name), ("documents", &docs_str), ("pairs", &pairs_str)],
        );

        self.indexes.insert(name, index);
        Ok(pairs)
    }

    /// Removes the index on `field` and its blob.
    pub fn drop_index(&mut self, field: &str) -> IndexResult<()> {
        let name = Self::parse_field(field)?.to_string();
        if self.indexes.remove(&name).is_none() {
            return Err(IndexError::not_found(name));
        }

        let blob_path = self.dir.join(blob::file_name_for(&name));
        match fs::remove_file(&blob_path) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(IndexError::io(&blob_path, e)),
        }

        log_event_with_fields(Event::IndexDropped, &[("field", &name)]);
        Ok(())
    }

    /// Adds `document` (stored under `id`) to every index.
    pub fn on_insert(&mut self, document: &Value, id: &str) -> IndexResult<()> {
        for (name, index) in self.indexes.iter_mut() {
            let keys = index.keys_for(document);
            if keys.is_empty() {
                continue;
            }
            for key in keys {
                index.tree.insert(key, id.to_string());
            }
            Self::persist(&self.dir, name, &index.tree)?;
        }
        Ok(())
    }

    /// Removes `id` from every index.
    ///
    /// With the document's content, only the keys it contributed are
    /// touched. Without it, every ValueList is purged of `id`.
    pub fn on_delete(&mut self, id: &str, document: Option<&Value>) -> IndexResult<()> {
        let id = id.to_string();
        for (name, index) in self.indexes.iter_mut() {
            let changed = match document {
                Some(document) => {
                    let mut changed = false;
                    for key in index.keys_for(document) {
                        changed |= index.tree.delete(&key, &id);
                    }
                    changed
                }
                None => index.tree.remove_value_everywhere(&id) > 0,
            };
            if changed {
                Self::persist(&self.dir, name, &index.tree)?;
            }
        }
        Ok(())
    }

    /// Candidate ids for `field <op> operand`.
    ///
    /// The result reflects this one condition only and must be re-checked
    /// against the full filter. An operand that cannot be a key (null,
    /// array, object) yields no candidates.
    pub fn indexed_lookup(
        &self,
        field: &str,
        op: CompareOp,
        operand: &Value,
    ) -> IndexResult<Vec<String>> {
        let name = Self::parse_field(field)?.to_string();
        let index = self
            .indexes
            .get(&name)
            .ok_or_else(|| IndexError::not_found(&name))?;

        let Some(key) = IndexKey::from_json(operand) else {
            return Ok(Vec::new());
        };

        Ok(match op {
            CompareOp::Eq => index.tree.search(&key).to_vec(),
            _ => index.tree.search_range(op, &key),
        })
    }

    /// Returns true if `field` is indexed
    pub fn has_index(&self, field: &str) -> bool {
        FieldPath::parse(field)
            .map(|p| self.indexes.contains_key(&p.to_string()))
            .unwrap_or(false)
    }

    /// Canonical names of every indexed field, sorted
    pub fn indexed_fields(&self) -> Vec<String> {
        self.indexes.keys().cloned().collect()
    }

    /// The index on `field`, if any
    pub fn get(&self, field: &str) -> Option<&Index> {
        let name = FieldPath::parse(field).ok()?.to_string();
        self.indexes.get(&name)
    }

    /// Releases the manager. Every mutation is already on disk.
    pub fn close(self) {}

    fn parse_field(field: &str) -> IndexResult<FieldPath> {
        FieldPath::parse(field).map_err(|e| IndexError::invalid_field(field, e.message()))
    }

    fn persist(dir: &Path, name: &str, tree: &IndexTree) -> IndexResult<()> {
        blob::persist(dir, name, tree)?;
        let keys = tree.len().to_string();
        log_event_with_fields(Event::IndexPersisted, &[("field", name), ("keys", &keys)]);
        Ok(())
    }
}
