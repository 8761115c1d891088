//! Collection: documents plus their secondary indexes
//!
//! Writes go to the document store first, then to the indexes. Reads ask
//! the indexes for candidates when the filter allows it and always
//! re-check every candidate against the full filter.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde_json::Value;

use super::plan::QueryPlan;
use crate::error::{DbError, DbResult};
use crate::index::{IndexManager, INDEX_DIR};
use crate::observability::{log_event_with_fields, Event};
use crate::query::{Query, QueryCompiler};
use crate::storage::{generate_id, DocumentStore, FileStore, StorageError};

/// Field holding a document's id
pub const ID_FIELD: &str = "_id";

/// A named set of documents with secondary indexes
#[derive(Debug)]
pub struct Collection<S: DocumentStore = FileStore> {
    name: String,
    store: S,
    indexes: IndexManager,
}

impl Collection<FileStore> {
    /// Opens the on-disk collection at `dir`, creating it if needed.
    ///
    /// Documents live directly in `dir`; indexes in `dir/indexes`.
    pub fn open(dir: impl Into<PathBuf>, degree: usize) -> DbResult<Self> {
        let dir = dir.into();
        let name = dir
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();
        let store = FileStore::open(&dir)?;
        Self::with_store(name, store, dir.join(INDEX_DIR), degree)
    }
}

impl<S: DocumentStore> Collection<S> {
    /// Builds a collection over an existing store, loading the indexes
    /// persisted in `index_dir`.
    pub fn with_store(
        name: impl Into<String>,
        store: S,
        index_dir: impl AsRef<Path>,
        degree: usize,
    ) -> DbResult<Self> {
        let name = name.into();
        let indexes = IndexManager::open(index_dir.as_ref(), degree)?;

        let fields = indexes.indexed_fields().join(",");
        log_event_with_fields(Event::CollectionOpen, &[("collection", &name), ("indexes", &fields)]);

        Ok(Self {
            name,
            store,
            indexes,
        })
    }

    /// Collection name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The index manager
    pub fn indexes(&self) -> &IndexManager {
        &self.indexes
    }

    /// Stores a new document and returns its generated id.
    ///
    /// The id is written into the document's `_id` field, replacing any
    /// value already there.
    pub fn insert(&mut self, document: Value) -> DbResult<String> {
        let mut document = match document {
            Value::Object(map) => map,
            _ => return Err(DbError::validation("document must be a JSON object")),
        };

        let id = generate_id();
        document.insert(ID_FIELD.to_string(), Value::String(id.clone()));
        let document = Value::Object(document);

        self.store.put(&id, &document)?;
        self.indexes.on_insert(&document, &id)?;

        log_event_with_fields(Event::DocumentInserted, &[("collection", &self.name), ("id", &id)]);
        Ok(id)
    }

    /// Reads one document
    pub fn get(&self, id: &str) -> DbResult<Option<Value>> {
        Ok(self.store.get(id)?)
    }

    /// Deletes a document and removes it from every index.
    ///
    /// A document whose content cannot be read is still deleted; the
    /// indexes are then purged of its id wholesale.
    pub fn delete(&mut self, id: &str) -> DbResult<()> {
        let document = match self.store.get(id) {
            Ok(Some(document)) => Some(document),
            Ok(None) => return Err(StorageError::NotFound(id.to_string()).into()),
            Err(StorageError::Corrupted { .. }) => None,
            Err(e) => return Err(e.into()),
        };

        self.store.delete(id)?;
        self.indexes.on_delete(id, document.as_ref())?;

        log_event_with_fields(Event::DocumentDeleted, &[("collection", &self.name), ("id", id)]);
        Ok(())
    }

    /// Creates an index on `field`; returns the number of pairs indexed.
    pub fn create_index(&mut self, field: &str) -> DbResult<usize> {
        Ok(self.indexes.create_index(field, &self.store)?)
    }

    /// Drops the index on `field`
    pub fn drop_index(&mut self, field: &str) -> DbResult<()> {
        Ok(self.indexes.drop_index(field)?)
    }

    /// Indexed fields, sorted
    pub fn list_indexes(&self) -> Vec<String> {
        self.indexes.indexed_fields()
    }

    /// Document ids, sorted
    pub fn ids(&self) -> DbResult<Vec<String>> {
        Ok(self.store.ids()?)
    }

    /// Every document, in id order
    pub fn all(&self) -> DbResult<Vec<Value>> {
        Ok(self
            .store
            .iterate_all()?
            .into_iter()
            .map(|(_, document)| document)
            .collect())
    }

    /// Compiles `filter` and returns the matching documents in id order.
    pub fn find(&self, filter: &Value) -> DbResult<Vec<Value>> {
        let query = self.compile(filter)?;
        self.find_query(&query)
    }

    /// Returns the documents matching an already compiled query, in id
    /// order.
    pub fn find_query(&self, query: &Query) -> DbResult<Vec<Value>> {
        let plan = QueryPlan::build(query, &self.indexes);

        let (candidates, documents) = match self.candidate_ids(&plan)? {
            Some(ids) => {
                let mut documents = Vec::with_capacity(ids.len());
                for id in &ids {
                    // An index entry may outlive a document removed behind
                    // the collection's back
                    if let Some(document) = self.store.get(id)? {
                        documents.push(document);
                    }
                }
                (ids.len(), documents)
            }
            None => {
                let documents: Vec<Value> = self
                    .store
                    .iterate_all()?
                    .into_iter()
                    .map(|(_, document)| document)
                    .collect();
                (documents.len(), documents)
            }
        };

        let matched: Vec<Value> = documents.into_iter().filter(|d| query.matches(d)).collect();

        let candidates = candidates.to_string();
        let returned = matched.len().to_string();
        log_event_with_fields(
            Event::QueryExecuted,
            &[
                ("candidates", &candidates),
                ("collection", &self.name),
                ("returned", &returned),
                ("scan_type", plan.scan_type.as_str()),
            ],
        );
        Ok(matched)
    }

    /// The plan `find` would use for `filter`
    pub fn explain(&self, filter: &Value) -> DbResult<QueryPlan> {
        let query = self.compile(filter)?;
        Ok(QueryPlan::build(&query, &self.indexes))
    }

    /// Releases the collection and its index manager
    pub fn close(self) {
        self.indexes.close();
    }

    fn compile(&self, filter: &Value) -> DbResult<Query> {
        QueryCompiler::compile(filter).map_err(|e| {
            log_event_with_fields(
                Event::QueryRejected,
                &[("collection", &self.name), ("code", e.code().code())],
            );
            DbError::from(e)
        })
    }

    /// Intersection of every probe's candidates, sorted; `None` for a scan.
    fn candidate_ids(&self, plan: &QueryPlan) -> DbResult<Option<BTreeSet<String>>> {
        let mut result: Option<BTreeSet<String>> = None;
        for probe in &plan.probes {
            let ids: BTreeSet<String> = self
                .indexes
                .indexed_lookup(&probe.field, probe.op, &probe.operand)?
                .into_iter()
                .collect();
            result = Some(match result {
                None => ids,
                Some(acc) => acc.intersection(&ids).cloned().collect(),
            });
            if result.as_ref().map_or(false, BTreeSet::is_empty) {
                break;
            }
        }
        Ok(result)
    }
}
