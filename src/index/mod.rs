//! Index subsystem for shelfdb
//!
//! Secondary indexes are persistent multi-valued B-trees, one per indexed
//! field, mapping field values to the ids of the documents holding them.
//!
//! # Design Principles
//!
//! - Derived state: indexes mirror the document store, never the reverse
//! - Persisted after every mutation, verified on load
//! - Candidate sets only: callers re-check every hit against the filter
//!
//! # Invariants
//!
//! - Updates occur AFTER document writes
//! - Lookups return ids in key order, insertion order within a key

mod blob;
mod btree;
mod errors;
mod key;
mod manager;

pub use blob::{file_name_for, FORMAT_VERSION, INDEX_EXTENSION, MAX_DEGREE};
pub use btree::{BTree, CompareOp, TreeKey};
pub use errors::{IndexError, IndexErrorCode, IndexResult, Severity};
pub use key::{IndexKey, KeyKind};
pub use manager::{Index, IndexManager, DEFAULT_DEGREE, INDEX_DIR};

/// Tree type backing a field index: field value -> document ids
pub type IndexTree = BTree<IndexKey, String>;
