//! Document storage subsystem for shelfdb
//!
//! Every document is one JSON blob addressed by an opaque id. The store
//! knows nothing about fields or indexes; collections layer those on top.
//!
//! # Design Principles
//!
//! - One blob per document, replaced atomically
//! - Ids are validated before they touch the filesystem
//! - Scans are sorted by id (deterministic)

mod atomic;
mod errors;
mod file;
mod memory;
mod store;

pub use atomic::{temp_path_for, write_atomic};
pub use errors::{StorageError, StorageResult};
pub use file::{FileStore, DOCUMENT_EXTENSION};
pub use memory::MemoryStore;
pub use store::{generate_id, validate_id, DocumentStore};
