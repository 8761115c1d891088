//! shelfdb - an embedded JSON document store with B-tree secondary indexes
//!
//! Documents are stored one JSON file each. Any field path can be indexed
//! by a persistent multi-valued B-tree; filters written in a small JSON
//! query language are answered from an index when possible and always
//! re-checked against the full filter.
//!
//! ```ignore
//! use serde_json::json;
//! use shelfdb::database::Database;
//!
//! let db = Database::create(root, "shop")?;
//! let mut users = db.collection("users", 3)?;
//! users.insert(json!({"name": "Ann", "age": 30}))?;
//! users.create_index("age")?;
//! let adults = users.find(&json!({"age": {"@gte": 18}}))?;
//! ```

pub mod cli;
pub mod collection;
pub mod config;
pub mod database;
pub mod error;
pub mod index;
pub mod observability;
pub mod query;
pub mod storage;

pub use collection::Collection;
pub use database::Database;
pub use error::{DbError, DbResult};
