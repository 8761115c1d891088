//! Database catalog
//!
//! A storage root holds one directory per database; a database holds one
//! directory per collection.
//!
//! ```text
//! <root>/<database>/<collection>/<id>.json
//! <root>/<database>/<collection>/indexes/<field>.idx
//! ```

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::collection::Collection;
use crate::error::{DbError, DbResult};
use crate::observability::{log_event_with_fields, Event};
use crate::storage::FileStore;

/// A database directory under a storage root
#[derive(Debug, Clone)]
pub struct Database {
    name: String,
    path: PathBuf,
}

impl Database {
    /// Creates a new database. Fails if it already exists.
    pub fn create(root: &Path, name: &str) -> DbResult<Self> {
        validate_name(name)?;
        let path = root.join(name);
        if path.exists() {
            return Err(DbError::DatabaseExists(name.to_string()));
        }
        fs::create_dir_all(&path).map_err(|e| DbError::io(&path, e))?;

        log_event_with_fields(Event::DatabaseCreated, &[("database", name)]);
        Ok(Self {
            name: name.to_string(),
            path,
        })
    }

    /// Opens an existing database
    pub fn open(root: &Path, name: &str) -> DbResult<Self> {
        validate_name(name)?;
        let path = root.join(name);
        if !path.is_dir() {
            return Err(DbError::DatabaseNotFound(name.to_string()));
        }
        Ok(Self {
            name: name.to_string(),
            path,
        })
    }

    /// Names of every database under `root`, sorted. A missing root holds
    /// no databases.
    pub fn list(root: &Path) -> DbResult<Vec<String>> {
        list_dirs(root)
    }

    /// Deletes a database and everything in it.
    pub fn destroy(root: &Path, name: &str) -> DbResult<()> {
        let db = Self::open(root, name)?;
        fs::remove_dir_all(&db.path).map_err(|e| DbError::io(&db.path, e))?;

        log_event_with_fields(Event::DatabaseDropped, &[("database", name)]);
        Ok(())
    }

    /// Database name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Database directory
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Opens a collection, creating it if needed.
    pub fn collection(&self, name: &str, degree: usize) -> DbResult<Collection<FileStore>> {
        validate_name(name)?;
        Collection::open(self.path.join(name), degree)
    }

    /// Names of every collection, sorted
    pub fn list_collections(&self) -> DbResult<Vec<String>> {
        list_dirs(&self.path)
    }
}

/// Database and collection names: ASCII alphanumerics, `-` and `_`.
pub fn validate_name(name: &str) -> DbResult<()> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(DbError::InvalidName(name.to_string()))
    }
}

fn list_dirs(dir: &Path) -> DbResult<Vec<String>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(DbError::io(dir, e)),
    };

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| DbError::io(dir, e))?;
        if !entry.path().is_dir() {
            continue;
        }
        if let Some(name) = entry.file_name().to_str() {
            if validate_name(name).is_ok() {
                names.push(name.to_string());
            }
        }
    }
    names.sort();
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_create_list_destroy() {
        let root = TempDir::new().unwrap();
        assert!(Database::list(root.path()).unwrap().is_empty());

        Database::create(root.path(), "shop").unwrap();
        Database::create(root.path(), "blog").unwrap();
        assert_eq!(Database::list(root.path()).unwrap(), vec!["blog", "shop"]);

        Database::destroy(root.path(), "shop").unwrap();
        assert_eq!(Database::list(root.path()).unwrap(), vec!["blog"]);
    }

    #[test]
    fn test_duplicate_and_missing() {
        let root = TempDir::new().unwrap();
        Database::create(root.path(), "shop").unwrap();

        let err = Database::create(root.path(), "shop").unwrap_err();
        assert_eq!(err.code(), "SHELF_DATABASE_EXISTS");

        let err = Database::open(root.path(), "nope").unwrap_err();
        assert!(err.is_not_found());
        assert!(Database::destroy(root.path(), "nope").unwrap_err().is_not_found());
    }

    #[test]
    fn test_names_validated() {
        let root = TempDir::new().unwrap();
        assert!(Database::create(root.path(), "../escape").unwrap_err().is_validation());
        assert!(Database::create(root.path(), "").is_err());
    }

    #[test]
    fn test_missing_root_lists_nothing() {
        let root = TempDir::new().unwrap();
        assert!(Database::list(&root.path().join("absent")).unwrap().is_empty());
    }

    #[test]
    fn test_collections() {
        let root = TempDir::new().unwrap();
        let db = Database::create(root.path(), "shop").unwrap();

        let mut orders = db.collection("orders", 3).unwrap();
        orders.insert(json!({"total": 10})).unwrap();
        db.collection("users", 3).unwrap();

        assert_eq!(db.list_collections().unwrap(), vec!["orders", "users"]);
        assert_eq!(orders.name(), "orders");
    }
}
