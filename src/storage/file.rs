//! # One-file-per-document store
//!
//! Layout: `<dir>/<id>.json`, pretty-printed JSON, replaced atomically.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde_json::Value;

use super::atomic::write_atomic;
use super::errors::{StorageError, StorageResult};
use super::store::{validate_id, DocumentStore};

/// File extension of document blobs
pub const DOCUMENT_EXTENSION: &str = "json";

/// Filesystem-backed document store
#[derive(Debug)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Opens the store rooted at `dir`, creating the directory if missing.
    pub fn open(dir: impl Into<PathBuf>) -> StorageResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| StorageError::io(&dir, e))?;
        Ok(Self { dir })
    }

    /// Directory holding the documents
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, id: &str) -> StorageResult<PathBuf> {
        validate_id(id)?;
        Ok(self.dir.join(format!("{}.{}", id, DOCUMENT_EXTENSION)))
    }
}

impl DocumentStore for FileStore {
    fn put(&mut self, id: &str, document: &Value) -> StorageResult<()> {
        let path = self.path_for(id)?;
        let bytes = serde_json::to_vec_pretty(document).map_err(|e| StorageError::Corrupted {
            id: id.to_string(),
            reason: e.to_string(),
        })?;
        write_atomic(&path, &bytes).map_err(|e| StorageError::io(&path, e))
    }

    fn get(&self, id: &str) -> StorageResult<Option<Value>> {
        let path = self.path_for(id)?;
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StorageError::io(&path, e)),
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| StorageError::Corrupted {
                id: id.to_string(),
                reason: e.to_string(),
            })
    }

    fn delete(&mut self, id: &str) -> StorageResult<()> {
        let path = self.path_for(id)?;
        fs::remove_file(&path).map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                StorageError::NotFound(id.to_string())
            } else {
                StorageError::io(&path, e)
            }
        })
    }

    fn iterate_all(&self) -> StorageResult<Vec<(String, Value)>> {
        let mut documents = Vec::new();
        for id in self.ids()? {
            // A concurrent delete between listing and reading is skipped
            if let Some(document) = self.get(&id)? {
                documents.push((id, document));
            }
        }
        Ok(documents)
    }

    fn ids(&self) -> StorageResult<Vec<String>> {
        let entries = fs::read_dir(&self.dir).map_err(|e| StorageError::io(&self.dir, e))?;

        let mut ids = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| StorageError::io(&self.dir, e))?;
            let path = entry.path();
            if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some(DOCUMENT_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                if validate_id(stem).is_ok() {
                    ids.push(stem.to_string());
                }
            }
        }
        ids.sort();
        Ok(ids)
    }
}
