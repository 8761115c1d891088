//! Configuration for shelfdb
//!
//! Loaded from an optional JSON file. Missing keys take their defaults;
//! command-line flags override whatever the file says.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{DbError, DbResult};
use crate::index::{IndexTree, DEFAULT_DEGREE, MAX_DEGREE};
use crate::observability::{log_event_with_fields, Event, Logger, Severity};

/// Runtime configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Root directory holding the databases (default: "./databases")
    #[serde(default = "default_storage_path")]
    pub storage_path: PathBuf,

    /// Minimum degree of new index trees (default: 3)
    #[serde(default = "default_btree_degree")]
    pub btree_degree: usize,

    /// Minimum severity written to the log (default: "WARN")
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_storage_path() -> PathBuf {
    PathBuf::from("./databases")
}

fn default_btree_degree() -> usize {
    DEFAULT_DEGREE
}

fn default_log_level() -> String {
    "WARN".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage_path: default_storage_path(),
            btree_degree: default_btree_degree(),
            log_level: default_log_level(),
        }
    }
}

impl Config {
    /// Reads and validates a config file.
    pub fn load(path: &Path) -> DbResult<Self> {
        let text = fs::read_to_string(path).map_err(|e| DbError::io(path, e))?;
        let config: Config = serde_json::from_str(&text)
            .map_err(|e| DbError::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;

        let storage = config.storage_path.display().to_string();
        log_event_with_fields(
            Event::ConfigLoaded,
            &[("path", &path.display().to_string()), ("storage_path", &storage)],
        );
        Ok(config)
    }

    /// Checks value ranges.
    pub fn validate(&self) -> DbResult<()> {
        if self.btree_degree < IndexTree::MIN_DEGREE || self.btree_degree > MAX_DEGREE {
            return Err(DbError::Config(format!(
                "btree_degree must be between {} and {}, got {}",
                IndexTree::MIN_DEGREE,
                MAX_DEGREE,
                self.btree_degree
            )));
        }
        self.severity()?;
        Ok(())
    }

    /// The configured log level
    pub fn severity(&self) -> DbResult<Severity> {
        Severity::from_name(&self.log_level)
            .ok_or_else(|| DbError::Config(format!("unknown log_level '{}'", self.log_level)))
    }

    /// Installs the configured log level process-wide.
    pub fn apply_logging(&self) -> DbResult<()> {
        Logger::set_min_severity(self.severity()?);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.storage_path, PathBuf::from("./databases"));
        assert_eq!(config.btree_degree, 3);
        assert_eq!(config.log_level, "WARN");
        config.validate().unwrap();
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("shelfdb.json");
        fs::write(&path, r#"{"btree_degree": 8}"#).unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.btree_degree, 8);
        assert_eq!(config.log_level, "WARN");
    }

    #[test]
    fn test_invalid_values_rejected() {
        let config = Config {
            btree_degree: 1,
            ..Default::default()
        };
        assert_eq!(config.validate().unwrap_err().code(), "SHELF_CONFIG_INVALID");

        let config = Config {
            log_level: "LOUD".into(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_malformed_file_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("shelfdb.json");
        fs::write(&path, "{btree_degree: }").unwrap();

        assert!(Config::load(&path).is_err());
    }
}
