//! Lifecycle events emitted by shelfdb
//!
//! Events are explicit and typed; the logger only ever sees their stable
//! string names.

use std::fmt;

use super::logger::Severity;

/// Observable events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Configuration
    /// Configuration loaded
    ConfigLoaded,

    // Catalog
    /// Database directory created
    DatabaseCreated,
    /// Database directory removed
    DatabaseDropped,
    /// Collection opened and its indexes loaded
    CollectionOpen,

    // Indexes
    /// Index blob loaded at open
    IndexLoaded,
    /// Index created and backfilled
    IndexCreated,
    /// Index blob rewritten after a mutation
    IndexPersisted,
    /// Index removed
    IndexDropped,

    // Documents
    /// Document written and indexed
    DocumentInserted,
    /// Document removed and unindexed
    DocumentDeleted,

    // Queries
    /// Query evaluated
    QueryExecuted,
    /// Filter failed validation
    QueryRejected,
}

impl Event {
    /// Returns the stable event name
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::DatabaseCreated => "DATABASE_CREATED",
            Event::DatabaseDropped => "DATABASE_DROPPED",
            Event::CollectionOpen => "COLLECTION_OPEN",
            Event::IndexLoaded => "INDEX_LOADED",
            Event::IndexCreated => "INDEX_CREATED",
            Event::IndexPersisted => "INDEX_PERSISTED",
            Event::IndexDropped => "INDEX_DROPPED",
            Event::DocumentInserted => "DOCUMENT_INSERTED",
            Event::DocumentDeleted => "DOCUMENT_DELETED",
            Event::QueryExecuted => "QUERY_EXECUTED",
            Event::QueryRejected => "QUERY_REJECTED",
        }
    }

    /// Severity the event is logged at
    pub fn severity(&self) -> Severity {
        match self {
            Event::IndexPersisted | Event::DocumentInserted | Event::DocumentDeleted => {
                Severity::Trace
            }
            Event::QueryRejected => Severity::Warn,
            _ => Severity::Info,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names() {
        assert_eq!(Event::CollectionOpen.as_str(), "COLLECTION_OPEN");
        assert_eq!(Event::IndexPersisted.as_str(), "INDEX_PERSISTED");
        assert_eq!(format!("{}", Event::QueryExecuted), "QUERY_EXECUTED");
    }

    #[test]
    fn test_event_names_are_screaming_snake_case() {
        let all = [
            Event::ConfigLoaded,
            Event::DatabaseCreated,
            Event::DatabaseDropped,
            Event::CollectionOpen,
            Event::IndexLoaded,
            Event::IndexCreated,
            Event::IndexPersisted,
            Event::IndexDropped,
            Event::DocumentInserted,
            Event::DocumentDeleted,
            Event::QueryExecuted,
            Event::QueryRejected,
        ];
        for event in all {
            assert!(event
                .as_str()
                .chars()
                .all(|c| c.is_ascii_uppercase() || c == '_'));
        }
    }

    #[test]
    fn test_event_severity() {
        assert_eq!(Event::IndexPersisted.severity(), Severity::Trace);
        assert_eq!(Event::IndexCreated.severity(), Severity::Info);
        assert_eq!(Event::QueryRejected.severity(), Severity::Warn);
    }
}
