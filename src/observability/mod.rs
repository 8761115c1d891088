//! Observability subsystem for shelfdb
//!
//! Structured one-line JSON logs and typed lifecycle events. Observability
//! is read-only: it never changes the outcome of an operation, and a failed
//! log write is ignored.
//!
//! ```ignore
//! use shelfdb::observability::{log_event_with_fields, Event};
//!
//! log_event_with_fields(Event::IndexCreated, &[("field", "age"), ("pairs", "42")]);
//! ```

mod events;
mod logger;

pub use events::Event;
pub use logger::{Logger, Severity};

/// Log a lifecycle event
pub fn log_event(event: Event) {
    Logger::log(event.severity(), event.as_str(), &[]);
}

/// Log a lifecycle event with fields
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    Logger::log(event.severity(), event.as_str(), fields);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_event() {
        // Verifies no panic
        log_event(Event::CollectionOpen);
        log_event_with_fields(Event::IndexDropped, &[("field", "age")]);
    }
}
