//! Query subsystem for shelfdb
//!
//! Filters arrive as JSON objects using the `@` sentinel for operators and
//! combinators. [`QueryCompiler`] validates a filter once and produces a
//! [`Query`] tree; [`Query::matches`] evaluates it against any document.

mod ast;
mod compiler;
mod errors;
mod eval;
mod path;

pub use ast::{FieldCondition, IndexableCondition, Operand, Operator, Query, SENTINEL};
pub use compiler::QueryCompiler;
pub use errors::{QueryError, QueryErrorCode, QueryResult, Severity};
pub use path::{FieldPath, MAX_PATH_DEPTH};
