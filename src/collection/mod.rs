//! Collections for shelfdb
//!
//! A collection ties a document store to its index manager and answers
//! filters against both.

mod collection;
mod plan;

pub use collection::{Collection, ID_FIELD};
pub use plan::{IndexProbe, QueryPlan, ScanType};
