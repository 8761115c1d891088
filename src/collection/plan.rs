//! Access path selection
//!
//! A plan either scans the whole collection or probes one index per
//! indexable top-level condition and intersects the candidate sets. Either
//! way the full filter is applied to every candidate afterwards.

use std::fmt;

use serde_json::{json, Value};

use crate::index::{CompareOp, IndexManager};
use crate::query::Query;

/// How candidates are produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanType {
    /// Every document is a candidate
    FullScan,
    /// At least one index equality probe
    IndexedEquality,
    /// Index range probes only
    IndexedRange,
}

impl ScanType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScanType::FullScan => "FULL_SCAN",
            ScanType::IndexedEquality => "INDEX_EQ",
            ScanType::IndexedRange => "INDEX_RANGE",
        }
    }
}

impl fmt::Display for ScanType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One index lookup
#[derive(Debug, Clone, PartialEq)]
pub struct IndexProbe {
    pub field: String,
    pub op: CompareOp,
    pub operand: Value,
}

/// Immutable query plan
#[derive(Debug, Clone, PartialEq)]
pub struct QueryPlan {
    pub scan_type: ScanType,
    pub probes: Vec<IndexProbe>,
}

impl QueryPlan {
    /// Chooses probes for every indexable conjunct whose field is indexed.
    pub fn build(query: &Query, indexes: &IndexManager) -> Self {
        let probes: Vec<IndexProbe> = query
            .indexable_conjuncts()
            .into_iter()
            .filter(|cond| indexes.has_index(&cond.field))
            .map(|cond| IndexProbe {
                field: cond.field,
                op: cond.op,
                operand: cond.operand.clone(),
            })
            .collect();

        let scan_type = if probes.is_empty() {
            ScanType::FullScan
        } else if probes.iter().any(|p| p.op == CompareOp::Eq) {
            ScanType::IndexedEquality
        } else {
            ScanType::IndexedRange
        };

        Self { scan_type, probes }
    }

    /// Deterministic description of the plan
    pub fn explain(&self) -> Value {
        let probes: Vec<Value> = self
            .probes
            .iter()
            .map(|p| json!({"field": p.field, "op": p.op.as_str(), "operand": p.operand}))
            .collect();
        json!({
            "scan_type": self.scan_type.as_str(),
            "index_probes": probes,
            "revalidated": true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::QueryCompiler;
    use crate::storage::MemoryStore;
    use serde_json::json;
    use tempfile::TempDir;

    fn manager_with(fields: &[&str]) -> (TempDir, IndexManager) {
        let dir = TempDir::new().unwrap();
        let mut manager = IndexManager::open(dir.path(), 3).unwrap();
        let store = MemoryStore::new();
        for field in fields {
            manager.create_index(field, &store).unwrap();
        }
        (dir, manager)
    }

    fn plan(filter: Value, manager: &IndexManager) -> QueryPlan {
        QueryPlan::build(&QueryCompiler::compile(&filter).unwrap(), manager)
    }

    #[test]
    fn test_unindexed_field_scans() {
        let (_dir, manager) = manager_with(&["age"]);
        let plan = plan(json!({"name": "Alice"}), &manager);
        assert_eq!(plan.scan_type, ScanType::FullScan);
        assert!(plan.probes.is_empty());
    }

    #[test]
    fn test_indexed_equality() {
        let (_dir, manager) = manager_with(&["age"]);
        let plan = plan(json!({"age": 30, "name": "Alice"}), &manager);
        assert_eq!(plan.scan_type, ScanType::IndexedEquality);
        assert_eq!(plan.probes.len(), 1);
        assert_eq!(plan.probes[0].field, "age");
    }

    #[test]
    fn test_range_probes() {
        let (_dir, manager) = manager_with(&["age"]);
        let plan = plan(json!({"age": {"@gte": 18, "@lt": 65}}), &manager);
        assert_eq!(plan.scan_type, ScanType::IndexedRange);
        assert_eq!(plan.probes.len(), 2);
    }

    #[test]
    fn test_disjunction_and_ne_scan() {
        let (_dir, manager) = manager_with(&["age"]);
        let or = plan(json!({"@or": [{"age": 1}, {"age": 2}]}), &manager);
        assert_eq!(or.scan_type, ScanType::FullScan);

        let ne = plan(json!({"age": {"@ne": 30}}), &manager);
        assert_eq!(ne.scan_type, ScanType::FullScan);

        let array_operand = plan(json!({"age": [1, 2]}), &manager);
        assert_eq!(array_operand.scan_type, ScanType::FullScan);
    }

    #[test]
    fn test_explain_output() {
        let (_dir, manager) = manager_with(&["age"]);
        let explained = plan(json!({"age": {"@gt": 21}}), &manager).explain();
        assert_eq!(explained["scan_type"], "INDEX_RANGE");
        assert_eq!(explained["index_probes"][0]["op"], "gt");
        assert_eq!(explained["index_probes"][0]["operand"], 21);
    }
}
