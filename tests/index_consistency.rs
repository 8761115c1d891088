//! Index Consistency Tests
//!
//! Tests for index invariants:
//! - Lookups reflect exactly the documents written through the manager
//! - Content-aware and blind deletes both unindex a document
//! - Persisted indexes reload identically
//! - Corrupted index files are rejected at open

use std::fs;

use serde_json::{json, Value};
use shelfdb::index::{file_name_for, CompareOp, IndexKey, IndexManager};
use shelfdb::storage::{DocumentStore, MemoryStore};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn store_with_ages(ages: &[i64]) -> MemoryStore {
    let mut store = MemoryStore::new();
    for (i, age) in ages.iter().enumerate() {
        let id = format!("doc{}", i);
        store.put(&id, &json!({"_id": id, "age": age})).unwrap();
    }
    store
}

fn lookup(manager: &IndexManager, field: &str, op: CompareOp, operand: Value) -> Vec<String> {
    manager.indexed_lookup(field, op, &operand).unwrap()
}

// =============================================================================
// Scenario Tests
// =============================================================================

/// Index on age over [30, 25, 30, 40]: equality on 30 yields both ids.
#[test]
fn test_equality_lookup_after_backfill() {
    let dir = TempDir::new().unwrap();
    let store = store_with_ages(&[30, 25, 30, 40]);
    let mut manager = IndexManager::open(dir.path(), 3).unwrap();

    assert_eq!(manager.create_index("age", &store).unwrap(), 4);

    let ids = lookup(&manager, "age", CompareOp::Eq, json!(30));
    assert_eq!(ids, vec!["doc0", "doc2"]);
}

/// Deleting the only document under a key empties that key.
#[test]
fn test_delete_with_document_empties_key() {
    let dir = TempDir::new().unwrap();
    let store = store_with_ages(&[30, 25, 40]);
    let mut manager = IndexManager::open(dir.path(), 3).unwrap();
    manager.create_index("age", &store).unwrap();

    let doc = store.get("doc0").unwrap().unwrap();
    manager.on_delete("doc0", Some(&doc)).unwrap();

    assert!(lookup(&manager, "age", CompareOp::Eq, json!(30)).is_empty());
    let tree = manager.get("age").unwrap().tree();
    assert!(tree.search(&IndexKey::from_int(30)).is_empty());
    tree.check_invariants().unwrap();
}

/// Without the document, the id is purged from every list.
#[test]
fn test_blind_delete_purges_every_key() {
    let dir = TempDir::new().unwrap();
    let mut store = MemoryStore::new();
    store.put("multi", &json!({"tags": ["a", "b", "c"]})).unwrap();
    store.put("single", &json!({"tags": ["b"]})).unwrap();

    let mut manager = IndexManager::open(dir.path(), 2).unwrap();
    manager.create_index("tags", &store).unwrap();

    manager.on_delete("multi", None).unwrap();

    assert!(lookup(&manager, "tags", CompareOp::Eq, json!("a")).is_empty());
    assert_eq!(lookup(&manager, "tags", CompareOp::Eq, json!("b")), vec!["single"]);
    assert_eq!(manager.get("tags").unwrap().tree().len(), 1);
}

// =============================================================================
// Range and Kind Tests
// =============================================================================

/// Range lookups only return keys of the operand's kind.
#[test]
fn test_range_lookup_respects_kind() {
    let dir = TempDir::new().unwrap();
    let mut store = MemoryStore::new();
    store.put("n1", &json!({"v": 5})).unwrap();
    store.put("n2", &json!({"v": 12.5})).unwrap();
    store.put("s1", &json!({"v": "50"})).unwrap();
    store.put("b1", &json!({"v": true})).unwrap();

    let mut manager = IndexManager::open(dir.path(), 2).unwrap();
    manager.create_index("v", &store).unwrap();

    assert_eq!(lookup(&manager, "v", CompareOp::Gt, json!(1)), vec!["n1", "n2"]);
    assert_eq!(lookup(&manager, "v", CompareOp::Gte, json!("0")), vec!["s1"]);
    assert_eq!(lookup(&manager, "v", CompareOp::Eq, json!(5.0)), vec!["n1"]);
    assert_eq!(
        lookup(&manager, "v", CompareOp::Ne, json!(5)),
        vec!["b1", "n2", "s1"]
    );
}

/// Null, array and object operands produce no candidates.
#[test]
fn test_non_key_operands() {
    let dir = TempDir::new().unwrap();
    let store = store_with_ages(&[1, 2]);
    let mut manager = IndexManager::open(dir.path(), 3).unwrap();
    manager.create_index("age", &store).unwrap();

    for operand in [Value::Null, json!([1]), json!({"a": 1})] {
        assert!(lookup(&manager, "age", CompareOp::Eq, operand).is_empty());
    }
}

// =============================================================================
// Persistence Tests
// =============================================================================

/// A reopened manager sees exactly the persisted trees.
#[test]
fn test_reload_is_identical() {
    let dir = TempDir::new().unwrap();
    let store = store_with_ages(&[30, 25, 30, 40, 18, 77, 25, 30]);

    let (before_age, before_name) = {
        let mut manager = IndexManager::open(dir.path(), 2).unwrap();
        manager.create_index("age", &store).unwrap();
        manager.create_index("name", &store).unwrap();
        manager.on_insert(&json!({"age": 99, "name": "late"}), "late").unwrap();
        manager.on_delete("doc3", Some(&json!({"age": 40}))).unwrap();

        let age = format!("{:?}", manager.get("age").unwrap().tree().entries());
        let name = format!("{:?}", manager.get("name").unwrap().tree().entries());
        manager.close();
        (age, name)
    };

    let manager = IndexManager::open(dir.path(), 2).unwrap();
    assert_eq!(manager.indexed_fields(), vec!["age", "name"]);
    assert_eq!(format!("{:?}", manager.get("age").unwrap().tree().entries()), before_age);
    assert_eq!(format!("{:?}", manager.get("name").unwrap().tree().entries()), before_name);
}

/// Flipping one byte of a blob makes the next open fail.
#[test]
fn test_corrupted_blob_rejected_at_open() {
    let dir = TempDir::new().unwrap();
    {
        let mut manager = IndexManager::open(dir.path(), 3).unwrap();
        manager.create_index("age", &store_with_ages(&[1, 2, 3])).unwrap();
    }

    let path = dir.path().join(file_name_for("age"));
    let mut bytes = fs::read(&path).unwrap();
    let last = bytes.len() - 3;
    bytes[last] ^= 0x20;
    fs::write(&path, bytes).unwrap();

    let err = IndexManager::open(dir.path(), 3).unwrap_err();
    assert_eq!(err.code().code(), "SHELF_INDEX_CORRUPTED");
    assert!(err.is_fatal());
}

/// A structurally invalid tree with a valid checksum is still rejected.
#[test]
fn test_invalid_tree_with_valid_checksum_rejected() {
    let dir = TempDir::new().unwrap();
    let body = r#"{"degree":2,"root":{"keys":[{"Int":2},{"Int":1}],"values":[["a"],["b"]]}}"#;
    let header = json!({
        "format_version": 1,
        "field": "age",
        "degree": 2,
        "checksum": crc32fast::hash(body.as_bytes()),
        "body_len": body.len(),
    });
    let blob = format!("{}\n{}", header, body);
    fs::write(dir.path().join("age.idx"), blob).unwrap();

    let err = IndexManager::open(dir.path(), 2).unwrap_err();
    assert_eq!(err.code().code(), "SHELF_INDEX_CORRUPTED");
}

/// Dropped indexes stay dropped across reopen.
#[test]
fn test_drop_survives_reopen() {
    let dir = TempDir::new().unwrap();
    {
        let mut manager = IndexManager::open(dir.path(), 3).unwrap();
        let store = store_with_ages(&[1]);
        manager.create_index("age", &store).unwrap();
        manager.create_index("name", &store).unwrap();
        manager.drop_index("age").unwrap();
    }

    let manager = IndexManager::open(dir.path(), 3).unwrap();
    assert_eq!(manager.indexed_fields(), vec!["name"]);
}
