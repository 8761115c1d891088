//! B-tree Invariant Tests
//!
//! Tests for the multi-valued B-tree:
//! - Search behaves as a multiset lookup
//! - Balance and ordering hold after arbitrary insert/delete sequences
//! - Range lookups agree with a linear scan for every operator
//! - Insert followed by delete restores the previous state

use std::collections::BTreeMap;

use shelfdb::index::{BTree, CompareOp};

// =============================================================================
// Helper Functions
// =============================================================================

/// Deterministic pseudo-random sequence (64-bit LCG)
struct Lcg(u64);

impl Lcg {
    fn next(&mut self) -> u64 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.0 >> 33
    }

    fn below(&mut self, n: u64) -> u64 {
        self.next() % n
    }
}

/// Reference model: key -> values in insertion order
type Model = BTreeMap<i64, Vec<String>>;

fn model_insert(model: &mut Model, key: i64, value: &str) {
    model.entry(key).or_default().push(value.to_string());
}

fn model_delete(model: &mut Model, key: i64, value: &str) -> bool {
    let Some(list) = model.get_mut(&key) else {
        return false;
    };
    let Some(pos) = list.iter().position(|v| v == value) else {
        return false;
    };
    list.remove(pos);
    if list.is_empty() {
        model.remove(&key);
    }
    true
}

fn assert_matches_model(tree: &BTree<i64, String>, model: &Model) {
    tree.check_invariants().unwrap();
    assert_eq!(tree.len(), model.len());

    let entries: Vec<(i64, Vec<String>)> = tree
        .entries()
        .into_iter()
        .map(|(k, v)| (*k, v.to_vec()))
        .collect();
    let expected: Vec<(i64, Vec<String>)> =
        model.iter().map(|(k, v)| (*k, v.clone())).collect();
    assert_eq!(entries, expected);
}

fn linear_range(model: &Model, op: CompareOp, target: i64) -> Vec<String> {
    model
        .iter()
        .filter(|(k, _)| op.matches(*k, &target))
        .flat_map(|(_, v)| v.iter().cloned())
        .collect()
}

// =============================================================================
// Scenario Tests
// =============================================================================

/// Degree 3: the sixth insert splits the root; deleting 30 keeps balance.
#[test]
fn test_scenario_root_split_and_delete() {
    let mut tree: BTree<i64, String> = BTree::new(3);
    for k in [10, 20, 30, 40, 50] {
        tree.insert(k, format!("id{}", k / 10));
    }
    assert_eq!(tree.height(), 1);

    tree.insert(60, "id6".to_string());
    assert_eq!(tree.height(), 2);
    assert_eq!(tree.root_keys(), &[30]);
    assert_eq!(tree.search(&30), &["id3".to_string()]);

    assert!(tree.delete(&30, &"id3".to_string()));
    assert!(tree.search(&30).is_empty());
    tree.check_invariants().unwrap();
    assert_eq!(tree.len(), 5);
}

/// Duplicate pairs are kept as a multiset.
#[test]
fn test_multiset_semantics() {
    let mut tree: BTree<i64, String> = BTree::new(2);
    tree.insert(7, "a".into());
    tree.insert(7, "b".into());
    tree.insert(7, "a".into());

    assert_eq!(tree.search(&7), &["a", "b", "a"]);
    assert!(tree.delete(&7, &"a".to_string()));
    assert_eq!(tree.search(&7), &["b", "a"]);
    assert!(!tree.delete(&7, &"zzz".to_string()));
    assert!(!tree.delete(&8, &"a".to_string()));
    assert_eq!(tree.value_count(), 2);
}

// =============================================================================
// Randomized Sequence Tests
// =============================================================================

/// Interleaved inserts and deletes keep the tree identical to the model.
#[test]
fn test_random_sequences_match_model() {
    for degree in 2..=5 {
        for seed in 0..4u64 {
            let mut rng = Lcg(seed * 7919 + degree as u64);
            let mut tree: BTree<i64, String> = BTree::new(degree);
            let mut model = Model::new();
            let mut inserted: Vec<(i64, String)> = Vec::new();

            for step in 0..600 {
                let delete = !inserted.is_empty() && rng.below(100) < 40;
                if delete {
                    let idx = rng.below(inserted.len() as u64) as usize;
                    let (key, value) = inserted.swap_remove(idx);
                    assert!(tree.delete(&key, &value));
                    assert!(model_delete(&mut model, key, &value));
                } else {
                    let key = rng.below(150) as i64 - 75;
                    let value = format!("v{}", rng.below(5));
                    tree.insert(key, value.clone());
                    model_insert(&mut model, key, &value);
                    inserted.push((key, value));
                }

                if step % 25 == 0 {
                    assert_matches_model(&tree, &model);
                }
            }
            assert_matches_model(&tree, &model);

            // Drain everything; the tree must end empty and valid
            for (key, value) in inserted.drain(..) {
                assert!(tree.delete(&key, &value));
                tree.check_invariants().unwrap();
            }
            assert!(tree.is_empty());
            assert_eq!(tree.height(), 1);
        }
    }
}

/// Inserting then deleting the same pair restores the prior contents.
#[test]
fn test_insert_then_delete_restores() {
    let mut rng = Lcg(42);
    let mut tree: BTree<i64, String> = BTree::new(3);
    for _ in 0..200 {
        let key = rng.below(80) as i64;
        tree.insert(key, format!("d{}", key));
    }
    let before: Vec<(i64, Vec<String>)> = tree
        .entries()
        .into_iter()
        .map(|(k, v)| (*k, v.to_vec()))
        .collect();

    for key in [-5, 13, 79, 200] {
        tree.insert(key, "probe".to_string());
        assert!(tree.delete(&key, &"probe".to_string()));
    }

    let after: Vec<(i64, Vec<String>)> = tree
        .entries()
        .into_iter()
        .map(|(k, v)| (*k, v.to_vec()))
        .collect();
    assert_eq!(before, after);
    tree.check_invariants().unwrap();
}

// =============================================================================
// Range Lookup Tests
// =============================================================================

/// Every operator agrees with a linear scan, including absent targets and
/// targets past either end.
#[test]
fn test_search_range_equals_linear_scan() {
    for degree in [2, 3, 7] {
        let mut rng = Lcg(degree as u64);
        let mut tree: BTree<i64, String> = BTree::new(degree);
        let mut model = Model::new();
        for i in 0..300 {
            let key = (rng.below(100) * 2) as i64;
            let value = format!("doc{}", i);
            tree.insert(key, value.clone());
            model_insert(&mut model, key, &value);
        }

        for target in [-10, 0, 1, 50, 51, 99, 100, 198, 199, 500] {
            for op in CompareOp::ALL {
                assert_eq!(
                    tree.search_range(op, &target),
                    linear_range(&model, op, target),
                    "degree {} op {} target {}",
                    degree,
                    op.as_str(),
                    target
                );
            }
        }
    }
}

/// Range lookups on an empty tree return nothing.
#[test]
fn test_search_range_on_empty_tree() {
    let tree: BTree<i64, String> = BTree::new(2);
    for op in CompareOp::ALL {
        assert!(tree.search_range(op, &0).is_empty());
    }
}

// =============================================================================
// Bulk Removal Tests
// =============================================================================

/// Purging a value removes it from every list and drops emptied keys.
#[test]
fn test_remove_value_everywhere_keeps_balance() {
    let mut tree: BTree<i64, String> = BTree::new(2);
    let mut model = Model::new();
    for k in 0..120 {
        let owner = if k % 3 == 0 { "target" } else { "other" };
        tree.insert(k, owner.to_string());
        model_insert(&mut model, k, owner);
        if k % 4 == 0 {
            tree.insert(k, "target".to_string());
            model_insert(&mut model, k, "target");
        }
    }

    let expected_removed: usize = model
        .values()
        .map(|v| v.iter().filter(|s| *s == "target").count())
        .sum();
    let removed = tree.remove_value_everywhere(&"target".to_string());
    assert_eq!(removed, expected_removed);

    model.retain(|_, v| {
        v.retain(|s| s != "target");
        !v.is_empty()
    });
    assert_matches_model(&tree, &model);
}
