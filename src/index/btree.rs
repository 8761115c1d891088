//! Multi-valued B-tree used as a secondary index
//!
//! Each key maps to a ValueList (an ordered `Vec` of opaque values, in
//! practice document ids). Nodes own their children outright; there are no
//! parent pointers and no shared ownership.
//!
//! # Invariants
//!
//! - Keys within a node are strictly ascending
//! - For children c0..cn and keys k0..k(n-1): keys(ci) < ki < keys(ci+1)
//! - Every leaf sits at the same depth
//! - Non-root nodes hold between t-1 and 2t-1 keys; the root may hold fewer
//! - No key is stored with an empty ValueList
//!
//! Insert splits full nodes on the way down so it never backtracks.
//! Delete tops up every child to at least t keys before descending into it
//! (borrowing from a sibling or merging), so removal from a leaf never
//! underflows.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

/// Keys stored in a [`BTree`].
///
/// The tree needs a total order for its structure. Range lookups may
/// additionally refuse to order keys that are not meaningfully comparable
/// (for example a number against a string).
pub trait TreeKey: Ord + Clone {
    /// Whether an ordering comparison between the two keys is meaningful.
    fn comparable_with(&self, _other: &Self) -> bool {
        true
    }
}

impl TreeKey for i64 {}
impl TreeKey for u64 {}
impl TreeKey for String {}

/// Comparison operators supported by range lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompareOp {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl CompareOp {
    /// All operators, in declaration order
    pub const ALL: [CompareOp; 6] = [
        CompareOp::Eq,
        CompareOp::Ne,
        CompareOp::Gt,
        CompareOp::Gte,
        CompareOp::Lt,
        CompareOp::Lte,
    ];

    /// Returns the operator name
    pub fn as_str(&self) -> &'static str {
        match self {
            CompareOp::Eq => "eq",
            CompareOp::Ne => "ne",
            CompareOp::Gt => "gt",
            CompareOp::Gte => "gte",
            CompareOp::Lt => "lt",
            CompareOp::Lte => "lte",
        }
    }

    /// Parses an operator name (without any sentinel prefix)
    pub fn from_name(name: &str) -> Option<Self> {
        CompareOp::ALL.into_iter().find(|op| op.as_str() == name)
    }

    /// Whether `left <op> right` holds given `left.cmp(right)`.
    pub fn accepts(self, ordering: Ordering) -> bool {
        match self {
            CompareOp::Eq => ordering == Ordering::Equal,
            CompareOp::Ne => ordering != Ordering::Equal,
            CompareOp::Gt => ordering == Ordering::Greater,
            CompareOp::Gte => ordering != Ordering::Less,
            CompareOp::Lt => ordering == Ordering::Less,
            CompareOp::Lte => ordering != Ordering::Greater,
        }
    }

    /// Whether `key <op> target` holds.
    ///
    /// `Ne` matches any key not equal to the target. Every other operator
    /// requires the two keys to be comparable.
    pub fn matches<K: TreeKey>(self, key: &K, target: &K) -> bool {
        if self == CompareOp::Ne {
            return key != target;
        }
        key.comparable_with(target) && self.accepts(key.cmp(target))
    }

    /// Whether a subtree whose keys lie strictly between `lower` and
    /// `upper` can contain a matching key.
    fn may_match_between<K: Ord>(self, lower: Option<&K>, upper: Option<&K>, target: &K) -> bool {
        let below_target = || lower.map_or(true, |l| l < target);
        let above_target = || upper.map_or(true, |u| u > target);
        match self {
            CompareOp::Ne => true,
            CompareOp::Eq => below_target() && above_target(),
            CompareOp::Gt | CompareOp::Gte => above_target(),
            CompareOp::Lt | CompareOp::Lte => below_target(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Node<K, V> {
    keys: Vec<K>,
    values: Vec<Vec<V>>,
    #[serde(default = "Vec::new", skip_serializing_if = "Vec::is_empty")]
    children: Vec<Node<K, V>>,
}

impl<K: TreeKey, V: Clone + PartialEq> Node<K, V> {
    fn leaf() -> Self {
        Self {
            keys: Vec::new(),
            values: Vec::new(),
            children: Vec::new(),
        }
    }

    fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    fn find(&self, key: &K) -> Option<&Vec<V>> {
        match self.keys.binary_search(key) {
            Ok(idx) => Some(&self.values[idx]),
            Err(_) if self.is_leaf() => None,
            Err(idx) => self.children[idx].find(key),
        }
    }

    fn find_mut(&mut self, key: &K) -> Option<&mut Vec<V>> {
        match self.keys.binary_search(key) {
            Ok(idx) => Some(&mut self.values[idx]),
            Err(_) if self.is_leaf() => None,
            Err(idx) => self.children[idx].find_mut(key),
        }
    }

    /// Splits the full child at `index`, promoting its median into `self`.
    fn split_child(&mut self, index: usize, degree: usize) {
        let child = &mut self.children[index];
        assert_eq!(
            child.keys.len(),
            2 * degree - 1,
            "split_child called on a node that is not full"
        );

        let right_keys = child.keys.split_off(degree);
        let right_values = child.values.split_off(degree);
        let right_children = if child.is_leaf() {
            Vec::new()
        } else {
            child.children.split_off(degree)
        };
        let median_key = child.keys.pop().expect("full node has a median key");
        let median_values = child.values.pop().expect("full node has a median value list");

        self.keys.insert(index, median_key);
        self.values.insert(index, median_values);
        self.children.insert(
            index + 1,
            Node {
                keys: right_keys,
                values: right_values,
                children: right_children,
            },
        );
    }

    fn insert_non_full(&mut self, key: K, value: V, degree: usize) {
        let mut idx = match self.keys.binary_search(&key) {
            Ok(idx) => {
                self.values[idx].push(value);
                return;
            }
            Err(idx) => idx,
        };

        if self.is_leaf() {
            self.keys.insert(idx, key);
            self.values.insert(idx, vec![value]);
            return;
        }

        if self.children[idx].keys.len() == 2 * degree - 1 {
            self.split_child(idx, degree);
            match key.cmp(&self.keys[idx]) {
                Ordering::Greater => idx += 1,
                Ordering::Equal => {
                    self.values[idx].push(value);
                    return;
                }
                Ordering::Less => {}
            }
        }
        self.children[idx].insert_non_full(key, value, degree);
    }

    /// Removes `key` (and whatever ValueList it carries) from this subtree.
    ///
    /// The caller guarantees `self` can lose a key: it is the root or holds
    /// at least `degree` keys.
    fn remove(&mut self, key: &K, degree: usize) {
        match self.keys.binary_search(key) {
            Ok(idx) if self.is_leaf() => {
                self.keys.remove(idx);
                self.values.remove(idx);
            }
            Ok(idx) => self.remove_from_internal(idx, degree),
            Err(_) if self.is_leaf() => {}
            Err(idx) => {
                let idx = self.fill_child(idx, degree);
                self.children[idx].remove(key, degree);
            }
        }
    }

    fn remove_from_internal(&mut self, idx: usize, degree: usize) {
        if self.children[idx].keys.len() >= degree {
            let (key, values) = self.children[idx].pop_max(degree);
            self.keys[idx] = key;
            self.values[idx] = values;
        } else if self.children[idx + 1].keys.len() >= degree {
            let (key, values) = self.children[idx + 1].pop_min(degree);
            self.keys[idx] = key;
            self.values[idx] = values;
        } else {
            let key = self.keys[idx].clone();
            self.merge_children(idx, degree);
            self.children[idx].remove(&key, degree);
        }
    }

    /// Removes and returns the largest entry of this subtree.
    fn pop_max(&mut self, degree: usize) -> (K, Vec<V>) {
        if self.is_leaf() {
            let key = self.keys.pop().expect("pop_max on an empty node");
            let values = self.values.pop().expect("keys and values out of step");
            return (key, values);
        }
        let last = self.children.len() - 1;
        let idx = self.fill_child(last, degree);
        self.children[idx].pop_max(degree)
    }

    /// Removes and returns the smallest entry of this subtree.
    fn pop_min(&mut self, degree: usize) -> (K, Vec<V>) {
        if self.is_leaf() {
            assert!(!self.keys.is_empty(), "pop_min on an empty node");
            return (self.keys.remove(0), self.values.remove(0));
        }
        let idx = self.fill_child(0, degree);
        self.children[idx].pop_min(degree)
    }

    /// Makes sure `children[idx]` holds at least `degree` keys.
    ///
    /// Returns the index of the child that now covers the original child's
    /// key range (it moves left by one when merged into its left sibling).
    fn fill_child(&mut self, idx: usize, degree: usize) -> usize {
        if self.children[idx].keys.len() >= degree {
            return idx;
        }
        let has_right = idx + 1 < self.children.len();
        if idx > 0 && self.children[idx - 1].keys.len() >= degree {
            self.borrow_from_left(idx);
            idx
        } else if has_right && self.children[idx + 1].keys.len() >= degree {
            self.borrow_from_right(idx);
            idx
        } else if has_right {
            self.merge_children(idx, degree);
            idx
        } else {
            self.merge_children(idx - 1, degree);
            idx - 1
        }
    }

    /// Rotates one entry from `children[idx - 1]` through the parent into
    /// `children[idx]`.
    fn borrow_from_left(&mut self, idx: usize) {
        let (before, after) = self.children.split_at_mut(idx);
        let left = &mut before[idx - 1];
        let child = &mut after[0];

        let up_key = left.keys.pop().expect("left sibling has a spare key");
        let up_values = left.values.pop().expect("keys and values out of step");
        let down_key = std::mem::replace(&mut self.keys[idx - 1], up_key);
        let down_values = std::mem::replace(&mut self.values[idx - 1], up_values);

        child.keys.insert(0, down_key);
        child.values.insert(0, down_values);
        if let Some(grandchild) = left.children.pop() {
            child.children.insert(0, grandchild);
        }
    }

    /// Rotates one entry from `children[idx + 1]` through the parent into
    /// `children[idx]`.
    fn borrow_from_right(&mut self, idx: usize) {
        let (before, after) = self.children.split_at_mut(idx + 1);
        let child = &mut before[idx];
        let right = &mut after[0];

        let up_key = right.keys.remove(0);
        let up_values = right.values.remove(0);
        let down_key = std::mem::replace(&mut self.keys[idx], up_key);
        let down_values = std::mem::replace(&mut self.values[idx], up_values);

        child.keys.push(down_key);
        child.values.push(down_values);
        if !right.is_leaf() {
            child.children.push(right.children.remove(0));
        }
    }

    /// Merges `children[idx]`, separator `idx` and `children[idx + 1]`.
    fn merge_children(&mut self, idx: usize, degree: usize) {
        let right = self.children.remove(idx + 1);
        let separator_key = self.keys.remove(idx);
        let separator_values = self.values.remove(idx);

        let left = &mut self.children[idx];
        left.keys.push(separator_key);
        left.values.push(separator_values);
        left.keys.extend(right.keys);
        left.values.extend(right.values);
        left.children.extend(right.children);

        assert!(
            left.keys.len() <= 2 * degree - 1,
            "merge produced an overfull node ({} keys, degree {})",
            left.keys.len(),
            degree
        );
    }

    fn collect_range(
        &self,
        op: CompareOp,
        target: &K,
        lower: Option<&K>,
        upper: Option<&K>,
        out: &mut Vec<V>,
    ) {
        let n = self.keys.len();
        for i in 0..=n {
            if !self.is_leaf() {
                let lo = if i == 0 { lower } else { Some(&self.keys[i - 1]) };
                let hi = if i == n { upper } else { Some(&self.keys[i]) };
                if op.may_match_between(lo, hi, target) {
                    self.children[i].collect_range(op, target, lo, hi, out);
                }
            }
            if i < n && op.matches(&self.keys[i], target) {
                out.extend(self.values[i].iter().cloned());
            }
        }
    }

    /// Strips every occurrence of `value`, recording keys left empty.
    fn purge_value(&mut self, value: &V, emptied: &mut Vec<K>) -> usize {
        let mut removed = 0;
        for (key, list) in self.keys.iter().zip(self.values.iter_mut()) {
            let before = list.len();
            list.retain(|v| v != value);
            if list.len() != before {
                removed += before - list.len();
                if list.is_empty() {
                    emptied.push(key.clone());
                }
            }
        }
        for child in &mut self.children {
            removed += child.purge_value(value, emptied);
        }
        removed
    }

    fn collect_entries<'a>(&'a self, out: &mut Vec<(&'a K, &'a [V])>) {
        for (i, key) in self.keys.iter().enumerate() {
            if !self.is_leaf() {
                self.children[i].collect_entries(out);
            }
            out.push((key, self.values[i].as_slice()));
        }
        if let Some(last) = self.children.last() {
            last.collect_entries(out);
        }
    }

    fn key_count(&self) -> usize {
        self.keys.len() + self.children.iter().map(Node::key_count).sum::<usize>()
    }

    fn value_count(&self) -> usize {
        self.values.iter().map(Vec::len).sum::<usize>()
            + self.children.iter().map(Node::value_count).sum::<usize>()
    }

    fn check(
        &self,
        degree: usize,
        is_root: bool,
        bounds: (Option<&K>, Option<&K>),
        depth: usize,
        leaf_depth: &mut Option<usize>,
    ) -> Result<(), String> {
        let n = self.keys.len();
        if self.values.len() != n {
            return Err(format!(
                "node at depth {} has {} keys but {} value lists",
                depth,
                n,
                self.values.len()
            ));
        }
        if n > 2 * degree - 1 {
            return Err(format!("node at depth {} overflows with {} keys", depth, n));
        }
        if !is_root && n < degree - 1 {
            return Err(format!("node at depth {} underflows with {} keys", depth, n));
        }
        if self.values.iter().any(Vec::is_empty) {
            return Err(format!("node at depth {} stores an empty value list", depth));
        }
        if self.keys.windows(2).any(|w| w[0] >= w[1]) {
            return Err(format!("keys at depth {} are not strictly ascending", depth));
        }
        let (lower, upper) = bounds;
        if let (Some(first), Some(lower)) = (self.keys.first(), lower) {
            if first <= lower {
                return Err(format!("key at depth {} is not above its separator", depth));
            }
        }
        if let (Some(last), Some(upper)) = (self.keys.last(), upper) {
            if last >= upper {
                return Err(format!("key at depth {} is not below its separator", depth));
            }
        }

        if self.is_leaf() {
            return match *leaf_depth {
                None => {
                    *leaf_depth = Some(depth);
                    Ok(())
                }
                Some(expected) if expected != depth => Err(format!(
                    "leaf at depth {} but other leaves at depth {}",
                    depth, expected
                )),
                Some(_) => Ok(()),
            };
        }

        if n == 0 {
            return Err(format!("internal node at depth {} has no keys", depth));
        }
        if self.children.len() != n + 1 {
            return Err(format!(
                "internal node at depth {} has {} keys but {} children",
                depth,
                n,
                self.children.len()
            ));
        }
        for (i, child) in self.children.iter().enumerate() {
            let lo = if i == 0 { lower } else { Some(&self.keys[i - 1]) };
            let hi = if i == n { upper } else { Some(&self.keys[i]) };
            child.check(degree, false, (lo, hi), depth + 1, leaf_depth)?;
        }
        Ok(())
    }
}

/// A balanced multi-valued search tree of minimum degree `t`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BTree<K, V> {
    degree: usize,
    root: Node<K, V>,
}

impl<K: TreeKey, V: Clone + PartialEq> BTree<K, V> {
    /// Smallest legal minimum degree
    pub const MIN_DEGREE: usize = 2;

    /// Creates an empty tree.
    ///
    /// # Panics
    ///
    /// Panics if `degree < 2`.
    pub fn new(degree: usize) -> Self {
        assert!(
            degree >= Self::MIN_DEGREE,
            "B-tree degree must be at least {}, got {}",
            Self::MIN_DEGREE,
            degree
        );
        Self {
            degree,
            root: Node::leaf(),
        }
    }

    /// Returns the minimum degree `t`
    pub fn degree(&self) -> usize {
        self.degree
    }

    fn max_keys(&self) -> usize {
        2 * self.degree - 1
    }

    /// Returns the ValueList for `key`, empty if absent.
    pub fn search(&self, key: &K) -> &[V] {
        self.root.find(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Returns true if `key` is present
    pub fn contains_key(&self, key: &K) -> bool {
        self.root.find(key).is_some()
    }

    /// Collects the ValueLists of every key satisfying `key <op> target`,
    /// concatenated in key order.
    pub fn search_range(&self, op: CompareOp, target: &K) -> Vec<V> {
        let mut out = Vec::new();
        self.root.collect_range(op, target, None, None, &mut out);
        out
    }

    /// Appends `value` to `key`'s ValueList, creating the key if needed.
    pub fn insert(&mut self, key: K, value: V) {
        if let Some(list) = self.root.find_mut(&key) {
            list.push(value);
            return;
        }

        if self.root.keys.len() == self.max_keys() {
            let old_root = std::mem::replace(&mut self.root, Node::leaf());
            self.root.children.push(old_root);
            self.root.split_child(0, self.degree);
        }
        self.root.insert_non_full(key, value, self.degree);
    }

    /// Removes one occurrence of `value` from `key`'s ValueList.
    ///
    /// When the list empties the key leaves the tree. Returns false if the
    /// pair was not present.
    pub fn delete(&mut self, key: &K, value: &V) -> bool {
        let emptied = match self.root.find_mut(key) {
            Some(list) => match list.iter().position(|v| v == value) {
                Some(pos) => {
                    list.remove(pos);
                    list.is_empty()
                }
                None => return false,
            },
            None => return false,
        };

        if emptied {
            self.remove_key(key);
        }
        true
    }

    /// Removes `value` from every ValueList in the tree.
    ///
    /// Returns how many occurrences were removed.
    pub fn remove_value_everywhere(&mut self, value: &V) -> usize {
        let mut emptied = Vec::new();
        let removed = self.root.purge_value(value, &mut emptied);
        for key in &emptied {
            self.remove_key(key);
        }
        removed
    }

    fn remove_key(&mut self, key: &K) {
        self.root.remove(key, self.degree);
        if self.root.keys.is_empty() && !self.root.is_leaf() {
            assert_eq!(self.root.children.len(), 1, "empty root must have one child");
            if let Some(child) = self.root.children.pop() {
                self.root = child;
            }
        }
    }

    /// Number of distinct keys
    pub fn len(&self) -> usize {
        self.root.key_count()
    }

    /// Returns true if the tree holds no keys
    pub fn is_empty(&self) -> bool {
        self.root.keys.is_empty()
    }

    /// Total number of values across all ValueLists
    pub fn value_count(&self) -> usize {
        self.root.value_count()
    }

    /// Number of levels (1 for a lone leaf root)
    pub fn height(&self) -> usize {
        let mut height = 1;
        let mut node = &self.root;
        while let Some(child) = node.children.first() {
            height += 1;
            node = child;
        }
        height
    }

    /// Keys currently held by the root node
    pub fn root_keys(&self) -> &[K] {
        &self.root.keys
    }

    /// All entries in ascending key order
    pub fn entries(&self) -> Vec<(&K, &[V])> {
        let mut out = Vec::new();
        self.root.collect_entries(&mut out);
        out
    }

    /// Verifies every structural invariant, describing the first violation.
    pub fn check_invariants(&self) -> Result<(), String> {
        if self.degree < Self::MIN_DEGREE {
            return Err(format!("degree {} is below the minimum", self.degree));
        }
        let mut leaf_depth = None;
        self.root.check(self.degree, true, (None, None), 0, &mut leaf_depth)
    }
}
