//! Index keys extracted from document field values
//!
//! Keys have a kind (bool, number, string). Within a kind keys are totally
//! ordered; across kinds the tree orders Bool < Number < String so that
//! every kind occupies one contiguous run of the key space.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::btree::TreeKey;

/// Coarse key category. Ordering comparisons only apply within a kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum KeyKind {
    Bool,
    Number,
    String,
}

/// Index key representing a scalar field value.
///
/// Integral numbers are always stored as `Int`, so `1` and `1.0` map to the
/// same key. `Float` only holds non-integral (or out of `i64` range) values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum IndexKey {
    /// Boolean value (false < true)
    Bool(bool),
    /// Integer value
    Int(i64),
    /// Non-integral number
    Float(f64),
    /// String value
    String(String),
}

impl IndexKey {
    /// Create a key from an integer
    pub fn from_int(v: i64) -> Self {
        IndexKey::Int(v)
    }

    /// Create a key from a float, normalizing integral values to `Int`.
    pub fn from_float(v: f64) -> Self {
        // 2^63 is exactly representable; anything below it with no
        // fractional part fits in an i64.
        if v.fract() == 0.0 && v >= i64::MIN as f64 && v < 9_223_372_036_854_775_808.0 {
            IndexKey::Int(v as i64)
        } else {
            IndexKey::Float(v)
        }
    }

    /// Create a key from a string
    pub fn from_string(v: impl Into<String>) -> Self {
        IndexKey::String(v.into())
    }

    /// Create a key from a JSON value.
    ///
    /// Null, arrays and objects are not keys.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(IndexKey::Bool(*b)),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Some(IndexKey::from_int(i))
                } else {
                    n.as_f64().filter(|f| f.is_finite()).map(IndexKey::from_float)
                }
            }
            Value::String(s) => Some(IndexKey::from_string(s.as_str())),
            _ => None,
        }
    }

    /// Returns the kind of this key
    pub fn kind(&self) -> KeyKind {
        match self {
            IndexKey::Bool(_) => KeyKind::Bool,
            IndexKey::Int(_) | IndexKey::Float(_) => KeyKind::Number,
            IndexKey::String(_) => KeyKind::String,
        }
    }
}

impl Ord for IndexKey {
    fn cmp(&self, other: &Self) -> Ordering {
        use IndexKey::*;
        match (self, other) {
            (Bool(a), Bool(b)) => a.cmp(b),
            (Int(a), Int(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            // Ties between an Int and a Float only occur past 2^53 where the
            // cast rounds; break them by variant to keep Ord total.
            (Int(a), Float(b)) => (*a as f64).total_cmp(b).then(Ordering::Less),
            (Float(a), Int(b)) => a.total_cmp(&(*b as f64)).then(Ordering::Greater),
            (String(a), String(b)) => a.cmp(b),
            _ => self.kind().cmp(&other.kind()),
        }
    }
}

impl PartialOrd for IndexKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for IndexKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for IndexKey {}

impl TreeKey for IndexKey {
    fn comparable_with(&self, other: &Self) -> bool {
        self.kind() == other.kind()
    }
}

impl fmt::Display for IndexKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexKey::Bool(b) => write!(f, "{}", b),
            IndexKey::Int(i) => write!(f, "{}", i),
            IndexKey::Float(v) => write!(f, "{}", v),
            IndexKey::String(s) => write!(f, "{:?}", s),
        }
    }
}
