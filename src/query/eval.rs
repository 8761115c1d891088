//! Predicate evaluation
//!
//! Evaluation is total. A missing or null field, a type mismatch, an
//! unparsable date or a dead regex all make the condition false; nothing
//! here returns an error.

use std::cmp::Ordering;

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use serde_json::Value;

use super::ast::{FieldCondition, Operand, Operator, Query};
use crate::index::IndexKey;

impl Query {
    /// Evaluates the query against a document.
    pub fn matches(&self, document: &Value) -> bool {
        match self {
            Query::Field(cond) => cond.matches(document),
            Query::And(children) => children.iter().all(|c| c.matches(document)),
            Query::Or(children) => children.iter().any(|c| c.matches(document)),
            Query::Not(inner) => !inner.matches(document),
        }
    }
}

impl FieldCondition {
    /// Evaluates this condition against a document.
    pub fn matches(&self, document: &Value) -> bool {
        let actual = match self.path.resolve(document) {
            None | Some(Value::Null) => return false,
            Some(v) => v,
        };

        if let Value::Array(items) = actual {
            return match self.operator {
                Operator::Eq => self.array_has(actual, items),
                Operator::Ne => !self.array_has(actual, items),
                Operator::Length => self.length_equals(actual),
                _ => items.iter().any(|item| self.matches_value(item)),
            };
        }

        self.matches_value(actual)
    }

    /// Equality on an array field: the array itself or one of its elements
    fn array_has(&self, actual: &Value, items: &[Value]) -> bool {
        match &self.operand {
            Operand::Value(expected) => {
                values_equal(actual, expected) || items.iter().any(|i| values_equal(i, expected))
            }
            _ => false,
        }
    }

    fn matches_value(&self, actual: &Value) -> bool {
        if actual.is_null() {
            return false;
        }

        match (&self.operator, &self.operand) {
            (Operator::Eq, Operand::Value(expected)) => values_equal(actual, expected),
            (Operator::Ne, Operand::Value(expected)) => !values_equal(actual, expected),
            (op, Operand::Value(expected)) => match (op.compare_op(), compare_values(actual, expected)) {
                (Some(cmp), Some(ordering)) => cmp.accepts(ordering),
                _ => false,
            },
            (Operator::Regex, Operand::Pattern(pattern)) => match pattern {
                Some(re) => re.is_match(&string_form(actual)),
                None => false,
            },
            (Operator::Length, Operand::Integer(_)) => self.length_equals(actual),
            (op, Operand::Text(expected)) => match actual.as_str() {
                Some(text) => text_matches(*op, text, expected),
                None => false,
            },
            (Operator::Abs, Operand::Number(expected)) => {
                actual.as_f64().map_or(false, |n| n.abs() == *expected)
            }
            (Operator::Round, Operand::Number(expected)) => {
                actual.as_f64().map_or(false, |n| n.round_ties_even() == *expected)
            }
            (op, Operand::Integer(expected)) => match actual.as_str().and_then(parse_date) {
                Some(date) => {
                    let part = match op {
                        Operator::Year => i64::from(date.year()),
                        Operator::Month => i64::from(date.month()),
                        Operator::Day => i64::from(date.day()),
                        _ => return false,
                    };
                    part == *expected
                }
                None => false,
            },
            _ => false,
        }
    }

    fn length_equals(&self, actual: &Value) -> bool {
        let expected = match self.operand {
            Operand::Integer(n) => n,
            _ => return false,
        };
        let length = match actual {
            Value::String(s) => s.chars().count(),
            Value::Array(items) => items.len(),
            Value::Object(map) => map.len(),
            Value::Number(n) => n.to_string().bytes().filter(u8::is_ascii_digit).count(),
            _ => return false,
        };
        i64::try_from(length).map_or(false, |len| len == expected)
    }
}

fn text_matches(op: Operator, text: &str, expected: &str) -> bool {
    match op {
        Operator::Lower => text.to_lowercase() == expected.to_lowercase(),
        Operator::Upper => text.to_uppercase() == expected.to_uppercase(),
        Operator::Contains => text.to_lowercase().contains(&expected.to_lowercase()),
        Operator::StartsWith => text.to_lowercase().starts_with(&expected.to_lowercase()),
        Operator::EndsWith => text.to_lowercase().ends_with(&expected.to_lowercase()),
        _ => false,
    }
}

/// JSON equality where `1` and `1.0` are equal
pub(crate) fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(_), Value::Number(_)) => compare_values(a, b) == Some(Ordering::Equal),
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(l, r)| values_equal(l, r))
        }
        (Value::Object(x), Value::Object(y)) => {
            x.len() == y.len()
                && x.iter()
                    .all(|(k, v)| y.get(k).map_or(false, |other| values_equal(v, other)))
        }
        _ => a == b,
    }
}

/// Ordering between two scalars of the same kind, `None` otherwise
pub(crate) fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        // Exact int/float ordering, shared with index keys
        (Value::Number(_), Value::Number(_)) => {
            Some(IndexKey::from_json(a)?.cmp(&IndexKey::from_json(b)?))
        }
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

fn string_form(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Parses ISO-8601 dates and datetimes, with or without offset
fn parse_date(text: &str) -> Option<NaiveDate> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.date_naive());
    }
    for format in [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
    ] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Some(dt.date());
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d").ok()
}
