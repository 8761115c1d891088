//! Compiled query representation
//!
//! A filter compiles once into a closed tree of [`Query`] nodes. Leaves are
//! [`FieldCondition`]s; inner nodes are the logical combinators.

use regex::Regex;
use serde_json::Value;

use super::path::FieldPath;
use crate::index::{CompareOp, IndexKey};

/// Prefix marking operator and combinator tokens in a filter
pub const SENTINEL: char = '@';

/// Field operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    Regex,
    Length,
    Lower,
    Upper,
    Contains,
    StartsWith,
    EndsWith,
    Abs,
    Round,
    Year,
    Month,
    Day,
}

impl Operator {
    /// Looks up an operator by its token (including the sentinel).
    pub fn from_token(token: &str) -> Option<Self> {
        let op = match token.strip_prefix(SENTINEL)? {
            "eq" => Operator::Eq,
            "ne" => Operator::Ne,
            "gt" => Operator::Gt,
            "gte" => Operator::Gte,
            "lt" => Operator::Lt,
            "lte" => Operator::Lte,
            "regex" => Operator::Regex,
            "length" => Operator::Length,
            "lower" => Operator::Lower,
            "upper" => Operator::Upper,
            "contains" => Operator::Contains,
            "startswith" | "startsWith" => Operator::StartsWith,
            "endswith" | "endsWith" => Operator::EndsWith,
            "abs" => Operator::Abs,
            "round" => Operator::Round,
            "year" => Operator::Year,
            "month" => Operator::Month,
            "day" => Operator::Day,
            _ => return None,
        };
        Some(op)
    }

    /// Canonical token
    pub fn token(&self) -> &'static str {
        match self {
            Operator::Eq => "@eq",
            Operator::Ne => "@ne",
            Operator::Gt => "@gt",
            Operator::Gte => "@gte",
            Operator::Lt => "@lt",
            Operator::Lte => "@lte",
            Operator::Regex => "@regex",
            Operator::Length => "@length",
            Operator::Lower => "@lower",
            Operator::Upper => "@upper",
            Operator::Contains => "@contains",
            Operator::StartsWith => "@startswith",
            Operator::EndsWith => "@endswith",
            Operator::Abs => "@abs",
            Operator::Round => "@round",
            Operator::Year => "@year",
            Operator::Month => "@month",
            Operator::Day => "@day",
        }
    }

    /// The tree comparator for this operator, if it is a plain comparison
    pub fn compare_op(&self) -> Option<CompareOp> {
        match self {
            Operator::Eq => Some(CompareOp::Eq),
            Operator::Ne => Some(CompareOp::Ne),
            Operator::Gt => Some(CompareOp::Gt),
            Operator::Gte => Some(CompareOp::Gte),
            Operator::Lt => Some(CompareOp::Lt),
            Operator::Lte => Some(CompareOp::Lte),
            _ => None,
        }
    }
}

/// Operand of a field condition, validated and pre-processed at compile time
#[derive(Debug, Clone)]
pub enum Operand {
    /// Arbitrary JSON value (comparisons)
    Value(Value),
    /// Compiled pattern; `None` when the pattern did not compile
    Pattern(Option<Regex>),
    /// Text operand for the case-insensitive string helpers
    Text(String),
    /// Integer operand (`@length`, `@year`, `@month`, `@day`)
    Integer(i64),
    /// Numeric operand (`@abs`, `@round`)
    Number(f64),
}

/// Leaf predicate: `path operator operand`
#[derive(Debug, Clone)]
pub struct FieldCondition {
    pub path: FieldPath,
    pub operator: Operator,
    pub operand: Operand,
}

/// Compiled filter
#[derive(Debug, Clone)]
pub enum Query {
    Field(FieldCondition),
    And(Vec<Query>),
    Or(Vec<Query>),
    Not(Box<Query>),
}

/// A condition an index can answer: a plain comparison against a scalar.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexableCondition<'a> {
    /// Canonical field path
    pub field: String,
    pub op: CompareOp,
    pub operand: &'a Value,
}

impl Query {
    /// Query that matches every document
    pub fn match_all() -> Self {
        Query::And(Vec::new())
    }

    /// Conditions that every matching document must satisfy and that an
    /// index can answer.
    ///
    /// Only top-level conjuncts qualify: anything under `@or` or `@not` is
    /// skipped. `@ne` is excluded because a document whose field is an empty
    /// array or an object satisfies it without having any key in the index.
    pub fn indexable_conjuncts(&self) -> Vec<IndexableCondition<'_>> {
        let mut out = Vec::new();
        self.collect_conjuncts(&mut out);
        out
    }

    fn collect_conjuncts<'a>(&'a self, out: &mut Vec<IndexableCondition<'a>>) {
        match self {
            Query::And(children) => {
                for child in children {
                    child.collect_conjuncts(out);
                }
            }
            Query::Field(cond) => {
                let op = match cond.operator.compare_op() {
                    Some(CompareOp::Ne) | None => return,
                    Some(op) => op,
                };
                if let Operand::Value(value) = &cond.operand {
                    if IndexKey::from_json(value).is_some() {
                        out.push(IndexableCondition {
                            field: cond.path.to_string(),
                            op,
                            operand: value,
                        });
                    }
                }
            }
            Query::Or(_) | Query::Not(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operator_tokens() {
        assert_eq!(Operator::from_token("@gte"), Some(Operator::Gte));
        assert_eq!(Operator::from_token("@startsWith"), Some(Operator::StartsWith));
        assert_eq!(Operator::from_token("@endswith"), Some(Operator::EndsWith));
        assert_eq!(Operator::from_token("gte"), None);
        assert_eq!(Operator::from_token("@between"), None);
    }

    #[test]
    fn test_token_roundtrip() {
        for op in [Operator::Eq, Operator::Regex, Operator::StartsWith, Operator::Day] {
            assert_eq!(Operator::from_token(op.token()), Some(op));
        }
    }

    #[test]
    fn test_compare_op_mapping() {
        assert_eq!(Operator::Lte.compare_op(), Some(CompareOp::Lte));
        assert_eq!(Operator::Regex.compare_op(), None);
    }
}
