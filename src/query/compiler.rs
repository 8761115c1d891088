//! Filter compiler
//!
//! Turns the JSON filter wire format into a [`Query`]. All structural
//! validation happens here, so evaluation never fails.
//!
//! ```text
//! {"@or": [{"age": {"@gte": 18, "@lt": 65}}, {"tags": "vip"}]}
//! ```

use regex::Regex;
use serde_json::{Map, Value};

use super::ast::{FieldCondition, Operand, Operator, Query, SENTINEL};
use super::errors::{QueryError, QueryResult};
use super::path::FieldPath;

const AND: &str = "@and";
const OR: &str = "@or";
const NOT: &str = "@not";

/// Stateless filter compiler
pub struct QueryCompiler;

impl QueryCompiler {
    /// Compiles a filter specification.
    ///
    /// The top level must be an object. Keys in one object are conjoined;
    /// an empty object matches everything.
    pub fn compile(spec: &Value) -> QueryResult<Query> {
        match spec {
            Value::Object(map) => Self::compile_mapping(map),
            other => Err(QueryError::invalid(format!(
                "filter must be an object, got {}",
                type_name(other)
            ))),
        }
    }

    fn compile_mapping(map: &Map<String, Value>) -> QueryResult<Query> {
        let mut clauses = Vec::with_capacity(map.len());

        for (key, value) in map {
            let clause = if key.starts_with(SENTINEL) {
                Self::compile_logical(key, value)?
            } else {
                Self::compile_field(key, value)?
            };
            clauses.push(clause);
        }

        Ok(conjoin(clauses))
    }

    fn compile_logical(token: &str, value: &Value) -> QueryResult<Query> {
        match token {
            AND | OR => {
                let items = value.as_array().ok_or_else(|| {
                    QueryError::invalid(format!("'{}' expects an array of filters", token))
                })?;
                let children = items
                    .iter()
                    .map(|item| match item {
                        Value::Object(map) => Self::compile_mapping(map),
                        _ => Err(QueryError::invalid(format!(
                            "'{}' elements must be objects",
                            token
                        ))),
                    })
                    .collect::<QueryResult<Vec<_>>>()?;
                Ok(if token == AND {
                    Query::And(children)
                } else {
                    Query::Or(children)
                })
            }
            NOT => match value {
                Value::Object(map) => Ok(Query::Not(Box::new(Self::compile_mapping(map)?))),
                _ => Err(QueryError::invalid("'@not' expects a filter object")),
            },
            other => Err(QueryError::unknown_operator(other)),
        }
    }

    fn compile_field(field: &str, value: &Value) -> QueryResult<Query> {
        let path = FieldPath::parse(field)?;

        let operators = match value {
            Value::Object(map) => map,
            // Bare value: implicit equality
            _ => return Ok(equality(path, value.clone())),
        };

        let sentinel_keys = operators.keys().filter(|k| k.starts_with(SENTINEL)).count();
        if sentinel_keys == 0 {
            // Literal object compared for equality
            return Ok(equality(path, value.clone()));
        }
        if sentinel_keys != operators.len() {
            return Err(QueryError::invalid(format!(
                "field '{}' mixes operators with plain keys",
                field
            )));
        }

        let mut clauses = Vec::with_capacity(operators.len());
        for (token, operand) in operators {
            let operator =
                Operator::from_token(token).ok_or_else(|| QueryError::unknown_operator(token))?;
            let operand = Self::compile_operand(field, operator, operand)?;
            clauses.push(Query::Field(FieldCondition {
                path: path.clone(),
                operator,
                operand,
            }));
        }

        Ok(conjoin(clauses))
    }

    fn compile_operand(field: &str, operator: Operator, operand: &Value) -> QueryResult<Operand> {
        let invalid = |expected: &str| QueryError::invalid_operand(field, operator.token(), expected);

        match operator {
            Operator::Eq
            | Operator::Ne
            | Operator::Gt
            | Operator::Gte
            | Operator::Lt
            | Operator::Lte => Ok(Operand::Value(operand.clone())),
            Operator::Regex => {
                let pattern = operand.as_str().ok_or_else(|| invalid("a string pattern"))?;
                // An unparsable pattern matches nothing
                Ok(Operand::Pattern(Regex::new(pattern).ok()))
            }
            Operator::Lower
            | Operator::Upper
            | Operator::Contains
            | Operator::StartsWith
            | Operator::EndsWith => operand
                .as_str()
                .map(|s| Operand::Text(s.to_string()))
                .ok_or_else(|| invalid("a string")),
            Operator::Length | Operator::Year | Operator::Month | Operator::Day => {
                integer_operand(operand)
                    .map(Operand::Integer)
                    .ok_or_else(|| invalid("an integer"))
            }
            Operator::Abs | Operator::Round => operand
                .as_f64()
                .map(Operand::Number)
                .ok_or_else(|| invalid("a number")),
        }
    }
}

fn equality(path: FieldPath, operand: Value) -> Query {
    Query::Field(FieldCondition {
        path,
        operator: Operator::Eq,
        operand: Operand::Value(operand),
    })
}

fn conjoin(mut clauses: Vec<Query>) -> Query {
    if clauses.len() == 1 {
        clauses.remove(0)
    } else {
        Query::And(clauses)
    }
}

/// Accepts integers and integral floats (`3` and `3.0`)
fn integer_operand(value: &Value) -> Option<i64> {
    value.as_i64().or_else(|| {
        value
            .as_f64()
            .filter(|f| f.fract() == 0.0 && f.abs() < 9.0e15)
            .map(|f| f as i64)
    })
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
