//! Branch distance
//!
//! Evaluates a captured boolean-condition expression tree against the
//! variable values recorded at the decision point, yielding a distance in
//! [0, 1] where 0 means the condition evaluated the way the objective
//! wants. Unsupported expression shapes are hard errors: a guessed
//! distance would corrupt the gradient the whole search climbs.

use rustc_hash::FxHashMap;
use serde_json::Value;

use crate::errors::{Result, TestgenError};
use crate::shared::models::{CompareOp, ConditionNode, LogicalOp, UnaryOp};

/// Punishment constant added to strict inequalities before normalization
const K: f64 = 1.0;

/// Map `[0, inf)` to `[0, 1)`
pub fn normalize(x: f64) -> f64 {
    x / (x + 1.0)
}

/// Distance to making `condition` evaluate to `target_polarity`.
pub fn branch_distance(
    condition: &ConditionNode,
    variables: &FxHashMap<String, Value>,
    target_polarity: bool,
) -> Result<f64> {
    let true_distance = distance_to_true(condition, variables)?;
    let distance = if target_polarity {
        true_distance
    } else {
        1.0 - true_distance
    };
    validate_distance(distance)
}

/// Range check: anything outside [0, 1] signals a broken formula upstream.
fn validate_distance(distance: f64) -> Result<f64> {
    if !(0.0..=1.0).contains(&distance) || distance.is_nan() {
        return Err(TestgenError::invariant(format!(
            "branch distance {distance} outside [0, 1]"
        )));
    }
    Ok(distance)
}

/// Recursive distance-to-true over the expression tree
fn distance_to_true(node: &ConditionNode, variables: &FxHashMap<String, Value>) -> Result<f64> {
    match node {
        ConditionNode::Literal { .. } | ConditionNode::Identifier { .. } | ConditionNode::Member { .. } => {
            let value = resolve(node, variables)?;
            Ok(if truthy(&value) { 0.0 } else { 1.0 })
        }
        ConditionNode::Unary { op: UnaryOp::Not, operand } => {
            Ok(1.0 - distance_to_true(operand, variables)?)
        }
        ConditionNode::Logical { op, left, right } => {
            let dl = distance_to_true(left, variables)?;
            let dr = distance_to_true(right, variables)?;
            Ok(match op {
                LogicalOp::And => normalize(dl + dr),
                LogicalOp::Or => normalize(dl.min(dr)),
            })
        }
        ConditionNode::Binary { op, left, right } => {
            let lhs = resolve(left, variables)?;
            let rhs = resolve(right, variables)?;
            compare_distance(*op, &lhs, &rhs)
        }
    }
}

/// Resolve a direct node (literal, identifier, member lookup) to a value
fn resolve(node: &ConditionNode, variables: &FxHashMap<String, Value>) -> Result<Value> {
    match node {
        ConditionNode::Literal { value } => Ok(value.clone()),
        ConditionNode::Identifier { name } => variables.get(name).cloned().ok_or_else(|| {
            TestgenError::invariant(format!("variable '{name}' not captured at decision point"))
        }),
        ConditionNode::Member { object, property } => {
            // Instrumentation usually captures member accesses flattened
            // ("obj.prop"); fall back to indexing a captured object value.
            if let ConditionNode::Identifier { name } = object.as_ref() {
                let flat = format!("{name}.{property}");
                if let Some(value) = variables.get(&flat) {
                    return Ok(value.clone());
                }
            }
            let object_value = resolve(object, variables)?;
            match object_value {
                Value::Object(map) => map.get(property).cloned().ok_or_else(|| {
                    TestgenError::invariant(format!(
                        "property '{property}' missing from captured object"
                    ))
                }),
                other => Err(TestgenError::unsupported(format!(
                    "member access on non-object value {other}"
                ))),
            }
        }
        other => Err(TestgenError::unsupported(format!(
            "expression node {other:?} cannot be resolved to a value"
        ))),
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Standard branch-distance formulas for comparison operators
fn compare_distance(op: CompareOp, lhs: &Value, rhs: &Value) -> Result<f64> {
    if let (Some(a), Some(b)) = (lhs.as_f64(), rhs.as_f64()) {
        return Ok(match op {
            CompareOp::Eq => {
                if a == b {
                    0.0
                } else {
                    normalize((a - b).abs())
                }
            }
            CompareOp::Neq => {
                if a != b {
                    0.0
                } else {
                    1.0
                }
            }
            CompareOp::Lt => {
                if a < b {
                    0.0
                } else {
                    normalize(a - b + K)
                }
            }
            CompareOp::Leq => {
                if a <= b {
                    0.0
                } else {
                    normalize(a - b)
                }
            }
            CompareOp::Gt => {
                if a > b {
                    0.0
                } else {
                    normalize(b - a + K)
                }
            }
            CompareOp::Geq => {
                if a >= b {
                    0.0
                } else {
                    normalize(b - a)
                }
            }
        });
    }

    match (lhs, rhs, op) {
        (Value::String(a), Value::String(b), CompareOp::Eq) => Ok(if a == b {
            0.0
        } else {
            normalize(levenshtein(a, b) as f64)
        }),
        (Value::String(a), Value::String(b), CompareOp::Neq) => {
            Ok(if a != b { 0.0 } else { 1.0 })
        }
        (Value::Bool(a), Value::Bool(b), CompareOp::Eq) => Ok(if a == b { 0.0 } else { 1.0 }),
        (Value::Bool(a), Value::Bool(b), CompareOp::Neq) => Ok(if a != b { 0.0 } else { 1.0 }),
        // Values of different shapes can never compare equal
        (_, _, CompareOp::Eq) => Ok(1.0),
        (_, _, CompareOp::Neq) => Ok(0.0),
        (a, b, op) => Err(TestgenError::unsupported(format!(
            "comparison {op:?} between {a} and {b}"
        ))),
    }
}

/// Edit distance between two strings (dynamic programming, two rows)
fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0usize; b.len() + 1];
    for (i, &ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, &cb) in b.iter().enumerate() {
            let cost = if ca == cb { 0 } else { 1 };
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}
