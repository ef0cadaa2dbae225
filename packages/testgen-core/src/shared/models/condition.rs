//! Boolean-condition expression trees
//!
//! Serialized form of the guard expression captured at a branch
//! instrumentation point. Branch distance is computed by recursively
//! evaluating this tree against the captured variable values.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Comparison operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CompareOp {
    Eq,
    Neq,
    Lt,
    Leq,
    Gt,
    Geq,
}

/// Logical connective
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LogicalOp {
    And,
    Or,
}

/// Unary operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UnaryOp {
    Not,
}

/// Condition expression node
///
/// Tagged-enum wire shape: `{"kind": "binary", "op": "lt", ...}`.
/// Literals, identifiers, and member lookups resolve directly to values;
/// comparisons and logicals resolve to distances.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ConditionNode {
    Literal {
        value: Value,
    },
    Identifier {
        name: String,
    },
    Member {
        object: Box<ConditionNode>,
        property: String,
    },
    Unary {
        op: UnaryOp,
        operand: Box<ConditionNode>,
    },
    Binary {
        op: CompareOp,
        left: Box<ConditionNode>,
        right: Box<ConditionNode>,
    },
    Logical {
        op: LogicalOp,
        left: Box<ConditionNode>,
        right: Box<ConditionNode>,
    },
}

impl ConditionNode {
    pub fn literal(value: impl Into<Value>) -> Self {
        ConditionNode::Literal {
            value: value.into(),
        }
    }

    pub fn identifier(name: impl Into<String>) -> Self {
        ConditionNode::Identifier { name: name.into() }
    }

    pub fn binary(op: CompareOp, left: ConditionNode, right: ConditionNode) -> Self {
        ConditionNode::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn logical(op: LogicalOp, left: ConditionNode, right: ConditionNode) -> Self {
        ConditionNode::Logical {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn not(operand: ConditionNode) -> Self {
        ConditionNode::Unary {
            op: UnaryOp::Not,
            operand: Box::new(operand),
        }
    }
}
