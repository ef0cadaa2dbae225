//! Shared models

mod condition;
mod edge;
mod node;
mod trace;

pub use condition::{CompareOp, ConditionNode, LogicalOp, UnaryOp};
pub use edge::{Edge, EdgeType};
pub use node::{Location, Node, NodeId, NodeMetadata, NodeType, Statement};
pub use trace::{ExecutionError, ExecutionResult, Trace, TraceKind};

// Re-export serde_json::Value for convenience (used by Statement payloads
// and captured variables)
pub use serde_json::Value;
