//! Control-flow-graph node model
//!
//! Nodes are basic blocks carrying the statements merged into them and the
//! source line numbers the instrumentation reports hits against.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Node identifier, unique within one graph
pub type NodeId = String;

/// Node kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeType {
    Entry,
    Exit,
    Normal,
    Branch,
    Placeholder,
    Root,
}

/// Single location in source code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct Location {
    pub line: u32,
    pub column: u32,
}

impl Location {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

/// Statement inside a basic block
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Statement {
    /// Unique statement id
    pub id: String,
    /// Source location of the statement
    #[serde(default)]
    pub location: Location,
    /// Opaque language-specific payload (AST excerpt, raw text, ...)
    #[serde(default)]
    pub payload: Value,
}

/// Node metadata: the line numbers instrumentation maps onto this node,
/// plus extensible key-value pairs.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct NodeMetadata {
    #[serde(default)]
    pub line_numbers: Vec<u32>,
    #[serde(default, flatten)]
    pub extra: FxHashMap<String, Value>,
}

/// Basic-block node of a control flow graph
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    /// Unique node id
    pub id: NodeId,
    /// Node kind
    #[serde(rename = "type")]
    pub node_type: NodeType,
    /// Human-readable label
    #[serde(default)]
    pub label: String,
    /// Statements merged into this block, in execution order
    #[serde(default)]
    pub statements: Vec<Statement>,
    /// Line numbers and extensible metadata
    #[serde(default)]
    pub metadata: NodeMetadata,
}

impl Node {
    /// Create a node without statements or metadata
    pub fn new(id: impl Into<NodeId>, node_type: NodeType) -> Self {
        Self {
            id: id.into(),
            node_type,
            label: String::new(),
            statements: Vec::new(),
            metadata: NodeMetadata::default(),
        }
    }

    /// Create a node covering the given source lines
    pub fn with_lines(id: impl Into<NodeId>, node_type: NodeType, lines: Vec<u32>) -> Self {
        let mut node = Self::new(id, node_type);
        node.metadata.line_numbers = lines;
        node
    }

    /// Whether this node covers the given source line
    pub fn covers_line(&self, line: u32) -> bool {
        self.metadata.line_numbers.contains(&line)
    }
}
