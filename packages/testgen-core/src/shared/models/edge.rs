//! Control-flow-graph edge model

use serde::{Deserialize, Serialize};

use super::node::NodeId;

/// Edge kind (control flow edge types)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EdgeType {
    /// Sequential execution (fall-through)
    Normal,
    /// Exception handler edge
    Exception,
    /// True branch of a conditional
    True,
    /// False branch of a conditional
    False,
    /// Loop back edge
    BackEdge,
    /// Edge whose removal would change branch semantics
    CriticalEdge,
    /// Abnormal control transfer (break, continue, return)
    AbnormalEdge,
    /// Statically infeasible edge kept for structural completeness
    ImpossibleEdge,
}

/// Directed edge between two basic blocks
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    /// Unique edge id
    pub id: String,
    /// Edge kind
    #[serde(rename = "type")]
    pub edge_type: EdgeType,
    /// Source node id
    pub source: NodeId,
    /// Target node id
    pub target: NodeId,
    /// Human-readable label
    #[serde(default)]
    pub label: String,
    /// Optional free-form description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Edge {
    pub fn new(
        id: impl Into<String>,
        edge_type: EdgeType,
        source: impl Into<NodeId>,
        target: impl Into<NodeId>,
    ) -> Self {
        Self {
            id: id.into(),
            edge_type,
            source: source.into(),
            target: target.into(),
            label: String::new(),
            description: None,
        }
    }
}
