//! Contracted control flow graph
//!
//! Pairs the simplified graph with the pre-contraction graph and the
//! two-way node-id mapping, so runtime line-hit data recorded against
//! original nodes can be projected onto the contracted graph used for
//! fitness computation.

use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::errors::{Result, TestgenError};
use crate::shared::models::NodeId;

use super::graph::ControlFlowGraph;

/// A contracted graph plus its provenance
#[derive(Debug, Clone)]
pub struct ContractedControlFlowGraph {
    graph: ControlFlowGraph,
    full_graph: Arc<ControlFlowGraph>,
    /// Contracted node id → original node ids merged into it
    node_mapping: FxHashMap<NodeId, Vec<NodeId>>,
    /// Original node id → contracted node id
    reverse_node_mapping: FxHashMap<NodeId, NodeId>,
}

impl ContractedControlFlowGraph {
    /// Wrap a contracted graph, deriving and validating the reverse
    /// mapping: every original id must land in exactly one bucket.
    pub fn new(
        graph: ControlFlowGraph,
        full_graph: Arc<ControlFlowGraph>,
        node_mapping: FxHashMap<NodeId, Vec<NodeId>>,
    ) -> Result<Self> {
        let mut reverse_node_mapping = FxHashMap::default();
        for (contracted, originals) in &node_mapping {
            for original in originals {
                if let Some(previous) =
                    reverse_node_mapping.insert(original.clone(), contracted.clone())
                {
                    return Err(TestgenError::invariant(format!(
                        "original node '{original}' mapped to both '{previous}' and '{contracted}'"
                    )));
                }
            }
        }
        for original in full_graph.nodes() {
            if !reverse_node_mapping.contains_key(&original.id) {
                return Err(TestgenError::invariant(format!(
                    "original node '{}' missing from contraction mapping",
                    original.id
                )));
            }
        }
        Ok(Self {
            graph,
            full_graph,
            node_mapping,
            reverse_node_mapping,
        })
    }

    /// The simplified graph
    pub fn graph(&self) -> &ControlFlowGraph {
        &self.graph
    }

    /// The graph before contraction
    pub fn full_graph(&self) -> &Arc<ControlFlowGraph> {
        &self.full_graph
    }

    /// Original node ids merged into the given contracted node
    pub fn originals_of(&self, contracted: &str) -> Option<&[NodeId]> {
        self.node_mapping.get(contracted).map(Vec::as_slice)
    }

    /// Contracted node id the given original node was merged into
    pub fn contracted_of(&self, original: &str) -> Option<&NodeId> {
        self.reverse_node_mapping.get(original)
    }

    pub fn node_mapping(&self) -> &FxHashMap<NodeId, Vec<NodeId>> {
        &self.node_mapping
    }

    pub fn reverse_node_mapping(&self) -> &FxHashMap<NodeId, NodeId> {
        &self.reverse_node_mapping
    }
}
