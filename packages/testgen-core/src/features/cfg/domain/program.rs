//! Whole-program control flow model
//!
//! One `ControlFlowProgram` per analyzed source file: the program-level
//! graph plus one graph per function.

use crate::shared::models::NodeId;

use super::graph::ControlFlowGraph;

/// Per-function control flow graph
#[derive(Debug, Clone)]
pub struct FunctionGraph {
    /// Stable function id (instrumentation references it)
    pub id: String,
    /// Function name as it appears in source
    pub name: String,
    pub graph: ControlFlowGraph,
}

/// Control flow of one analyzed unit
#[derive(Debug, Clone)]
pub struct ControlFlowProgram {
    /// Whole-program graph
    pub graph: ControlFlowGraph,
    /// Per-function graphs
    pub functions: Vec<FunctionGraph>,
}

impl ControlFlowProgram {
    pub fn new(graph: ControlFlowGraph, functions: Vec<FunctionGraph>) -> Self {
        Self { graph, functions }
    }

    pub fn function_by_id(&self, id: &str) -> Option<&FunctionGraph> {
        self.functions.iter().find(|f| f.id == id)
    }

    pub fn function_by_name(&self, name: &str) -> Option<&FunctionGraph> {
        self.functions.iter().find(|f| f.name == name)
    }

    /// Function whose graph contains the given node
    pub fn function_containing(&self, node_id: &NodeId) -> Option<&FunctionGraph> {
        self.functions.iter().find(|f| f.graph.contains_node(node_id))
    }
}
