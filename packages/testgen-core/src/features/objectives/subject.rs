//! Search subject
//!
//! The declared objectives of one unit under test, plus the structural
//! dependencies between branch objectives the DynaMOSA-style manager
//! uses: a child objective only becomes interesting once the decision
//! node controlling it has been covered.

use std::collections::VecDeque;
use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::errors::Result;
use crate::features::cfg::{contract, ControlFlowGraph, ControlFlowProgram};
use crate::shared::models::{EdgeType, NodeId, NodeType};

use super::objective::{
    BranchObjective, ExceptionObjective, FunctionObjective, ObjectiveFunction, ObjectiveId,
};

/// Declared objectives of one test subject
#[derive(Debug, Clone, Default)]
pub struct SearchSubject {
    objectives: Vec<Arc<dyn ObjectiveFunction>>,
    /// Objectives exposed from the start under the structural strategy
    roots: Vec<ObjectiveId>,
    /// Parent objective → objectives it structurally gates
    dependencies: FxHashMap<ObjectiveId, Vec<ObjectiveId>>,
}

impl SearchSubject {
    /// Flat subject: every objective is a root, no structure.
    pub fn new(objectives: Vec<Arc<dyn ObjectiveFunction>>) -> Self {
        let roots = objectives.iter().map(|o| o.id().clone()).collect();
        Self {
            objectives,
            roots,
            dependencies: FxHashMap::default(),
        }
    }

    /// Subject with an explicit dependency structure
    pub fn with_structure(
        objectives: Vec<Arc<dyn ObjectiveFunction>>,
        roots: Vec<ObjectiveId>,
        dependencies: FxHashMap<ObjectiveId, Vec<ObjectiveId>>,
    ) -> Self {
        Self {
            objectives,
            roots,
            dependencies,
        }
    }

    /// Derive branch, function, and exception objectives from a program's
    /// per-function graphs. Each function graph is contracted first; branch
    /// objectives target contracted branch nodes, and dependencies follow
    /// the contracted control flow.
    pub fn from_program(program: &ControlFlowProgram) -> Result<Self> {
        let mut objectives: Vec<Arc<dyn ObjectiveFunction>> = Vec::new();
        let mut roots: Vec<ObjectiveId> = Vec::new();
        let mut dependencies: FxHashMap<ObjectiveId, Vec<ObjectiveId>> = FxHashMap::default();

        for function in &program.functions {
            let function_objective = Arc::new(FunctionObjective::new(function.id.clone()));
            roots.push(function_objective.id().clone());
            objectives.push(function_objective);

            let exception_objective = Arc::new(ExceptionObjective::new(function.id.clone()));
            roots.push(exception_objective.id().clone());
            objectives.push(exception_objective);

            let contracted = Arc::new(contract(Arc::new(function.graph.clone()))?);
            let graph = contracted.graph();

            let branch_nodes: Vec<NodeId> = graph
                .nodes_by_type(NodeType::Branch)
                .into_iter()
                .filter(|n| has_polarity_arms(graph, &n.id))
                .map(|n| n.id.clone())
                .collect();

            for node_id in &branch_nodes {
                for polarity in [true, false] {
                    let objective =
                        Arc::new(BranchObjective::new(contracted.clone(), node_id.clone(), polarity));
                    objectives.push(objective);
                }
            }

            // Roots: branch nodes reachable from the entry without crossing
            // another branch node.
            for node_id in frontier_branches(graph, graph.entry(), &branch_nodes) {
                for polarity in [true, false] {
                    roots.push(format!("branch:{node_id}:{polarity}"));
                }
            }

            // Dependencies: each polarity arm gates the next layer of
            // branch nodes downstream of it.
            for node_id in &branch_nodes {
                for edge in graph.outgoing_edges(node_id) {
                    let polarity = match edge.edge_type {
                        EdgeType::True => true,
                        EdgeType::False => false,
                        _ => continue,
                    };
                    let parent = format!("branch:{node_id}:{polarity}");
                    let mut children = Vec::new();
                    for child in frontier_branches(graph, &edge.target, &branch_nodes) {
                        if &child == node_id {
                            continue;
                        }
                        children.push(format!("branch:{child}:true"));
                        children.push(format!("branch:{child}:false"));
                    }
                    if !children.is_empty() {
                        dependencies.insert(parent, children);
                    }
                }
            }
        }

        Ok(Self {
            objectives,
            roots,
            dependencies,
        })
    }

    pub fn objectives(&self) -> &[Arc<dyn ObjectiveFunction>] {
        &self.objectives
    }

    pub fn roots(&self) -> &[ObjectiveId] {
        &self.roots
    }

    pub fn dependencies(&self) -> &FxHashMap<ObjectiveId, Vec<ObjectiveId>> {
        &self.dependencies
    }
}

/// Whether a node has true/false outgoing arms
fn has_polarity_arms(graph: &ControlFlowGraph, node_id: &str) -> bool {
    graph
        .outgoing_edges(node_id)
        .iter()
        .any(|e| matches!(e.edge_type, EdgeType::True | EdgeType::False))
}

/// Branch nodes reachable from `start` without passing through another
/// branch node. `start` itself counts when it is a branch node.
fn frontier_branches(
    graph: &ControlFlowGraph,
    start: &str,
    branch_nodes: &[NodeId],
) -> Vec<NodeId> {
    let is_branch = |id: &str| branch_nodes.iter().any(|b| b == id);
    let mut found = Vec::new();
    let mut visited: FxHashSet<String> = FxHashSet::default();
    let mut queue: VecDeque<String> = VecDeque::new();
    queue.push_back(start.to_string());
    visited.insert(start.to_string());

    while let Some(id) = queue.pop_front() {
        if is_branch(&id) {
            found.push(id);
            continue;
        }
        for edge in graph.outgoing_edges(&id) {
            if visited.insert(edge.target.clone()) {
                queue.push_back(edge.target.clone());
            }
        }
    }
    found
}
