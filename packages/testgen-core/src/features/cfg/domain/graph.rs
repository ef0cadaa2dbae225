//! Control Flow Graph
//!
//! Arena-style graph: nodes and edges live in a petgraph `DiGraph`,
//! addressed by stable string ids through a side map. Immutable after
//! construction; transformations (reversal, contraction) build a new graph.

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use rustc_hash::FxHashMap;

use crate::errors::{Result, TestgenError};
use crate::shared::models::{Edge, Node, NodeId, NodeType};

/// Immutable control flow graph over basic-block nodes and typed edges
#[derive(Debug, Clone)]
pub struct ControlFlowGraph {
    entry: NodeId,
    success_exit: NodeId,
    error_exit: NodeId,

    /// Node/edge arena
    graph: DiGraph<Node, Edge>,

    /// Node id → arena index
    id_to_index: FxHashMap<NodeId, NodeIndex>,
}

impl ControlFlowGraph {
    /// Construct a graph and validate its invariants: node ids unique,
    /// entry and both exits present, every edge endpoint known.
    pub fn new(
        entry: impl Into<NodeId>,
        success_exit: impl Into<NodeId>,
        error_exit: impl Into<NodeId>,
        nodes: Vec<Node>,
        edges: Vec<Edge>,
    ) -> Result<Self> {
        let entry = entry.into();
        let success_exit = success_exit.into();
        let error_exit = error_exit.into();

        let mut graph = DiGraph::with_capacity(nodes.len(), edges.len());
        let mut id_to_index = FxHashMap::default();

        for node in nodes {
            let id = node.id.clone();
            let index = graph.add_node(node);
            if id_to_index.insert(id.clone(), index).is_some() {
                return Err(TestgenError::invariant(format!(
                    "duplicate node id '{id}'"
                )));
            }
        }

        for marker in [&entry, &success_exit, &error_exit] {
            if !id_to_index.contains_key(marker) {
                return Err(TestgenError::invariant(format!(
                    "entry/exit node '{marker}' is not a member of the graph"
                )));
            }
        }

        for edge in edges {
            let source = *id_to_index.get(&edge.source).ok_or_else(|| {
                TestgenError::invariant(format!(
                    "edge '{}' references unknown source node '{}'",
                    edge.id, edge.source
                ))
            })?;
            let target = *id_to_index.get(&edge.target).ok_or_else(|| {
                TestgenError::invariant(format!(
                    "edge '{}' references unknown target node '{}'",
                    edge.id, edge.target
                ))
            })?;
            graph.add_edge(source, target, edge);
        }

        Ok(Self {
            entry,
            success_exit,
            error_exit,
            graph,
            id_to_index,
        })
    }

    pub fn entry(&self) -> &NodeId {
        &self.entry
    }

    pub fn success_exit(&self) -> &NodeId {
        &self.success_exit
    }

    pub fn error_exit(&self) -> &NodeId {
        &self.error_exit
    }

    /// Whether the id names an entry or exit node
    pub fn is_boundary(&self, id: &str) -> bool {
        self.entry == id || self.success_exit == id || self.error_exit == id
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.id_to_index.contains_key(id)
    }

    pub fn node_by_id(&self, id: &str) -> Option<&Node> {
        self.id_to_index.get(id).map(|&idx| &self.graph[idx])
    }

    /// All nodes, in insertion order
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.graph.node_indices().map(move |idx| &self.graph[idx])
    }

    /// All edges, in insertion order
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.graph.edge_references().map(|e| e.weight())
    }

    /// Nodes of one kind
    pub fn nodes_by_type(&self, node_type: NodeType) -> Vec<&Node> {
        self.nodes().filter(|n| n.node_type == node_type).collect()
    }

    /// Nodes whose metadata covers any of the given source lines
    pub fn nodes_by_line_numbers(&self, lines: &[u32]) -> Vec<&Node> {
        self.nodes()
            .filter(|n| lines.iter().any(|&l| n.covers_line(l)))
            .collect()
    }

    /// Edges arriving at the node, in insertion order
    pub fn incoming_edges(&self, id: &str) -> Vec<&Edge> {
        self.directed_edges(id, Direction::Incoming)
    }

    /// Edges leaving the node, in insertion order
    pub fn outgoing_edges(&self, id: &str) -> Vec<&Edge> {
        self.directed_edges(id, Direction::Outgoing)
    }

    fn directed_edges(&self, id: &str, direction: Direction) -> Vec<&Edge> {
        match self.id_to_index.get(id) {
            Some(&idx) => {
                // petgraph yields most-recently-added first; restore
                // insertion order so traversal stays reproducible.
                let mut edges: Vec<&Edge> = self
                    .graph
                    .edges_directed(idx, direction)
                    .map(|e| e.weight())
                    .collect();
                edges.reverse();
                edges
            }
            None => Vec::new(),
        }
    }

    /// Build the reversed graph: every edge flipped, entry swapped with the
    /// success exit. Used for backward analyses.
    pub fn reverse(&self) -> Result<ControlFlowGraph> {
        let nodes: Vec<Node> = self.nodes().cloned().collect();
        let edges: Vec<Edge> = self
            .edges()
            .map(|e| {
                let mut flipped = e.clone();
                std::mem::swap(&mut flipped.source, &mut flipped.target);
                flipped
            })
            .collect();
        ControlFlowGraph::new(
            self.success_exit.clone(),
            self.entry.clone(),
            self.error_exit.clone(),
            nodes,
            edges,
        )
    }
}
