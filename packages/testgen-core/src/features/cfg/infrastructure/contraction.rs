//! Edge contraction
//!
//! Repeatedly merges singly-connected node pairs (one edge out of `u`, one
//! edge into `v`) into a single node, keeping `u`'s id. Instrumentation
//! places branch-coverage probes on the first node of a merged pair, so the
//! id convention is load-bearing: downstream trace-to-node mapping breaks
//! if the second id wins.

use std::collections::VecDeque;
use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;

use crate::errors::{Result, TestgenError};
use crate::shared::models::{Edge, Node, NodeId};

use super::super::domain::{ContractedControlFlowGraph, ControlFlowGraph};

/// Mutable working state during contraction
struct Workspace {
    nodes: FxHashMap<NodeId, Node>,
    /// Original node insertion order, for a reproducible rebuild
    node_order: Vec<NodeId>,
    edges: Vec<Edge>,
    mapping: FxHashMap<NodeId, Vec<NodeId>>,
}

impl Workspace {
    fn from_graph(graph: &ControlFlowGraph) -> Self {
        let mut nodes = FxHashMap::default();
        let mut node_order = Vec::new();
        let mut mapping = FxHashMap::default();
        for node in graph.nodes() {
            nodes.insert(node.id.clone(), node.clone());
            node_order.push(node.id.clone());
            mapping.insert(node.id.clone(), vec![node.id.clone()]);
        }
        let edges = graph.edges().cloned().collect();
        Self {
            nodes,
            node_order,
            edges,
            mapping,
        }
    }

    fn out_degree(&self, id: &str) -> usize {
        self.edges.iter().filter(|e| e.source == id).count()
    }

    fn in_degree(&self, id: &str) -> usize {
        self.edges.iter().filter(|e| e.target == id).count()
    }

    fn outgoing<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges.iter().filter(move |e| e.source == id)
    }
}

/// Contract the graph and wrap the result with its id mapping.
pub fn contract(full_graph: Arc<ControlFlowGraph>) -> Result<ContractedControlFlowGraph> {
    let mut ws = Workspace::from_graph(&full_graph);
    let initial_nodes = ws.nodes.len();
    let initial_edges = ws.edges.len();

    while let Some((u, v)) = find_contractible(&ws, &full_graph) {
        merge_pair(&mut ws, &u, &v)?;
    }

    // Malformed analysis output can leave contractible pairs the BFS never
    // reaches (components detached from the entry). That is an upstream
    // bug, not something to silently accept.
    if let Some((u, v)) = scan_contractible(&ws, &full_graph) {
        return Err(TestgenError::invariant(format!(
            "contraction post-condition violated: pair ({u}, {v}) still contractible"
        )));
    }

    debug!(
        nodes_before = initial_nodes,
        nodes_after = ws.nodes.len(),
        edges_before = initial_edges,
        edges_after = ws.edges.len(),
        "edge contraction finished"
    );

    let nodes: Vec<Node> = ws
        .node_order
        .iter()
        .filter_map(|id| ws.nodes.get(id).cloned())
        .collect();
    let contracted = ControlFlowGraph::new(
        full_graph.entry().clone(),
        full_graph.success_exit().clone(),
        full_graph.error_exit().clone(),
        nodes,
        ws.edges,
    )?;
    ContractedControlFlowGraph::new(contracted, full_graph, ws.mapping)
}

/// Whether `(u, v)` may be merged: one edge out of `u`, one edge into `v`,
/// neither endpoint an entry/exit node, no self loop.
fn contractible(ws: &Workspace, graph: &ControlFlowGraph, u: &str, v: &str) -> bool {
    u != v
        && !graph.is_boundary(u)
        && !graph.is_boundary(v)
        && ws.out_degree(u) == 1
        && ws.in_degree(v) == 1
}

/// Breadth-first search from the entry's outgoing edges for the next
/// contractible pair.
fn find_contractible(ws: &Workspace, graph: &ControlFlowGraph) -> Option<(NodeId, NodeId)> {
    let mut queue: VecDeque<(NodeId, NodeId)> = ws
        .outgoing(graph.entry())
        .map(|e| (e.source.clone(), e.target.clone()))
        .collect();
    let mut visited: FxHashSet<NodeId> = FxHashSet::default();
    visited.insert(graph.entry().clone());

    while let Some((u, v)) = queue.pop_front() {
        if contractible(ws, graph, &u, &v) {
            return Some((u, v));
        }
        if visited.insert(v.clone()) {
            for next in ws.outgoing(&v) {
                queue.push_back((next.source.clone(), next.target.clone()));
            }
        }
    }
    None
}

/// Full-graph scan with the same predicate, for the post-condition check.
fn scan_contractible(ws: &Workspace, graph: &ControlFlowGraph) -> Option<(NodeId, NodeId)> {
    ws.edges
        .iter()
        .find(|e| contractible(ws, graph, &e.source, &e.target))
        .map(|e| (e.source.clone(), e.target.clone()))
}

/// Merge `v` into `u`. Exactly one node and one edge must disappear.
fn merge_pair(ws: &mut Workspace, u: &str, v: &str) -> Result<()> {
    let nodes_before = ws.nodes.len();
    let edges_before = ws.edges.len();

    let absorbed = ws
        .nodes
        .remove(v)
        .ok_or_else(|| TestgenError::invariant(format!("merge target '{v}' not in graph")))?;

    {
        let merged = ws
            .nodes
            .get_mut(u)
            .ok_or_else(|| TestgenError::invariant(format!("merge source '{u}' not in graph")))?;
        merged.statements.extend(absorbed.statements);
        merged
            .metadata
            .line_numbers
            .extend(absorbed.metadata.line_numbers);
        for (key, value) in absorbed.metadata.extra {
            merged.metadata.extra.entry(key).or_insert(value);
        }
    }

    // Drop the contracted edge, redirect everything else that touched v.
    ws.edges.retain(|e| !(e.source == u && e.target == v));
    for edge in &mut ws.edges {
        if edge.source == v {
            edge.source = u.to_string();
        }
        if edge.target == v {
            edge.target = u.to_string();
        }
    }

    let bucket = ws.mapping.remove(v).ok_or_else(|| {
        TestgenError::invariant(format!("merge target '{v}' missing from id mapping"))
    })?;
    ws.mapping
        .get_mut(u)
        .ok_or_else(|| TestgenError::invariant(format!("merge source '{u}' missing from id mapping")))?
        .extend(bucket);

    if ws.nodes.len() != nodes_before - 1 || ws.edges.len() != edges_before - 1 {
        return Err(TestgenError::invariant(format!(
            "contraction step removed {} nodes and {} edges, expected exactly 1 and 1",
            nodes_before - ws.nodes.len(),
            edges_before - ws.edges.len()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::models::{EdgeType, NodeType};

    fn graph(nodes: Vec<Node>, edges: Vec<Edge>) -> Arc<ControlFlowGraph> {
        Arc::new(ControlFlowGraph::new("entry", "exit", "error", nodes, edges).unwrap())
    }

    fn base_nodes() -> Vec<Node> {
        vec![
            Node::new("entry", NodeType::Entry),
            Node::new("exit", NodeType::Exit),
            Node::new("error", NodeType::Exit),
        ]
    }

    fn chain_graph() -> Arc<ControlFlowGraph> {
        let mut nodes = base_nodes();
        nodes.push(Node::with_lines("n1", NodeType::Normal, vec![1]));
        nodes.push(Node::with_lines("n2", NodeType::Normal, vec![2]));
        nodes.push(Node::with_lines("n3", NodeType::Normal, vec![3]));
        let edges = vec![
            Edge::new("e0", EdgeType::Normal, "entry", "n1"),
            Edge::new("e1", EdgeType::Normal, "n1", "n2"),
            Edge::new("e2", EdgeType::Normal, "n2", "n3"),
            Edge::new("e3", EdgeType::Normal, "n3", "exit"),
        ];
        graph(nodes, edges)
    }

    #[test]
    fn chain_collapses_to_first_id() {
        let full = chain_graph();
        let contracted = contract(full.clone()).unwrap();
        let g = contracted.graph();

        // n1, n2, n3 merged into n1; entry/exit/error untouched
        assert_eq!(g.node_count(), 4);
        assert_eq!(g.edge_count(), 2);
        let merged = g.node_by_id("n1").expect("merged node keeps first id");
        assert_eq!(merged.metadata.line_numbers, vec![1, 2, 3]);
        assert!(g.node_by_id("n2").is_none());
        assert!(g.node_by_id("n3").is_none());
    }

    #[test]
    fn each_step_removes_one_node_and_one_edge() {
        let full = chain_graph();
        let mut ws = Workspace::from_graph(&full);
        let (u, v) = find_contractible(&ws, &full).unwrap();
        let (n, e) = (ws.nodes.len(), ws.edges.len());
        merge_pair(&mut ws, &u, &v).unwrap();
        assert_eq!(ws.nodes.len(), n - 1);
        assert_eq!(ws.edges.len(), e - 1);
    }

    #[test]
    fn mapping_consistency() {
        let full = chain_graph();
        let contracted = contract(full.clone()).unwrap();
        for original in full.nodes() {
            let bucket_owner = contracted
                .contracted_of(&original.id)
                .expect("every original id mapped");
            let bucket = contracted.originals_of(bucket_owner).unwrap();
            assert_eq!(
                bucket.iter().filter(|id| **id == original.id).count(),
                1,
                "original id {} must appear exactly once",
                original.id
            );
        }
    }

    #[test]
    fn branch_points_are_preserved() {
        let mut nodes = base_nodes();
        nodes.push(Node::new("a", NodeType::Branch));
        nodes.push(Node::new("b", NodeType::Normal));
        nodes.push(Node::new("c", NodeType::Normal));
        let edges = vec![
            Edge::new("e0", EdgeType::Normal, "entry", "a"),
            Edge::new("e1", EdgeType::True, "a", "b"),
            Edge::new("e2", EdgeType::False, "a", "c"),
            Edge::new("e3", EdgeType::Normal, "b", "exit"),
            Edge::new("e4", EdgeType::Normal, "c", "exit"),
        ];
        let full = graph(nodes, edges);
        let contracted = contract(full.clone()).unwrap();
        // Diamond has no singly-connected interior pair: nothing merges.
        assert_eq!(contracted.graph().node_count(), full.node_count());
        assert_eq!(contracted.graph().edge_count(), full.edge_count());
    }

    #[test]
    fn detached_contractible_pair_is_fatal() {
        let mut nodes = base_nodes();
        nodes.push(Node::new("n1", NodeType::Normal));
        // island is never reached from entry
        nodes.push(Node::new("i1", NodeType::Normal));
        nodes.push(Node::new("i2", NodeType::Normal));
        let edges = vec![
            Edge::new("e0", EdgeType::Normal, "entry", "n1"),
            Edge::new("e1", EdgeType::Normal, "n1", "exit"),
            Edge::new("e2", EdgeType::Normal, "i1", "i2"),
        ];
        let err = contract(graph(nodes, edges)).unwrap_err();
        assert!(err.to_string().contains("post-condition"));
    }

    #[test]
    fn loop_body_contracts_without_losing_back_edge() {
        let mut nodes = base_nodes();
        nodes.push(Node::new("head", NodeType::Branch));
        nodes.push(Node::with_lines("body1", NodeType::Normal, vec![10]));
        nodes.push(Node::with_lines("body2", NodeType::Normal, vec![11]));
        let edges = vec![
            Edge::new("e0", EdgeType::Normal, "entry", "head"),
            Edge::new("e1", EdgeType::True, "head", "body1"),
            Edge::new("e2", EdgeType::Normal, "body1", "body2"),
            Edge::new("e3", EdgeType::BackEdge, "body2", "head"),
            Edge::new("e4", EdgeType::False, "head", "exit"),
        ];
        let contracted = contract(graph(nodes, edges)).unwrap();
        let g = contracted.graph();
        // body1+body2 merge; head keeps both its arms
        assert!(g.node_by_id("body1").is_some());
        assert!(g.node_by_id("body2").is_none());
        let back = g
            .outgoing_edges("body1")
            .into_iter()
            .find(|e| e.edge_type == EdgeType::BackEdge)
            .expect("back edge survives rewrite");
        assert_eq!(back.target, "head");
    }
}
