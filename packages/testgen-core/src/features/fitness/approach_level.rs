//! Approach level
//!
//! Graph distance from a target node back to the nearest node the current
//! execution already covered: the number of control-decision points the
//! search still has to get through. Computed over a rotated (reversed)
//! adjacency list; edges leaving placeholder nodes weigh 0, everything
//! else weighs 1, so synthetic structure never inflates the level.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::errors::{Result, TestgenError};
use crate::features::cfg::ControlFlowGraph;
use crate::shared::models::{NodeId, NodeType};

/// Nearest covered node and the accumulated weight to reach it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClosestCovered {
    pub approach_level: u64,
    pub closest_covered_node: NodeId,
}

/// Compute the approach level from `target` to the covered set.
///
/// Returns `None` when no covered node is reachable backwards from the
/// target; all callers treat `None` as the miss sentinel. Back-edges give
/// the rotated graph non-uniform weights, so the frontier is ordered by
/// accumulated weight (Dijkstra-style) rather than plain BFS depth.
pub fn approach_level(
    cfg: &ControlFlowGraph,
    target: &str,
    covered: &FxHashSet<NodeId>,
) -> Result<Option<ClosestCovered>> {
    if !cfg.contains_node(target) {
        return Err(TestgenError::invariant(format!(
            "approach-level target '{target}' is not in the graph"
        )));
    }

    // Rotated adjacency: child -> [(parent, weight)]
    let mut rotated: FxHashMap<&str, Vec<(&str, u64)>> = FxHashMap::default();
    for edge in cfg.edges() {
        let weight = match cfg.node_by_id(&edge.source).map(|n| n.node_type) {
            Some(NodeType::Placeholder) => 0,
            _ => 1,
        };
        rotated
            .entry(edge.target.as_str())
            .or_default()
            .push((edge.source.as_str(), weight));
    }

    // (weight, tie-break sequence, node); sequence keeps the pop order
    // deterministic between equal-weight frontier entries.
    let mut heap: BinaryHeap<Reverse<(u64, u64, &str)>> = BinaryHeap::new();
    let mut best: FxHashMap<&str, u64> = FxHashMap::default();
    let mut seq: u64 = 0;

    heap.push(Reverse((0, seq, target)));
    best.insert(target, 0);

    while let Some(Reverse((dist, _, node))) = heap.pop() {
        if dist > *best.get(node).unwrap_or(&u64::MAX) {
            continue;
        }
        if covered.contains(node) {
            return Ok(Some(ClosestCovered {
                approach_level: dist,
                closest_covered_node: node.to_string(),
            }));
        }
        if let Some(parents) = rotated.get(node) {
            for &(parent, weight) in parents {
                let next = dist + weight;
                if next < *best.get(parent).unwrap_or(&u64::MAX) {
                    best.insert(parent, next);
                    seq += 1;
                    heap.push(Reverse((next, seq, parent)));
                }
            }
        }
    }
    Ok(None)
}
