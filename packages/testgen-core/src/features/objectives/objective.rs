//! Objective functions
//!
//! An objective is one coverage target: a branch polarity, a function, a
//! path, or an exception site. Each variant folds approach level and
//! branch distance (or a direct hit/miss) into a single scalar the search
//! minimizes; 0 means covered.

use std::sync::Arc;

use rustc_hash::FxHashSet;

use crate::errors::{Result, TestgenError};
use crate::features::cfg::{ContractedControlFlowGraph, ControlFlowGraph};
use crate::features::fitness::{approach_level, branch_distance};
use crate::shared::models::{ExecutionResult, NodeId, Trace, TraceKind};

/// Objective identifier, unique within a search run
pub type ObjectiveId = String;

/// Objective kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectiveKind {
    Branch,
    Function,
    Path,
    Exception,
}

/// One coverage target
pub trait ObjectiveFunction: std::fmt::Debug + Send + Sync {
    fn id(&self) -> &ObjectiveId;
    fn kind(&self) -> ObjectiveKind;

    /// Distance of the executed encoding to this objective; 0 = covered.
    fn calculate_distance(&self, result: &ExecutionResult) -> Result<f64>;
}

/// Node ids of the contracted graph covered by the execution's hit lines
fn covered_nodes(cfg: &ControlFlowGraph, result: &ExecutionResult) -> FxHashSet<NodeId> {
    cfg.nodes_by_line_numbers(&result.covered_lines())
        .into_iter()
        .map(|n| n.id.clone())
        .collect()
}

/// Distance contributed at a covered decision node: flip whatever arm was
/// taken there. Function-only coverage costs the fixed penalty 1; a hit
/// branch trace without condition metadata is an upstream bug.
fn decision_distance(cfg: &ControlFlowGraph, result: &ExecutionResult, node_id: &str) -> Result<f64> {
    let node = cfg
        .node_by_id(node_id)
        .ok_or_else(|| TestgenError::invariant(format!("node '{node_id}' vanished from graph")))?;

    let mut best: Option<f64> = None;
    for trace in result.hit_traces(TraceKind::Branch) {
        if !node.covers_line(trace.line) {
            continue;
        }
        let taken = trace.branch_type.ok_or_else(|| {
            TestgenError::invariant(format!(
                "branch trace '{}' hit without polarity metadata",
                trace.id
            ))
        })?;
        let ast = trace.condition_ast.as_ref().ok_or_else(|| {
            TestgenError::invariant(format!(
                "branch trace '{}' hit without condition metadata",
                trace.id
            ))
        })?;
        let d = branch_distance(ast, &trace.variables, !taken)?;
        best = Some(match best {
            Some(b) => b.min(d),
            None => d,
        });
    }
    // No branch trace at all: the node was only entered through its
    // function probe.
    Ok(best.unwrap_or(1.0))
}

/// Branch-coverage objective: reach a branch node and take one arm.
#[derive(Debug, Clone)]
pub struct BranchObjective {
    id: ObjectiveId,
    cfg: Arc<ContractedControlFlowGraph>,
    node_id: NodeId,
    polarity: bool,
}

impl BranchObjective {
    pub fn new(cfg: Arc<ContractedControlFlowGraph>, node_id: impl Into<NodeId>, polarity: bool) -> Self {
        let node_id = node_id.into();
        Self {
            id: format!("branch:{node_id}:{polarity}"),
            cfg,
            node_id,
            polarity,
        }
    }

    pub fn node_id(&self) -> &NodeId {
        &self.node_id
    }

    pub fn polarity(&self) -> bool {
        self.polarity
    }

    /// Upper bound on any reachable fitness value; returned when no covered
    /// node is backward-reachable from the target (the `None` sentinel of
    /// the approach-level computation).
    fn miss_distance(&self) -> f64 {
        (self.cfg.graph().node_count() + 1) as f64
    }

    /// Branch traces recorded against this node's lines
    fn node_traces<'r>(&self, result: &'r ExecutionResult) -> Vec<&'r Trace> {
        let node = match self.cfg.graph().node_by_id(&self.node_id) {
            Some(n) => n,
            None => return Vec::new(),
        };
        result
            .traces()
            .iter()
            .filter(|t| t.kind == TraceKind::Branch && node.covers_line(t.line))
            .collect()
    }
}

impl ObjectiveFunction for BranchObjective {
    fn id(&self) -> &ObjectiveId {
        &self.id
    }

    fn kind(&self) -> ObjectiveKind {
        ObjectiveKind::Branch
    }

    fn calculate_distance(&self, result: &ExecutionResult) -> Result<f64> {
        let traces = self.node_traces(result);

        // Hit with the matching polarity: fully covered.
        if traces
            .iter()
            .any(|t| t.hit() && t.branch_type == Some(self.polarity))
        {
            return Ok(0.0);
        }

        // Hit with the opposite polarity: the decision point was reached,
        // only the condition needs to move.
        if let Some(opposite) = traces
            .iter()
            .find(|t| t.hit() && t.branch_type == Some(!self.polarity))
        {
            let ast = opposite.condition_ast.as_ref().ok_or_else(|| {
                TestgenError::invariant(format!(
                    "branch trace '{}' hit without condition metadata",
                    opposite.id
                ))
            })?;
            return branch_distance(ast, &opposite.variables, self.polarity);
        }

        // Not reached: walk the graph back to the nearest covered node.
        let covered = covered_nodes(self.cfg.graph(), result);
        match approach_level(self.cfg.graph(), &self.node_id, &covered)? {
            Some(closest) => {
                let local =
                    decision_distance(self.cfg.graph(), result, &closest.closest_covered_node)?;
                Ok(closest.approach_level as f64 + local)
            }
            None => Ok(self.miss_distance()),
        }
    }
}

/// Function-coverage objective: enter the function at all.
#[derive(Debug, Clone)]
pub struct FunctionObjective {
    id: ObjectiveId,
    function_id: String,
}

impl FunctionObjective {
    pub fn new(function_id: impl Into<String>) -> Self {
        let function_id = function_id.into();
        Self {
            id: format!("function:{function_id}"),
            function_id,
        }
    }
}

impl ObjectiveFunction for FunctionObjective {
    fn id(&self) -> &ObjectiveId {
        &self.id
    }

    fn kind(&self) -> ObjectiveKind {
        ObjectiveKind::Function
    }

    fn calculate_distance(&self, result: &ExecutionResult) -> Result<f64> {
        let entered = result
            .hit_traces(TraceKind::Function)
            .any(|t| t.id == self.function_id);
        Ok(if entered { 0.0 } else { 1.0 })
    }
}

/// Path-coverage objective: execute a specific node sequence.
#[derive(Debug, Clone)]
pub struct PathObjective {
    id: ObjectiveId,
    cfg: Arc<ContractedControlFlowGraph>,
    path: Vec<NodeId>,
}

impl PathObjective {
    pub fn new(cfg: Arc<ContractedControlFlowGraph>, path_id: impl Into<String>, path: Vec<NodeId>) -> Self {
        Self {
            id: format!("path:{}", path_id.into()),
            cfg,
            path,
        }
    }
}

impl ObjectiveFunction for PathObjective {
    fn id(&self) -> &ObjectiveId {
        &self.id
    }

    fn kind(&self) -> ObjectiveKind {
        ObjectiveKind::Path
    }

    fn calculate_distance(&self, result: &ExecutionResult) -> Result<f64> {
        let covered = covered_nodes(self.cfg.graph(), result);
        let prefix = self
            .path
            .iter()
            .take_while(|id| covered.contains(*id))
            .count();
        let remaining = self.path.len() - prefix;
        if remaining == 0 {
            return Ok(0.0);
        }
        // Deviation cost at the deepest covered decision node of the path,
        // same shape as the branch-objective fitness.
        let local = if prefix > 0 {
            decision_distance(self.cfg.graph(), result, &self.path[prefix - 1])?
        } else {
            1.0
        };
        Ok(remaining as f64 + local)
    }
}

/// Exception objective: make the function raise.
#[derive(Debug, Clone)]
pub struct ExceptionObjective {
    id: ObjectiveId,
    function_id: String,
}

impl ExceptionObjective {
    pub fn new(function_id: impl Into<String>) -> Self {
        let function_id = function_id.into();
        Self {
            id: format!("exception:{function_id}"),
            function_id,
        }
    }
}

impl ObjectiveFunction for ExceptionObjective {
    fn id(&self) -> &ObjectiveId {
        &self.id
    }

    fn kind(&self) -> ObjectiveKind {
        ObjectiveKind::Exception
    }

    fn calculate_distance(&self, result: &ExecutionResult) -> Result<f64> {
        let entered = result
            .hit_traces(TraceKind::Function)
            .any(|t| t.id == self.function_id);
        Ok(if entered && result.has_error() { 0.0 } else { 1.0 })
    }
}
