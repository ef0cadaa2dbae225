//! Runtime coverage traces
//!
//! The external runner executes an encoding against the instrumented target
//! and reports back one `Trace` per instrumentation point, wrapped in an
//! `ExecutionResult`. The core never inspects the target itself; these
//! structures are its only view of runtime behavior.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::condition::ConditionNode;

/// Instrumentation point kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TraceKind {
    Branch,
    Function,
    Probe,
    Statement,
}

/// One instrumentation point observation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trace {
    /// Instrumentation point id
    pub id: String,
    /// Kind of instrumentation point
    #[serde(rename = "type")]
    pub kind: TraceKind,
    /// Source line the point maps onto
    pub line: u32,
    /// For branch traces: the polarity this record counts (true/false arm)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch_type: Option<bool>,
    /// Number of times the point was hit during execution
    pub hits: u64,
    /// Source text of the guarding condition, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    /// Parsed condition expression tree, if captured
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition_ast: Option<ConditionNode>,
    /// Variable values captured at the decision point
    #[serde(default)]
    pub variables: FxHashMap<String, Value>,
}

impl Trace {
    pub fn hit(&self) -> bool {
        self.hits > 0
    }
}

/// Error raised inside the candidate under test
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionError {
    /// Error message reported by the runner
    pub message: String,
    /// Line the error surfaced on, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
}

/// Outcome of executing one encoding
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ExecutionResult {
    traces: Vec<Trace>,
    error: Option<ExecutionError>,
}

impl ExecutionResult {
    pub fn new(traces: Vec<Trace>) -> Self {
        Self {
            traces,
            error: None,
        }
    }

    /// Result of an execution that raised inside the candidate
    pub fn with_error(traces: Vec<Trace>, error: ExecutionError) -> Self {
        Self {
            traces,
            error: Some(error),
        }
    }

    /// Result of a crashed or timed-out execution: no traces, an error.
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            traces: Vec::new(),
            error: Some(ExecutionError {
                message: message.into(),
                line: None,
            }),
        }
    }

    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }

    pub fn error(&self) -> Option<&ExecutionError> {
        self.error.as_ref()
    }

    pub fn traces(&self) -> &[Trace] {
        &self.traces
    }

    /// Traces of one kind that were actually hit
    pub fn hit_traces(&self, kind: TraceKind) -> impl Iterator<Item = &Trace> {
        self.traces
            .iter()
            .filter(move |t| t.kind == kind && t.hit())
    }

    /// Source lines touched by any hit trace
    pub fn covered_lines(&self) -> Vec<u32> {
        let mut lines: Vec<u32> = self
            .traces
            .iter()
            .filter(|t| t.hit())
            .map(|t| t.line)
            .collect();
        lines.sort_unstable();
        lines.dedup();
        lines
    }
}
