//! Search listeners
//!
//! Observation hooks for the search loop. Every method has a no-op
//! default; embedders implement only what they care about (progress bars,
//! coverage logs, telemetry).

use crate::features::objectives::{CoverageSummary, ObjectiveId};

/// Milestone callbacks fired by a search algorithm
pub trait SearchListener: std::fmt::Debug + Send {
    /// Search started; fired before initialization.
    fn on_search_start(&mut self) {}

    /// Initial population sampled and evaluated
    fn on_initialization_done(&mut self, _evaluations: u64) {}

    /// One iteration (generation) finished
    fn on_iteration_complete(&mut self, _iteration: u64, _coverage: &CoverageSummary) {}

    /// An objective reached distance 0 for the first time
    fn on_objective_covered(&mut self, _objective: &ObjectiveId) {}

    /// Search terminated; final coverage attached.
    fn on_search_complete(&mut self, _coverage: &CoverageSummary) {}
}
