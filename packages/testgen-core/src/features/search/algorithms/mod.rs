//! Search algorithms
//!
//! The shared driver (objective bookkeeping, budget, listeners, RNG) and
//! the algorithm variants built on top of it. All randomness flows through
//! the driver's single seeded RNG, so a run is a pure function of its
//! configuration and the runner's behavior.

pub mod dominance;
pub mod evolutionary;
pub mod random;

pub use dominance::{
    crowding_distance, dominance_compare, fast_non_dominated_sort, rank_population, tournament,
    Dominance, Ranking,
};
pub use evolutionary::{
    EnvironmentalSelection, EvolutionaryAlgorithm, MosaSelection, Nsga2Selection,
};
pub use random::RandomSearch;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info, warn};

use crate::config::SearchConfig;
use crate::errors::{Result, TestgenError};
use crate::features::objectives::{Archive, CoverageSummary, ObjectiveManager, SearchSubject};
use crate::shared::models::ExecutionResult;

use super::budget::BudgetManager;
use super::events::SearchListener;
use super::ports::{Encoding, EncodingRunner, Individual};
use super::termination::TerminationManager;

/// Lifecycle phase of one search run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchPhase {
    Initializing,
    Running,
    Terminated,
}

/// Everything a finished run hands back to the caller
#[derive(Debug)]
pub struct SearchOutcome<E: Encoding> {
    pub archive: Archive<E>,
    pub coverage: CoverageSummary,
    pub iterations: u64,
    pub evaluations: u64,
}

/// A search algorithm over one encoding type
pub trait SearchAlgorithm<E: Encoding> {
    /// Run to termination. Consumes the run: calling it again is an error.
    fn search(&mut self) -> Result<SearchOutcome<E>>;
}

/// State shared by every algorithm variant
#[derive(Debug)]
pub struct SearchDriver<E: Encoding> {
    manager: ObjectiveManager,
    archive: Archive<E>,
    budget: BudgetManager,
    termination: TerminationManager,
    listeners: Vec<Box<dyn SearchListener>>,
    runner: Box<dyn EncodingRunner<E>>,
    rng: StdRng,
    phase: SearchPhase,
}

impl<E: Encoding> SearchDriver<E> {
    pub fn new(
        config: &SearchConfig,
        subject: &SearchSubject,
        runner: Box<dyn EncodingRunner<E>>,
    ) -> Result<Self> {
        config.validate()?;
        let mut manager = ObjectiveManager::new(config.objective_strategy);
        manager.load(subject);
        Ok(Self {
            manager,
            archive: Archive::new(config.secondary_objectives.clone()),
            budget: BudgetManager::new(config.budget.clone()),
            termination: TerminationManager::new(),
            listeners: Vec::new(),
            runner,
            rng: StdRng::seed_from_u64(config.seed),
            phase: SearchPhase::Initializing,
        })
    }

    pub fn add_listener(&mut self, listener: Box<dyn SearchListener>) {
        self.listeners.push(listener);
    }

    pub fn termination_mut(&mut self) -> &mut TerminationManager {
        &mut self.termination
    }

    pub fn manager(&self) -> &ObjectiveManager {
        &self.manager
    }

    pub fn rng(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    /// Transition into the running phase. Rejects reuse of a finished or
    /// already-running driver.
    pub(crate) fn start(&mut self) -> Result<()> {
        if self.phase != SearchPhase::Initializing {
            return Err(TestgenError::invariant(format!(
                "search cannot start from phase {:?}",
                self.phase
            )));
        }
        self.phase = SearchPhase::Running;
        self.budget.start_search();
        for listener in &mut self.listeners {
            listener.on_search_start();
        }
        info!(objectives = self.manager.current().len(), "search started");
        Ok(())
    }

    /// Polled at iteration boundaries only.
    pub(crate) fn should_stop(&self) -> bool {
        self.manager.done() || self.budget.any_exhausted() || self.termination.is_terminated()
    }

    /// Execute and score one individual. A runner failure becomes a failed
    /// execution result and still consumes budget.
    pub(crate) fn evaluate(&mut self, individual: &mut Individual<E>) -> Result<()> {
        let result = match self.runner.execute(&individual.encoding) {
            Ok(result) => result,
            Err(error) => {
                warn!(encoding = individual.encoding.id(), %error, "execution failed");
                ExecutionResult::failed(error.to_string())
            }
        };

        individual.distances.clear();
        for objective in self.manager.all() {
            let distance = objective.calculate_distance(&result)?;
            individual.distances.insert(objective.id().clone(), distance);
        }
        individual.result = Some(result);
        self.budget.record_evaluations(1);

        let newly_covered = self.manager.update(&individual.distances);
        for objective in &newly_covered {
            for listener in &mut self.listeners {
                listener.on_objective_covered(objective);
            }
        }
        // Every zero-distance objective goes through the archive; it
        // handles idempotence and secondary-objective replacement.
        for objective in self.manager.covered().clone() {
            if individual.distance(&objective) == Some(0.0) {
                self.archive.update(&objective, &individual.encoding, false);
            }
        }
        Ok(())
    }

    pub(crate) fn record_initialization(&mut self) {
        let evaluations = self.budget.evaluations();
        for listener in &mut self.listeners {
            listener.on_initialization_done(evaluations);
        }
    }

    pub(crate) fn record_iteration(&mut self) {
        self.budget.record_iteration();
        let iteration = self.budget.iterations();
        let coverage = self.manager.coverage();
        for listener in &mut self.listeners {
            listener.on_iteration_complete(iteration, &coverage);
        }
        debug!(
            iteration,
            covered = coverage.covered,
            total = coverage.total,
            "iteration complete"
        );
    }

    /// Transition into the terminated phase and build the outcome.
    pub(crate) fn finish(&mut self) -> SearchOutcome<E> {
        self.phase = SearchPhase::Terminated;
        let coverage = self.manager.coverage();
        for listener in &mut self.listeners {
            listener.on_search_complete(&coverage);
        }
        info!(
            covered = coverage.covered,
            total = coverage.total,
            iterations = self.budget.iterations(),
            evaluations = self.budget.evaluations(),
            "search finished"
        );
        SearchOutcome {
            archive: self.archive.clone(),
            coverage,
            iterations: self.budget.iterations(),
            evaluations: self.budget.evaluations(),
        }
    }
}
