//! Search loop: ports, budget, termination, events, and algorithms

pub mod algorithms;
pub mod budget;
pub mod events;
pub mod ports;
pub mod termination;

pub use algorithms::{
    EnvironmentalSelection, EvolutionaryAlgorithm, MosaSelection, Nsga2Selection, RandomSearch,
    SearchAlgorithm, SearchDriver, SearchOutcome, SearchPhase,
};
pub use budget::{BudgetManager, ExhaustedBudget};
pub use events::SearchListener;
pub use ports::{
    CrossoverOperator, Encoding, EncodingRunner, EncodingSampler, Individual, MutationOperator,
};
pub use termination::{CancelHandle, TerminationManager, TerminationTrigger};
