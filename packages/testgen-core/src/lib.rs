/*
 * Testgen Core - Search-Based Test Generation Engine
 *
 * Feature-First Hexagonal Architecture:
 * - shared/      : Common models (Node, Edge, Trace, Condition)
 * - features/    : Vertical slices (cfg → fitness → objectives → search)
 *
 * The engine is language-agnostic: a control flow graph and runtime
 * traces come in over the wire format, archived encodings come out.
 * Executing candidates against the instrumented target is the job of an
 * external runner plugged in behind the EncodingRunner port.
 */

pub mod config;
pub mod errors;
pub mod features;
pub mod shared;

pub use config::{BudgetConfig, ObjectiveStrategy, SearchConfig, SecondaryObjective};
pub use errors::{Result, TestgenError};
pub use features::cfg::{
    contract, parse_program, serialize_program, ContractedControlFlowGraph, ControlFlowGraph,
    ControlFlowProgram, FunctionGraph,
};
pub use features::fitness::{approach_level, branch_distance, normalize, ClosestCovered};
pub use features::objectives::{
    Archive, BranchObjective, CoverageSummary, ExceptionObjective, FunctionObjective,
    ObjectiveFunction, ObjectiveId, ObjectiveKind, ObjectiveManager, PathObjective, SearchSubject,
};
pub use features::search::{
    CancelHandle, CrossoverOperator, Encoding, EncodingRunner, EncodingSampler,
    EvolutionaryAlgorithm, Individual, MosaSelection, MutationOperator, Nsga2Selection,
    RandomSearch, SearchAlgorithm, SearchListener, SearchOutcome,
};
