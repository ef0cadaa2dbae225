//! Control-flow-graph feature: graph model, edge contraction, wire format

pub mod domain;
pub mod infrastructure;

pub use domain::{ContractedControlFlowGraph, ControlFlowGraph, ControlFlowProgram, FunctionGraph};
pub use infrastructure::{contract, parse_program, serialize_program};
