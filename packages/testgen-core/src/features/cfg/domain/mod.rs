//! CFG domain models

mod contracted;
mod graph;
mod program;

pub use contracted::ContractedControlFlowGraph;
pub use graph::ControlFlowGraph;
pub use program::{ControlFlowProgram, FunctionGraph};
