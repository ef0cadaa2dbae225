//! CFG algorithms and external formats

pub mod contraction;
pub mod wire;

pub use contraction::contract;
pub use wire::{parse_program, serialize_program};
