//! Fitness metrics: approach level and branch distance

pub mod approach_level;
pub mod branch_distance;

pub use approach_level::{approach_level, ClosestCovered};
pub use branch_distance::{branch_distance, normalize};
