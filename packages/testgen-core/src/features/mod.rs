//! Vertical feature slices

pub mod cfg;
pub mod fitness;
pub mod objectives;
pub mod search;
