//! Coverage objectives, their manager, and the solution archive

pub mod archive;
pub mod manager;
pub mod objective;
pub mod subject;

pub use archive::Archive;
pub use manager::{CoverageSummary, KindCoverage, ObjectiveManager};
pub use objective::{
    BranchObjective, ExceptionObjective, FunctionObjective, ObjectiveFunction, ObjectiveId,
    ObjectiveKind, PathObjective,
};
pub use subject::SearchSubject;
