//! Error types for testgen-core
//!
//! One crate-wide error enum covering the four failure classes the core
//! distinguishes: invariant violations (upstream bugs, fatal),
//! configuration/usage errors (fatal at the call site), execution failures
//! (recoverable, converted into results at the runner boundary), and
//! unsupported inputs (fatal, a guessed fitness would corrupt the search).

use thiserror::Error;

/// Main error type for testgen-core operations
#[derive(Debug, Error)]
pub enum TestgenError {
    /// Invariant violation: a collaborator handed us inconsistent data
    /// (duplicate node id, malformed contraction, hit trace without branch
    /// metadata). Never patched over.
    #[error("invariant violation: {0}")]
    Invariant(String),

    /// Configuration or usage error (crossover with <2 parents,
    /// unregistered objective, bad budget limits).
    #[error("configuration error: {0}")]
    Config(String),

    /// Execution failure reported by the runner collaborator. Recoverable:
    /// the search records it and continues.
    #[error("execution failure: {0}")]
    Execution(String),

    /// Expression node kind the branch-distance evaluator does not
    /// implement. Fatal by design.
    #[error("unsupported expression: {0}")]
    UnsupportedExpression(String),

    /// Wire-format (de)serialization error
    #[error("wire format error: {0}")]
    Wire(#[from] serde_json::Error),
}

impl TestgenError {
    /// Create an invariant-violation error
    pub fn invariant(msg: impl Into<String>) -> Self {
        TestgenError::Invariant(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        TestgenError::Config(msg.into())
    }

    /// Create an execution-failure error
    pub fn execution(msg: impl Into<String>) -> Self {
        TestgenError::Execution(msg.into())
    }

    /// Create an unsupported-expression error
    pub fn unsupported(msg: impl Into<String>) -> Self {
        TestgenError::UnsupportedExpression(msg.into())
    }
}

/// Result type alias for testgen-core operations
pub type Result<T> = std::result::Result<T, TestgenError>;
