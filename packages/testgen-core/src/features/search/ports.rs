//! Search ports
//!
//! The seams between the generic search loop and whatever is being
//! evolved. An `Encoding` is an opaque candidate test; samplers, variation
//! operators, and the runner are supplied by the embedding layer.

use rand::rngs::StdRng;
use rustc_hash::FxHashMap;

use crate::errors::Result;
use crate::features::objectives::ObjectiveId;
use crate::shared::models::ExecutionResult;

/// A candidate test the search evolves
pub trait Encoding: Clone + std::fmt::Debug + Send + Sync {
    /// Stable identity of this candidate, unique within a run
    fn id(&self) -> u64;

    /// Structural size; the secondary objective minimizes it
    fn size(&self) -> usize;
}

/// An encoding plus everything the search learned about it
#[derive(Debug, Clone)]
pub struct Individual<E: Encoding> {
    pub encoding: E,
    /// Set once the runner has executed the encoding
    pub result: Option<ExecutionResult>,
    /// Distance per objective, filled during evaluation
    pub distances: FxHashMap<ObjectiveId, f64>,
}

impl<E: Encoding> Individual<E> {
    pub fn new(encoding: E) -> Self {
        Self {
            encoding,
            result: None,
            distances: FxHashMap::default(),
        }
    }

    pub fn is_evaluated(&self) -> bool {
        self.result.is_some()
    }

    /// Distance to one objective; missing entries count as not evaluated.
    pub fn distance(&self, objective: &str) -> Option<f64> {
        self.distances.get(objective).copied()
    }
}

/// Produces fresh encodings
pub trait EncodingSampler<E: Encoding>: std::fmt::Debug + Send + Sync {
    fn sample(&self, rng: &mut StdRng) -> Result<E>;
}

/// Recombines parent encodings into offspring
pub trait CrossoverOperator<E: Encoding>: std::fmt::Debug + Send + Sync {
    /// At least two parents; fewer is a configuration error.
    fn crossover(&self, parents: &[&E], rng: &mut StdRng) -> Result<Vec<E>>;
}

/// Mutates one encoding
pub trait MutationOperator<E: Encoding>: std::fmt::Debug + Send + Sync {
    fn mutate(&self, encoding: &E, rng: &mut StdRng) -> Result<E>;
}

/// Executes encodings against the instrumented subject
pub trait EncodingRunner<E: Encoding>: std::fmt::Debug + Send + Sync {
    fn execute(&self, encoding: &E) -> Result<ExecutionResult>;

    /// Batch execution; the default delegates one by one.
    fn execute_multiple(&self, encodings: &[&E]) -> Result<Vec<ExecutionResult>> {
        encodings.iter().map(|e| self.execute(e)).collect()
    }
}
