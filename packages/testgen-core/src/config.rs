//! Search configuration
//!
//! One explicit struct constructed by the caller and passed into the
//! search algorithm, objective manager, and archive. Nothing in the core
//! reads ambient global state.

use serde::{Deserialize, Serialize};

use crate::errors::{Result, TestgenError};

/// Which uncovered objectives the manager exposes to the search each
/// generation. A policy choice, not a different algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ObjectiveStrategy {
    /// All registered objectives stay current for the whole run
    Simple,
    /// Only objectives not yet covered are current
    #[default]
    UncoveredOnly,
    /// Seed with entry-adjacent objectives; reveal dependents as parents
    /// get covered (DynaMOSA-style)
    Structural,
}

/// Secondary objective used to break ties between encodings that cover the
/// same objective. Compared in the configured order; the first comparator
/// that distinguishes two encodings decides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecondaryObjective {
    /// Prefer the smaller encoding
    EncodingSize,
}

/// Budget limits. `None` or `Some(0)` means unbounded for that dimension.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct BudgetConfig {
    /// Maximum search iterations (generations)
    pub iterations: Option<u64>,
    /// Maximum encoding evaluations
    pub evaluations: Option<u64>,
    /// Wall-clock seconds for the search loop proper
    pub search_time_seconds: Option<u64>,
    /// Wall-clock seconds for the whole run including initialization
    pub total_time_seconds: Option<u64>,
}

impl BudgetConfig {
    /// Budget bounded only by iteration count
    pub fn iterations(n: u64) -> Self {
        Self {
            iterations: Some(n),
            ..Self::default()
        }
    }
}

/// Complete configuration for one search run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Seed for the single RNG every stochastic decision consults
    pub seed: u64,
    /// Population size for evolutionary variants
    pub population_size: usize,
    /// Probability that a selected parent pair is crossed over
    pub crossover_probability: f64,
    /// Tournament size for parent selection
    pub tournament_size: usize,
    /// Objective exposure policy
    pub objective_strategy: ObjectiveStrategy,
    /// Ordered tie-break comparators for the archive
    pub secondary_objectives: Vec<SecondaryObjective>,
    /// Budget limits
    pub budget: BudgetConfig,
    /// Per-execution timeout the runner collaborator should enforce, in
    /// milliseconds. `None` leaves the runner's default in place.
    pub execution_timeout_ms: Option<u64>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            population_size: 50,
            crossover_probability: 0.8,
            tournament_size: 2,
            objective_strategy: ObjectiveStrategy::default(),
            secondary_objectives: vec![SecondaryObjective::EncodingSize],
            budget: BudgetConfig::default(),
            execution_timeout_ms: None,
        }
    }
}

impl SearchConfig {
    /// Validate value ranges. Called once by algorithm constructors.
    pub fn validate(&self) -> Result<()> {
        if self.population_size == 0 {
            return Err(TestgenError::config("population_size must be > 0"));
        }
        if !(0.0..=1.0).contains(&self.crossover_probability) {
            return Err(TestgenError::config(format!(
                "crossover_probability {} outside [0, 1]",
                self.crossover_probability
            )));
        }
        if self.tournament_size == 0 {
            return Err(TestgenError::config("tournament_size must be > 0"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        SearchConfig::default().validate().unwrap();
    }

    #[test]
    fn bad_crossover_probability_rejected() {
        let config = SearchConfig {
            crossover_probability: 1.5,
            ..SearchConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn config_loads_from_json() {
        let config: SearchConfig =
            serde_json::from_str(r#"{"seed": 42, "population_size": 10}"#).unwrap();
        assert_eq!(config.seed, 42);
        assert_eq!(config.population_size, 10);
        assert_eq!(config.crossover_probability, 0.8);
    }
}
