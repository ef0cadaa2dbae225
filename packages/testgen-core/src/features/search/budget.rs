//! Budget accounting
//!
//! Counts iterations, evaluations, and elapsed wall clock against the
//! configured limits. The search loop consults it only at iteration
//! boundaries, so a generation always runs to completion once started.

use std::time::Instant;

use tracing::debug;

use crate::config::BudgetConfig;

/// Budget dimension that ran out first
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExhaustedBudget {
    Iterations,
    Evaluations,
    SearchTime,
    TotalTime,
}

/// Tracks consumption against a `BudgetConfig`
#[derive(Debug)]
pub struct BudgetManager {
    config: BudgetConfig,
    iterations: u64,
    evaluations: u64,
    /// Set when the manager is created (covers initialization)
    total_start: Instant,
    /// Set when the search loop proper starts
    search_start: Option<Instant>,
}

impl BudgetManager {
    pub fn new(config: BudgetConfig) -> Self {
        Self {
            config,
            iterations: 0,
            evaluations: 0,
            total_start: Instant::now(),
            search_start: None,
        }
    }

    /// Mark the start of the search loop; search time counts from here.
    pub fn start_search(&mut self) {
        if self.search_start.is_none() {
            self.search_start = Some(Instant::now());
        }
    }

    pub fn record_iteration(&mut self) {
        self.iterations += 1;
    }

    pub fn record_evaluations(&mut self, count: u64) {
        self.evaluations += count;
    }

    pub fn iterations(&self) -> u64 {
        self.iterations
    }

    pub fn evaluations(&self) -> u64 {
        self.evaluations
    }

    /// First exhausted budget dimension, if any. Zero limits mean
    /// unbounded, same as absent ones.
    pub fn exhausted(&self) -> Option<ExhaustedBudget> {
        if bounded(self.config.iterations).is_some_and(|max| self.iterations >= max) {
            return Some(ExhaustedBudget::Iterations);
        }
        if bounded(self.config.evaluations).is_some_and(|max| self.evaluations >= max) {
            return Some(ExhaustedBudget::Evaluations);
        }
        if let (Some(max), Some(start)) = (bounded(self.config.search_time_seconds), self.search_start)
        {
            if start.elapsed().as_secs() >= max {
                return Some(ExhaustedBudget::SearchTime);
            }
        }
        if bounded(self.config.total_time_seconds)
            .is_some_and(|max| self.total_start.elapsed().as_secs() >= max)
        {
            return Some(ExhaustedBudget::TotalTime);
        }
        None
    }

    pub fn any_exhausted(&self) -> bool {
        let exhausted = self.exhausted();
        if let Some(which) = exhausted {
            debug!(
                budget = ?which,
                iterations = self.iterations,
                evaluations = self.evaluations,
                "budget exhausted"
            );
        }
        exhausted.is_some()
    }
}

fn bounded(limit: Option<u64>) -> Option<u64> {
    limit.filter(|&max| max > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unbounded_by_default() {
        let mut budget = BudgetManager::new(BudgetConfig::default());
        for _ in 0..1000 {
            budget.record_iteration();
            budget.record_evaluations(10);
        }
        assert!(!budget.any_exhausted());
    }

    #[test]
    fn zero_limit_means_unbounded() {
        let mut budget = BudgetManager::new(BudgetConfig {
            iterations: Some(0),
            ..BudgetConfig::default()
        });
        budget.record_iteration();
        assert!(!budget.any_exhausted());
    }

    #[test]
    fn iteration_limit_trips() {
        let mut budget = BudgetManager::new(BudgetConfig::iterations(3));
        budget.record_iteration();
        budget.record_iteration();
        assert!(!budget.any_exhausted());
        budget.record_iteration();
        assert_eq!(budget.exhausted(), Some(ExhaustedBudget::Iterations));
    }

    #[test]
    fn evaluation_limit_trips() {
        let mut budget = BudgetManager::new(BudgetConfig {
            evaluations: Some(5),
            ..BudgetConfig::default()
        });
        budget.record_evaluations(4);
        assert!(!budget.any_exhausted());
        budget.record_evaluations(1);
        assert_eq!(budget.exhausted(), Some(ExhaustedBudget::Evaluations));
    }

    #[test]
    fn counters_report_consumption() {
        let mut budget = BudgetManager::new(BudgetConfig::default());
        budget.record_iteration();
        budget.record_evaluations(7);
        assert_eq!(budget.iterations(), 1);
        assert_eq!(budget.evaluations(), 7);
    }
}
