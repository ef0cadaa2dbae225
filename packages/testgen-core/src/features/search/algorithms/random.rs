//! Random search
//!
//! Baseline algorithm: one fresh sample per iteration, no variation, no
//! population. Everything it finds still flows through the shared archive,
//! so it is a drop-in comparison point for the evolutionary variants.

use crate::config::SearchConfig;
use crate::errors::Result;
use crate::features::objectives::SearchSubject;

use super::super::ports::{Encoding, EncodingRunner, EncodingSampler, Individual};
use super::{SearchAlgorithm, SearchDriver, SearchOutcome};

#[derive(Debug)]
pub struct RandomSearch<E: Encoding> {
    driver: SearchDriver<E>,
    sampler: Box<dyn EncodingSampler<E>>,
}

impl<E: Encoding> RandomSearch<E> {
    pub fn new(
        config: &SearchConfig,
        subject: &SearchSubject,
        sampler: Box<dyn EncodingSampler<E>>,
        runner: Box<dyn EncodingRunner<E>>,
    ) -> Result<Self> {
        Ok(Self {
            driver: SearchDriver::new(config, subject, runner)?,
            sampler,
        })
    }

    pub fn driver_mut(&mut self) -> &mut SearchDriver<E> {
        &mut self.driver
    }
}

impl<E: Encoding> SearchAlgorithm<E> for RandomSearch<E> {
    fn search(&mut self) -> Result<SearchOutcome<E>> {
        self.driver.start()?;
        self.driver.record_initialization();

        while !self.driver.should_stop() {
            let encoding = self.sampler.sample(self.driver.rng())?;
            let mut individual = Individual::new(encoding);
            self.driver.evaluate(&mut individual)?;
            self.driver.record_iteration();
        }

        Ok(self.driver.finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BudgetConfig;
    use crate::features::objectives::{FunctionObjective, ObjectiveFunction};
    use crate::features::search::ports::fixtures::{CrashingRunner, FixedSampler, GeneRunner};
    use crate::features::search::termination::CancelHandle;
    use std::sync::Arc;

    fn subject() -> SearchSubject {
        let objective: Arc<dyn ObjectiveFunction> = Arc::new(FunctionObjective::new("f1"));
        SearchSubject::new(vec![objective])
    }

    fn config(iterations: u64) -> SearchConfig {
        SearchConfig {
            budget: BudgetConfig::iterations(iterations),
            ..SearchConfig::default()
        }
    }

    #[test]
    fn stops_once_everything_is_covered() {
        let mut search = RandomSearch::new(
            &config(100),
            &subject(),
            Box::new(FixedSampler { genes: vec![1] }),
            Box::new(GeneRunner {
                function_id: "f1".to_string(),
            }),
        )
        .unwrap();
        let outcome = search.search().unwrap();
        // The very first sample covers the single objective.
        assert_eq!(outcome.iterations, 1);
        assert_eq!(outcome.coverage.covered, 1);
        assert!(outcome.archive.contains("function:f1"));
    }

    #[test]
    fn exhausts_iteration_budget_when_nothing_covers() {
        let mut search = RandomSearch::new(
            &config(5),
            &subject(),
            Box::new(FixedSampler { genes: vec![0] }),
            Box::new(GeneRunner {
                function_id: "f1".to_string(),
            }),
        )
        .unwrap();
        let outcome = search.search().unwrap();
        assert_eq!(outcome.iterations, 5);
        assert_eq!(outcome.evaluations, 5);
        assert_eq!(outcome.coverage.covered, 0);
    }

    #[test]
    fn runner_failures_consume_budget() {
        let mut search = RandomSearch::new(
            &config(3),
            &subject(),
            Box::new(FixedSampler { genes: vec![1] }),
            Box::new(CrashingRunner),
        )
        .unwrap();
        let outcome = search.search().unwrap();
        assert_eq!(outcome.evaluations, 3);
        assert_eq!(outcome.coverage.covered, 0);
    }

    #[test]
    fn cancel_handle_stops_the_loop_immediately() {
        let mut search = RandomSearch::new(
            &config(1000),
            &subject(),
            Box::new(FixedSampler { genes: vec![0] }),
            Box::new(GeneRunner {
                function_id: "f1".to_string(),
            }),
        )
        .unwrap();
        let handle = CancelHandle::new();
        handle.cancel();
        search
            .driver_mut()
            .termination_mut()
            .add_trigger(Box::new(handle));
        let outcome = search.search().unwrap();
        assert_eq!(outcome.iterations, 0);
    }

    #[test]
    fn second_search_call_is_rejected() {
        let mut search = RandomSearch::new(
            &config(1),
            &subject(),
            Box::new(FixedSampler { genes: vec![0] }),
            Box::new(GeneRunner {
                function_id: "f1".to_string(),
            }),
        )
        .unwrap();
        search.search().unwrap();
        assert!(search.search().is_err());
    }

    #[test]
    fn listener_sees_lifecycle_events() {
        use crate::features::objectives::{CoverageSummary, ObjectiveId};
        use crate::features::search::events::SearchListener;
        use std::sync::Mutex;

        #[derive(Debug, Default)]
        struct Shared {
            starts: u64,
            iterations: u64,
            covered: Vec<ObjectiveId>,
            completed: bool,
        }

        #[derive(Debug)]
        struct SharingListener(Arc<Mutex<Shared>>);

        impl SearchListener for SharingListener {
            fn on_search_start(&mut self) {
                self.0.lock().unwrap().starts += 1;
            }
            fn on_iteration_complete(&mut self, _iteration: u64, _coverage: &CoverageSummary) {
                self.0.lock().unwrap().iterations += 1;
            }
            fn on_objective_covered(&mut self, objective: &ObjectiveId) {
                self.0.lock().unwrap().covered.push(objective.clone());
            }
            fn on_search_complete(&mut self, _coverage: &CoverageSummary) {
                self.0.lock().unwrap().completed = true;
            }
        }

        let events = Arc::new(Mutex::new(Shared::default()));
        let mut search = RandomSearch::new(
            &config(100),
            &subject(),
            Box::new(FixedSampler { genes: vec![1] }),
            Box::new(GeneRunner {
                function_id: "f1".to_string(),
            }),
        )
        .unwrap();
        search
            .driver_mut()
            .add_listener(Box::new(SharingListener(events.clone())));
        search.search().unwrap();

        let shared = events.lock().unwrap();
        assert_eq!(shared.starts, 1);
        assert_eq!(shared.iterations, 1);
        assert_eq!(shared.covered, vec!["function:f1".to_string()]);
        assert!(shared.completed);
    }
}
