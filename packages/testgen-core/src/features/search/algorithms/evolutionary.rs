//! Evolutionary search
//!
//! One generational loop parameterized by an environmental-selection
//! policy: NSGA-II truncation for whole-front optimization, MOSA
//! preference sorting for many-objective coverage. DynaMOSA is MOSA
//! running against the structural objective strategy, not a separate
//! loop.

use rand::Rng;
use tracing::debug;

use crate::config::{ObjectiveStrategy, SearchConfig};
use crate::errors::{Result, TestgenError};
use crate::features::objectives::{ObjectiveId, SearchSubject};

use super::super::ports::{
    CrossoverOperator, Encoding, EncodingRunner, EncodingSampler, Individual, MutationOperator,
};
use super::dominance::{crowding_distance, dominance_compare, rank_population, tournament, Dominance};
use super::{SearchAlgorithm, SearchDriver, SearchOutcome};

/// Reduces parents plus offspring back to the population size
pub trait EnvironmentalSelection<E: Encoding>: std::fmt::Debug + Send + Sync {
    fn select(
        &self,
        combined: Vec<Individual<E>>,
        objectives: &[ObjectiveId],
        target_size: usize,
    ) -> Result<Vec<Individual<E>>>;
}

/// Classic NSGA-II survival: fill whole fronts, truncate the overflowing
/// front by descending crowding distance.
#[derive(Debug, Default)]
pub struct Nsga2Selection;

impl<E: Encoding> EnvironmentalSelection<E> for Nsga2Selection {
    fn select(
        &self,
        combined: Vec<Individual<E>>,
        objectives: &[ObjectiveId],
        target_size: usize,
    ) -> Result<Vec<Individual<E>>> {
        let ranking = rank_population(&combined, objectives)?;
        let order = fill_fronts(&ranking.fronts, &combined, objectives, target_size)?;
        Ok(take_by_indices(combined, &order))
    }
}

/// MOSA survival: the best individual per current objective forms a
/// preference front ahead of regular dominance ranking, so progress toward
/// any single uncovered target is never selected away.
#[derive(Debug, Default)]
pub struct MosaSelection;

impl<E: Encoding> EnvironmentalSelection<E> for MosaSelection {
    fn select(
        &self,
        combined: Vec<Individual<E>>,
        objectives: &[ObjectiveId],
        target_size: usize,
    ) -> Result<Vec<Individual<E>>> {
        let mut preferred: Vec<usize> = Vec::new();
        for objective in objectives {
            let mut best: Option<(usize, f64)> = None;
            for (idx, individual) in combined.iter().enumerate() {
                let distance = individual.distance(objective).ok_or_else(|| {
                    TestgenError::invariant(format!(
                        "individual {} has no distance for objective '{objective}'",
                        individual.encoding.id()
                    ))
                })?;
                let better = match best {
                    None => true,
                    Some((_, b)) => distance < b,
                };
                if better {
                    best = Some((idx, distance));
                }
            }
            if let Some((idx, _)) = best {
                if !preferred.contains(&idx) {
                    preferred.push(idx);
                }
            }
        }
        preferred.sort_unstable();

        let remaining: Vec<usize> = (0..combined.len())
            .filter(|i| !preferred.contains(i))
            .collect();
        let mut fronts = vec![preferred];
        fronts.extend(sort_subset(&combined, &remaining, objectives)?);

        let order = fill_fronts(&fronts, &combined, objectives, target_size)?;
        Ok(take_by_indices(combined, &order))
    }
}

/// Non-dominated sort restricted to a subset of population indices
fn sort_subset<E: Encoding>(
    population: &[Individual<E>],
    subset: &[usize],
    objectives: &[ObjectiveId],
) -> Result<Vec<Vec<usize>>> {
    if subset.is_empty() {
        return Ok(Vec::new());
    }
    if objectives.is_empty() {
        return Ok(vec![subset.to_vec()]);
    }

    let n = subset.len();
    let mut dominated_by: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut domination_count: Vec<usize> = vec![0; n];
    for i in 0..n {
        for j in (i + 1)..n {
            match dominance_compare(&population[subset[i]], &population[subset[j]], objectives)? {
                Dominance::Left => {
                    dominated_by[i].push(j);
                    domination_count[j] += 1;
                }
                Dominance::Right => {
                    dominated_by[j].push(i);
                    domination_count[i] += 1;
                }
                Dominance::Neither => {}
            }
        }
    }

    let mut fronts: Vec<Vec<usize>> = Vec::new();
    let mut current: Vec<usize> = (0..n).filter(|&i| domination_count[i] == 0).collect();
    while !current.is_empty() {
        let mut next: Vec<usize> = Vec::new();
        for &i in &current {
            for &j in &dominated_by[i] {
                domination_count[j] -= 1;
                if domination_count[j] == 0 {
                    next.push(j);
                }
            }
        }
        next.sort_unstable();
        fronts.push(current.iter().map(|&i| subset[i]).collect());
        current = next;
    }
    Ok(fronts)
}

/// Whole fronts first; the overflowing front is cut by crowding distance,
/// original index breaking exact ties for reproducibility.
fn fill_fronts<E: Encoding>(
    fronts: &[Vec<usize>],
    population: &[Individual<E>],
    objectives: &[ObjectiveId],
    target_size: usize,
) -> Result<Vec<usize>> {
    let mut order: Vec<usize> = Vec::with_capacity(target_size);
    for front in fronts {
        if front.is_empty() {
            continue;
        }
        let room = target_size - order.len();
        if room == 0 {
            break;
        }
        if front.len() <= room {
            order.extend_from_slice(front);
            continue;
        }
        let crowding = crowding_distance(front, population, objectives)?;
        let mut slots: Vec<usize> = (0..front.len()).collect();
        slots.sort_by(|&a, &b| {
            crowding[b]
                .partial_cmp(&crowding[a])
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(front[a].cmp(&front[b]))
        });
        order.extend(slots.into_iter().take(room).map(|s| front[s]));
        break;
    }
    Ok(order)
}

/// Move the selected individuals out of the combined population
fn take_by_indices<E: Encoding>(
    combined: Vec<Individual<E>>,
    order: &[usize],
) -> Vec<Individual<E>> {
    let mut slots: Vec<Option<Individual<E>>> = combined.into_iter().map(Some).collect();
    order
        .iter()
        .filter_map(|&idx| slots.get_mut(idx).and_then(Option::take))
        .collect()
}

/// Generational evolutionary algorithm over one encoding type
#[derive(Debug)]
pub struct EvolutionaryAlgorithm<E: Encoding> {
    config: SearchConfig,
    driver: SearchDriver<E>,
    sampler: Box<dyn EncodingSampler<E>>,
    crossover: Box<dyn CrossoverOperator<E>>,
    mutation: Box<dyn MutationOperator<E>>,
    selection: Box<dyn EnvironmentalSelection<E>>,
}

impl<E: Encoding> EvolutionaryAlgorithm<E> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: SearchConfig,
        subject: &SearchSubject,
        sampler: Box<dyn EncodingSampler<E>>,
        crossover: Box<dyn CrossoverOperator<E>>,
        mutation: Box<dyn MutationOperator<E>>,
        selection: Box<dyn EnvironmentalSelection<E>>,
        runner: Box<dyn EncodingRunner<E>>,
    ) -> Result<Self> {
        let driver = SearchDriver::new(&config, subject, runner)?;
        Ok(Self {
            config,
            driver,
            sampler,
            crossover,
            mutation,
            selection,
        })
    }

    /// NSGA-II: dominance ranking over the objectives still in play;
    /// covered ones drop out of the tracked set between generations.
    pub fn nsga2(
        config: SearchConfig,
        subject: &SearchSubject,
        sampler: Box<dyn EncodingSampler<E>>,
        crossover: Box<dyn CrossoverOperator<E>>,
        mutation: Box<dyn MutationOperator<E>>,
        runner: Box<dyn EncodingRunner<E>>,
    ) -> Result<Self> {
        let config = SearchConfig {
            objective_strategy: ObjectiveStrategy::UncoveredOnly,
            ..config
        };
        Self::new(
            config,
            subject,
            sampler,
            crossover,
            mutation,
            Box::new(Nsga2Selection),
            runner,
        )
    }

    /// MOSA: preference sorting over the uncovered objectives.
    pub fn mosa(
        config: SearchConfig,
        subject: &SearchSubject,
        sampler: Box<dyn EncodingSampler<E>>,
        crossover: Box<dyn CrossoverOperator<E>>,
        mutation: Box<dyn MutationOperator<E>>,
        runner: Box<dyn EncodingRunner<E>>,
    ) -> Result<Self> {
        let config = SearchConfig {
            objective_strategy: ObjectiveStrategy::UncoveredOnly,
            ..config
        };
        Self::new(
            config,
            subject,
            sampler,
            crossover,
            mutation,
            Box::new(MosaSelection),
            runner,
        )
    }

    /// DynaMOSA: MOSA selection with structurally gated objectives.
    pub fn dynamosa(
        config: SearchConfig,
        subject: &SearchSubject,
        sampler: Box<dyn EncodingSampler<E>>,
        crossover: Box<dyn CrossoverOperator<E>>,
        mutation: Box<dyn MutationOperator<E>>,
        runner: Box<dyn EncodingRunner<E>>,
    ) -> Result<Self> {
        let config = SearchConfig {
            objective_strategy: ObjectiveStrategy::Structural,
            ..config
        };
        Self::new(
            config,
            subject,
            sampler,
            crossover,
            mutation,
            Box::new(MosaSelection),
            runner,
        )
    }

    pub fn driver_mut(&mut self) -> &mut SearchDriver<E> {
        &mut self.driver
    }

    fn breed(&mut self, population: &[Individual<E>]) -> Result<Vec<Individual<E>>> {
        let objectives = self.driver.manager().current().to_vec();
        let ranking = rank_population(population, &objectives)?;
        let size = self.config.population_size;
        let mut offspring: Vec<Individual<E>> = Vec::with_capacity(size);

        while offspring.len() < size {
            let first = tournament(&ranking, self.config.tournament_size, self.driver.rng());
            let second = tournament(&ranking, self.config.tournament_size, self.driver.rng());

            let crossed = self.driver.rng().gen::<f64>() < self.config.crossover_probability;
            let children = if crossed {
                self.crossover.crossover(
                    &[&population[first].encoding, &population[second].encoding],
                    self.driver.rng(),
                )?
            } else {
                vec![
                    population[first].encoding.clone(),
                    population[second].encoding.clone(),
                ]
            };

            for child in children {
                if offspring.len() == size {
                    break;
                }
                let mutated = self.mutation.mutate(&child, self.driver.rng())?;
                offspring.push(Individual::new(mutated));
            }
        }
        Ok(offspring)
    }
}

impl<E: Encoding> SearchAlgorithm<E> for EvolutionaryAlgorithm<E> {
    fn search(&mut self) -> Result<SearchOutcome<E>> {
        self.driver.start()?;

        let mut population: Vec<Individual<E>> =
            Vec::with_capacity(self.config.population_size);
        for _ in 0..self.config.population_size {
            let encoding = self.sampler.sample(self.driver.rng())?;
            let mut individual = Individual::new(encoding);
            self.driver.evaluate(&mut individual)?;
            population.push(individual);
        }
        self.driver.record_initialization();

        while !self.driver.should_stop() {
            let mut offspring = self.breed(&population)?;
            for individual in &mut offspring {
                self.driver.evaluate(individual)?;
            }

            let mut combined = population;
            combined.extend(offspring);
            let objectives = self.driver.manager().current().to_vec();
            population =
                self.selection
                    .select(combined, &objectives, self.config.population_size)?;
            debug!(
                survivors = population.len(),
                objectives = objectives.len(),
                "generation selected"
            );

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
    use crate::features::search::ports::fixtures::{FixedSampler, GeneRunner, VecEncoding};
    use rand::rngs::StdRng;
    use std::sync::Arc;

    #[derive(Debug)]
    struct SpliceCrossover;

    impl CrossoverOperator<VecEncoding> for SpliceCrossover {
        fn crossover(&self, parents: &[&VecEncoding], _rng: &mut StdRng) -> Result<Vec<VecEncoding>> {
            if parents.len() < 2 {
                return Err(TestgenError::config("crossover needs at least two parents"));
            }
            let mut left = parents[0].genes.clone();
            let mut right = parents[1].genes.clone();
            if !left.is_empty() && !right.is_empty() {
                std::mem::swap(&mut left[0], &mut right[0]);
            }
            Ok(vec![VecEncoding::new(left), VecEncoding::new(right)])
        }
    }

    /// Randomly nudges the first gene up or down.
    #[derive(Debug)]
    struct NudgeMutation;

    impl MutationOperator<VecEncoding> for NudgeMutation {
        fn mutate(&self, encoding: &VecEncoding, rng: &mut StdRng) -> Result<VecEncoding> {
            let mut genes = encoding.genes.clone();
            if let Some(first) = genes.first_mut() {
                *first += rng.gen_range(-1..=1);
            }
            Ok(VecEncoding::new(genes))
        }
    }

    fn subject() -> SearchSubject {
        let objective: Arc<dyn ObjectiveFunction> = Arc::new(FunctionObjective::new("f1"));
        SearchSubject::new(vec![objective])
    }

    fn config(seed: u64, iterations: u64) -> SearchConfig {
        SearchConfig {
            seed,
            population_size: 8,
            budget: BudgetConfig::iterations(iterations),
            ..SearchConfig::default()
        }
    }

    fn mosa_search(seed: u64) -> EvolutionaryAlgorithm<VecEncoding> {
        EvolutionaryAlgorithm::mosa(
            config(seed, 50),
            &subject(),
            Box::new(FixedSampler { genes: vec![0] }),
            Box::new(SpliceCrossover),
            Box::new(NudgeMutation),
            Box::new(GeneRunner {
                function_id: "f1".to_string(),
            }),
        )
        .unwrap()
    }

    #[test]
    fn mosa_covers_a_mutation_reachable_objective() {
        // Sampling gives gene 0 (uncovered); one upward nudge covers.
        let outcome = mosa_search(3).search().unwrap();
        assert_eq!(outcome.coverage.covered, 1);
        assert!(outcome.archive.contains("function:f1"));
        assert!(outcome.iterations < 50);
    }

    #[test]
    fn same_seed_replays_identically() {
        let a = mosa_search(11).search().unwrap();
        let b = mosa_search(11).search().unwrap();
        assert_eq!(a.iterations, b.iterations);
        assert_eq!(a.evaluations, b.evaluations);
        assert_eq!(a.archive.objectives(), b.archive.objectives());
    }

    #[test]
    fn crossover_rejects_a_single_parent() {
        use rand::SeedableRng;
        let parent = VecEncoding::new(vec![1]);
        let mut rng = StdRng::seed_from_u64(0);
        assert!(SpliceCrossover.crossover(&[&parent], &mut rng).is_err());
    }

    fn scored(distances: &[(&str, f64)], size: usize) -> Individual<VecEncoding> {
        let mut individual = Individual::new(VecEncoding::new(vec![0; size]));
        for (k, v) in distances {
            individual.distances.insert(k.to_string(), *v);
        }
        individual
    }

    fn objective_ids(ids: &[&str]) -> Vec<ObjectiveId> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn nsga2_retires_covered_objectives_from_the_tracked_set() {
        // Two function objectives; the runner only ever enters f1, so f1
        // is covered on the first evaluation and must leave the set the
        // ranking consults, while f2 stays tracked.
        let objectives: Vec<Arc<dyn ObjectiveFunction>> = vec![
            Arc::new(FunctionObjective::new("f1")),
            Arc::new(FunctionObjective::new("f2")),
        ];
        let mut search = EvolutionaryAlgorithm::nsga2(
            config(5, 3),
            &SearchSubject::new(objectives),
            Box::new(FixedSampler { genes: vec![1] }),
            Box::new(SpliceCrossover),
            Box::new(NudgeMutation),
            Box::new(GeneRunner {
                function_id: "f1".to_string(),
            }),
        )
        .unwrap();
        let outcome = search.search().unwrap();
        assert_eq!(outcome.coverage.covered, 1);

        let current = search.driver_mut().manager().current();
        assert!(!current.contains(&"function:f1".to_string()));
        assert_eq!(current, &["function:f2".to_string()]);
    }

    #[test]
    fn nsga2_selection_keeps_the_first_front() {
        let combined = vec![
            scored(&[("o1", 0.0), ("o2", 3.0)], 1),
            scored(&[("o1", 3.0), ("o2", 0.0)], 1),
            scored(&[("o1", 4.0), ("o2", 4.0)], 1), // dominated
        ];
        let survivors = Nsga2Selection
            .select(combined, &objective_ids(&["o1", "o2"]), 2)
            .unwrap();
        assert_eq!(survivors.len(), 2);
        for survivor in &survivors {
            assert_ne!(survivor.distance("o1"), Some(4.0));
        }
    }

    #[test]
    fn mosa_selection_prefers_best_per_objective() {
        // Index 2 is dominated overall but best on o3; preference sorting
        // must keep it ahead of the merely non-dominated index 3.
        let combined = vec![
            scored(&[("o1", 0.0), ("o2", 5.0), ("o3", 5.0)], 1),
            scored(&[("o1", 5.0), ("o2", 0.0), ("o3", 5.0)], 1),
            scored(&[("o1", 6.0), ("o2", 6.0), ("o3", 1.0)], 1),
            scored(&[("o1", 4.0), ("o2", 4.0), ("o3", 4.0)], 1),
        ];
        let survivors = MosaSelection
            .select(combined, &objective_ids(&["o1", "o2", "o3"]), 3)
            .unwrap();
        assert_eq!(survivors.len(), 3);
        assert!(survivors
            .iter()
            .any(|s| s.distance("o3") == Some(1.0)));
    }
}
