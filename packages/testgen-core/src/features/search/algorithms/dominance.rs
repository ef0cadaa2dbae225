//! Pareto dominance and ranking
//!
//! Fast non-dominated sort and crowding distance over the objective set
//! the manager currently exposes. Missing distances are hard errors: the
//! loop evaluates every individual against every current objective before
//! ranking, so a gap means the bookkeeping broke.

use rand::rngs::StdRng;
use rand::Rng;

use crate::errors::{Result, TestgenError};
use crate::features::objectives::ObjectiveId;

use super::super::ports::{Encoding, Individual};

/// Outcome of a pairwise dominance check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dominance {
    Left,
    Right,
    Neither,
}

fn distance_of<E: Encoding>(individual: &Individual<E>, objective: &ObjectiveId) -> Result<f64> {
    individual.distance(objective).ok_or_else(|| {
        TestgenError::invariant(format!(
            "individual {} has no distance for objective '{objective}'",
            individual.encoding.id()
        ))
    })
}

/// Pairwise dominance over the given objectives. Left dominates when it is
/// no worse everywhere and strictly better somewhere.
pub fn dominance_compare<E: Encoding>(
    a: &Individual<E>,
    b: &Individual<E>,
    objectives: &[ObjectiveId],
) -> Result<Dominance> {
    let mut a_better = false;
    let mut b_better = false;
    for objective in objectives {
        let da = distance_of(a, objective)?;
        let db = distance_of(b, objective)?;
        if da < db {
            a_better = true;
        } else if db < da {
            b_better = true;
        }
    }
    Ok(match (a_better, b_better) {
        (true, false) => Dominance::Left,
        (false, true) => Dominance::Right,
        _ => Dominance::Neither,
    })
}

/// Rank and crowding of one population, indices into the ranked slice
#[derive(Debug, Clone)]
pub struct Ranking {
    /// Non-dominated fronts, best first; each front holds population
    /// indices in their original order.
    pub fronts: Vec<Vec<usize>>,
    /// Front number per population index (0 = best)
    pub rank: Vec<usize>,
    /// Crowding distance per population index
    pub crowding: Vec<f64>,
}

/// Fast non-dominated sort (Deb et al.) over the current objectives
pub fn fast_non_dominated_sort<E: Encoding>(
    population: &[Individual<E>],
    objectives: &[ObjectiveId],
) -> Result<Vec<Vec<usize>>> {
    let n = population.len();
    if n == 0 {
        return Ok(Vec::new());
    }
    // With nothing to compare on, everything ties in one front.
    if objectives.is_empty() {
        return Ok(vec![(0..n).collect()]);
    }

    let mut dominated_by: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut domination_count: Vec<usize> = vec![0; n];
    for i in 0..n {
        for j in (i + 1)..n {
            match dominance_compare(&population[i], &population[j], objectives)? {
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
        fronts.push(std::mem::replace(&mut current, next));
    }
    Ok(fronts)
}

/// Crowding distance within one front. Boundary individuals per objective
/// get infinite distance so they always survive truncation.
pub fn crowding_distance<E: Encoding>(
    front: &[usize],
    population: &[Individual<E>],
    objectives: &[ObjectiveId],
) -> Result<Vec<f64>> {
    let mut crowding = vec![0.0_f64; front.len()];
    if front.len() <= 2 {
        crowding.fill(f64::INFINITY);
        return Ok(crowding);
    }

    for objective in objectives {
        let mut order: Vec<usize> = (0..front.len()).collect();
        let mut values = Vec::with_capacity(front.len());
        for &idx in front {
            values.push(distance_of(&population[idx], objective)?);
        }
        order.sort_by(|&a, &b| {
            values[a]
                .partial_cmp(&values[b])
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let span = values[order[front.len() - 1]] - values[order[0]];
        crowding[order[0]] = f64::INFINITY;
        crowding[order[front.len() - 1]] = f64::INFINITY;
        if span == 0.0 {
            continue;
        }
        for w in 1..front.len() - 1 {
            let gap = values[order[w + 1]] - values[order[w - 1]];
            crowding[order[w]] += gap / span;
        }
    }
    Ok(crowding)
}

/// Full ranking of a population: fronts, per-index rank, per-index crowding
pub fn rank_population<E: Encoding>(
    population: &[Individual<E>],
    objectives: &[ObjectiveId],
) -> Result<Ranking> {
    let fronts = fast_non_dominated_sort(population, objectives)?;
    let mut rank = vec![0usize; population.len()];
    let mut crowding = vec![0.0_f64; population.len()];
    for (front_no, front) in fronts.iter().enumerate() {
        let local = crowding_distance(front, population, objectives)?;
        for (slot, &idx) in front.iter().enumerate() {
            rank[idx] = front_no;
            crowding[idx] = local[slot];
        }
    }
    Ok(Ranking {
        fronts,
        rank,
        crowding,
    })
}

/// Binary-or-larger tournament on rank, crowding breaking ties
pub fn tournament(ranking: &Ranking, tournament_size: usize, rng: &mut StdRng) -> usize {
    let n = ranking.rank.len();
    let mut best = rng.gen_range(0..n);
    for _ in 1..tournament_size {
        let challenger = rng.gen_range(0..n);
        let better_rank = ranking.rank[challenger] < ranking.rank[best];
        let same_rank_more_spread = ranking.rank[challenger] == ranking.rank[best]
            && ranking.crowding[challenger] > ranking.crowding[best];
        if better_rank || same_rank_more_spread {
            best = challenger;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::search::ports::fixtures::VecEncoding;
    use rand::SeedableRng;

    fn individual(distances: &[(&str, f64)]) -> Individual<VecEncoding> {
        let mut ind = Individual::new(VecEncoding::new(vec![0]));
        for (k, v) in distances {
            ind.distances.insert(k.to_string(), *v);
        }
        ind
    }

    fn objectives(ids: &[&str]) -> Vec<ObjectiveId> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn strictly_better_dominates() {
        let a = individual(&[("o1", 0.0), ("o2", 1.0)]);
        let b = individual(&[("o1", 1.0), ("o2", 1.0)]);
        let objs = objectives(&["o1", "o2"]);
        assert_eq!(dominance_compare(&a, &b, &objs).unwrap(), Dominance::Left);
        assert_eq!(dominance_compare(&b, &a, &objs).unwrap(), Dominance::Right);
    }

    #[test]
    fn trade_off_is_incomparable() {
        let a = individual(&[("o1", 0.0), ("o2", 2.0)]);
        let b = individual(&[("o1", 2.0), ("o2", 0.0)]);
        let objs = objectives(&["o1", "o2"]);
        assert_eq!(dominance_compare(&a, &b, &objs).unwrap(), Dominance::Neither);
    }

    #[test]
    fn self_comparison_is_neutral() {
        let a = individual(&[("o1", 1.0), ("o2", 2.0)]);
        let objs = objectives(&["o1", "o2"]);
        assert_eq!(dominance_compare(&a, &a, &objs).unwrap(), Dominance::Neither);
    }

    #[test]
    fn three_vector_partition() {
        // (0,1) and (2,0) trade off; (3,3) loses to both.
        let population = vec![
            individual(&[("o1", 0.0), ("o2", 1.0)]),
            individual(&[("o1", 3.0), ("o2", 3.0)]),
            individual(&[("o1", 2.0), ("o2", 0.0)]),
        ];
        let fronts =
            fast_non_dominated_sort(&population, &objectives(&["o1", "o2"])).unwrap();
        assert_eq!(fronts, vec![vec![0, 2], vec![1]]);
    }

    #[test]
    fn missing_distance_is_fatal() {
        let a = individual(&[("o1", 0.0)]);
        let b = individual(&[("o1", 1.0)]);
        let objs = objectives(&["o1", "o2"]);
        assert!(dominance_compare(&a, &b, &objs).is_err());
    }

    #[test]
    fn sort_layers_fronts() {
        let population = vec![
            individual(&[("o1", 0.0), ("o2", 2.0)]), // front 0
            individual(&[("o1", 2.0), ("o2", 0.0)]), // front 0
            individual(&[("o1", 3.0), ("o2", 3.0)]), // front 1, dominated by both
        ];
        let fronts =
            fast_non_dominated_sort(&population, &objectives(&["o1", "o2"])).unwrap();
        assert_eq!(fronts, vec![vec![0, 1], vec![2]]);
    }

    #[test]
    fn boundary_points_get_infinite_crowding() {
        let population = vec![
            individual(&[("o1", 0.0), ("o2", 4.0)]),
            individual(&[("o1", 2.0), ("o2", 2.0)]),
            individual(&[("o1", 4.0), ("o2", 0.0)]),
        ];
        let front = vec![0, 1, 2];
        let crowding =
            crowding_distance(&front, &population, &objectives(&["o1", "o2"])).unwrap();
        assert_eq!(crowding[0], f64::INFINITY);
        assert_eq!(crowding[2], f64::INFINITY);
        assert!(crowding[1].is_finite());
        assert!(crowding[1] > 0.0);
    }

    #[test]
    fn no_objectives_yields_single_front() {
        let population = vec![individual(&[]), individual(&[])];
        let fronts = fast_non_dominated_sort(&population, &[]).unwrap();
        assert_eq!(fronts, vec![vec![0, 1]]);
    }

    #[test]
    fn tournament_prefers_better_rank() {
        let ranking = Ranking {
            fronts: vec![vec![0], vec![1]],
            rank: vec![0, 1],
            crowding: vec![f64::INFINITY, f64::INFINITY],
        };
        let mut rng = StdRng::seed_from_u64(7);
        // Large tournament over two entries always sees both.
        for _ in 0..10 {
            assert_eq!(tournament(&ranking, 8, &mut rng), 0);
        }
    }
}
