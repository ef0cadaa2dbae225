//! Objective manager
//!
//! Owns the registered objectives of a search run: which ones are covered,
//! which ones the algorithm currently optimizes for, and how new targets
//! become current as the search progresses.

use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;

use crate::config::ObjectiveStrategy;

use super::objective::{ObjectiveFunction, ObjectiveId, ObjectiveKind};
use super::subject::SearchSubject;

/// Coverage of one objective kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KindCoverage {
    pub kind: ObjectiveKind,
    pub covered: usize,
    pub total: usize,
}

/// Coverage snapshot across all registered objectives
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverageSummary {
    pub covered: usize,
    pub total: usize,
    pub per_kind: Vec<KindCoverage>,
}

/// Tracks objective state for one search run
#[derive(Debug)]
pub struct ObjectiveManager {
    strategy: ObjectiveStrategy,
    functions: FxHashMap<ObjectiveId, Arc<dyn ObjectiveFunction>>,
    /// Ids in registration order; all iteration over objectives follows
    /// this order so runs with the same seed replay identically.
    registration_order: Vec<ObjectiveId>,
    roots: Vec<ObjectiveId>,
    dependencies: FxHashMap<ObjectiveId, Vec<ObjectiveId>>,
    covered: FxHashSet<ObjectiveId>,
    current: Vec<ObjectiveId>,
}

impl ObjectiveManager {
    pub fn new(strategy: ObjectiveStrategy) -> Self {
        Self {
            strategy,
            functions: FxHashMap::default(),
            registration_order: Vec::new(),
            roots: Vec::new(),
            dependencies: FxHashMap::default(),
            covered: FxHashSet::default(),
            current: Vec::new(),
        }
    }

    /// Register a subject's objectives and reset coverage state.
    pub fn load(&mut self, subject: &SearchSubject) {
        self.functions.clear();
        self.registration_order.clear();
        self.covered.clear();
        for objective in subject.objectives() {
            let id = objective.id().clone();
            if self.functions.insert(id.clone(), objective.clone()).is_none() {
                self.registration_order.push(id);
            }
        }
        self.roots = subject.roots().to_vec();
        self.dependencies = subject.dependencies().clone();
        self.recompute_current();
        debug!(
            objectives = self.registration_order.len(),
            current = self.current.len(),
            strategy = ?self.strategy,
            "objectives loaded"
        );
    }

    /// Record the distances of an evaluated individual. Objectives at
    /// distance 0 become covered; returns the ones newly covered by this
    /// update, in registration order.
    pub fn update(&mut self, distances: &FxHashMap<ObjectiveId, f64>) -> Vec<ObjectiveId> {
        let mut newly_covered = Vec::new();
        for id in &self.registration_order {
            if self.covered.contains(id) {
                continue;
            }
            if let Some(&d) = distances.get(id) {
                if d == 0.0 {
                    self.covered.insert(id.clone());
                    newly_covered.push(id.clone());
                }
            }
        }
        if !newly_covered.is_empty() {
            self.recompute_current();
        }
        newly_covered
    }

    /// Objectives the algorithm should rank against right now
    pub fn current(&self) -> &[ObjectiveId] {
        &self.current
    }

    pub fn objective(&self, id: &str) -> Option<&Arc<dyn ObjectiveFunction>> {
        self.functions.get(id)
    }

    /// All registered objectives, in registration order
    pub fn all(&self) -> impl Iterator<Item = &Arc<dyn ObjectiveFunction>> {
        self.registration_order
            .iter()
            .filter_map(|id| self.functions.get(id))
    }

    pub fn covered(&self) -> &FxHashSet<ObjectiveId> {
        &self.covered
    }

    pub fn is_covered(&self, id: &str) -> bool {
        self.covered.contains(id)
    }

    /// Registered objectives not yet covered, in registration order
    pub fn uncovered(&self) -> Vec<ObjectiveId> {
        self.registration_order
            .iter()
            .filter(|id| !self.covered.contains(*id))
            .cloned()
            .collect()
    }

    /// Whether every registered objective has been covered
    pub fn done(&self) -> bool {
        self.covered.len() == self.registration_order.len()
    }

    pub fn coverage(&self) -> CoverageSummary {
        let mut per_kind: Vec<KindCoverage> = Vec::new();
        for id in &self.registration_order {
            let Some(objective) = self.functions.get(id) else {
                continue;
            };
            let kind = objective.kind();
            let slot = match per_kind.iter().position(|k| k.kind == kind) {
                Some(i) => i,
                None => {
                    per_kind.push(KindCoverage {
                        kind,
                        covered: 0,
                        total: 0,
                    });
                    per_kind.len() - 1
                }
            };
            per_kind[slot].total += 1;
            if self.covered.contains(id) {
                per_kind[slot].covered += 1;
            }
        }
        CoverageSummary {
            covered: self.covered.len(),
            total: self.registration_order.len(),
            per_kind,
        }
    }

    fn recompute_current(&mut self) {
        self.current = match self.strategy {
            // Every registered objective stays in play for the whole run.
            ObjectiveStrategy::Simple => self.registration_order.clone(),
            ObjectiveStrategy::UncoveredOnly => self.uncovered(),
            ObjectiveStrategy::Structural => {
                // Expose roots, then walk the dependency edges outward from
                // covered objectives.
                let mut exposed: FxHashSet<&ObjectiveId> = FxHashSet::default();
                let mut queue: Vec<&ObjectiveId> = Vec::new();
                for root in &self.roots {
                    if exposed.insert(root) {
                        queue.push(root);
                    }
                }
                while let Some(id) = queue.pop() {
                    if !self.covered.contains(id) {
                        continue;
                    }
                    if let Some(children) = self.dependencies.get(id) {
                        for child in children {
                            if exposed.insert(child) {
                                queue.push(child);
                            }
                        }
                    }
                }
                self.registration_order
                    .iter()
                    .filter(|id| exposed.contains(id) && !self.covered.contains(*id))
                    .cloned()
                    .collect()
            }
        };
    }
}
