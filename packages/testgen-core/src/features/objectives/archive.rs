//! Solution archive
//!
//! Best encoding found per covered objective. Once an objective has an
//! entry it stays covered; a later candidate only displaces the stored one
//! when the caller forces it or a secondary objective prefers it.

use rustc_hash::FxHashMap;
use tracing::debug;

use crate::config::SecondaryObjective;
use crate::features::search::Encoding;

use super::objective::ObjectiveId;

/// Covered objective → best encoding seen for it
#[derive(Debug, Clone)]
pub struct Archive<E: Encoding> {
    entries: FxHashMap<ObjectiveId, E>,
    /// Objective ids in first-cover order
    order: Vec<ObjectiveId>,
    /// Tie-breakers applied in order when a new candidate also covers an
    /// already-archived objective
    secondary_objectives: Vec<SecondaryObjective>,
}

impl<E: Encoding> Archive<E> {
    pub fn new(secondary_objectives: Vec<SecondaryObjective>) -> Self {
        Self {
            entries: FxHashMap::default(),
            order: Vec::new(),
            secondary_objectives,
        }
    }

    /// Record `encoding` as covering `objective`. Returns true when the
    /// archive changed: first cover, forced replacement, or a win on a
    /// secondary objective.
    pub fn update(&mut self, objective: &ObjectiveId, encoding: &E, force_replace: bool) -> bool {
        match self.entries.get(objective) {
            None => {
                self.order.push(objective.clone());
                self.entries.insert(objective.clone(), encoding.clone());
                debug!(objective = %objective, encoding = encoding.id(), "objective archived");
                true
            }
            Some(existing) => {
                if existing.id() == encoding.id() {
                    return false;
                }
                if force_replace || self.prefers(encoding, existing) {
                    self.entries.insert(objective.clone(), encoding.clone());
                    debug!(
                        objective = %objective,
                        encoding = encoding.id(),
                        "archived encoding replaced"
                    );
                    return true;
                }
                false
            }
        }
    }

    /// Fold another archive into this one, keeping the better entry per
    /// objective under the secondary objectives.
    pub fn merge(&mut self, other: &Archive<E>) {
        for objective in &other.order {
            if let Some(encoding) = other.entries.get(objective) {
                self.update(objective, encoding, false);
            }
        }
    }

    fn prefers(&self, candidate: &E, incumbent: &E) -> bool {
        for secondary in &self.secondary_objectives {
            match secondary {
                SecondaryObjective::EncodingSize => {
                    if candidate.size() < incumbent.size() {
                        return true;
                    }
                    if candidate.size() > incumbent.size() {
                        return false;
                    }
                }
            }
        }
        false
    }

    pub fn get(&self, objective: &str) -> Option<&E> {
        self.entries.get(objective)
    }

    pub fn contains(&self, objective: &str) -> bool {
        self.entries.contains_key(objective)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Covered objectives in first-cover order
    pub fn objectives(&self) -> &[ObjectiveId] {
        &self.order
    }

    /// Archived encodings in first-cover order
    pub fn encodings(&self) -> impl Iterator<Item = &E> {
        self.order.iter().filter_map(|id| self.entries.get(id))
    }
}
