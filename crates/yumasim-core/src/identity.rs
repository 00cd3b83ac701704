// crates/yumasim-core/src/identity.rs
//
// Identity rosters for validators and miners.
//
// Matrices threaded between epochs are indexed positionally. When the set of
// active validators or miners changes, a Roster maps each identity in the new
// epoch back to its position in the previous one so state can be carried by
// identity rather than by position.

use std::collections::HashMap;

use crate::error::YumaError;

/// An ordered set of identities (validator names, hotkeys, miner names).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Roster {
    ids: Vec<String>,
    index: HashMap<String, usize>,
}

impl Roster {
    /// Build a roster. Duplicate identities are rejected.
    pub fn new(ids: Vec<String>) -> Result<Self, YumaError> {
        let mut index = HashMap::with_capacity(ids.len());
        for (i, id) in ids.iter().enumerate() {
            if index.insert(id.clone(), i).is_some() {
                return Err(YumaError::InvalidConfig(format!(
                    "duplicate identity '{}' in roster",
                    id
                )));
            }
        }
        Ok(Self { ids, index })
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    /// Position of `id` in this roster.
    pub fn position(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    /// For each identity of `next`, its index in `self` (None for entrants).
    pub fn remap_to(&self, next: &Roster) -> Vec<Option<usize>> {
        next.ids.iter().map(|id| self.position(id)).collect()
    }

    /// Whether `next` lists exactly the same identities in the same order.
    pub fn same_order(&self, next: &Roster) -> bool {
        self.ids == next.ids
    }
}
