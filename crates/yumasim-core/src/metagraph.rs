// crates/yumasim-core/src/metagraph.rs

use serde::{Deserialize, Serialize};

use crate::error::YumaError;

/// A stored metagraph snapshot for one epoch of a subnet.
///
/// Indexed by uid: `hotkeys[uid]`, `stakes[uid]`, `validator_permit[uid]`,
/// and `weights[uid][target_uid]`. Snapshots are produced by external
/// tooling; this crate only reads them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetagraphSnapshot {
    /// Block height the snapshot was taken at.
    pub block: u64,
    /// Hotkey per uid.
    pub hotkeys: Vec<String>,
    /// Total stake per uid.
    pub stakes: Vec<f64>,
    /// Whether the uid holds a validator permit.
    pub validator_permit: Vec<bool>,
    /// Weight matrix W[uid][target_uid].
    pub weights: Vec<Vec<f64>>,
}

impl MetagraphSnapshot {
    pub fn n_uids(&self) -> usize {
        self.hotkeys.len()
    }

    /// Uids that hold a validator permit.
    pub fn validator_uids(&self) -> Vec<usize> {
        self.validator_permit
            .iter()
            .enumerate()
            .filter(|(_, permit)| **permit)
            .map(|(uid, _)| uid)
            .collect()
    }

    /// Check that every per-uid field has the same length.
    pub fn validate(&self) -> Result<(), YumaError> {
        let n = self.n_uids();
        if self.stakes.len() != n || self.validator_permit.len() != n || self.weights.len() != n {
            return Err(YumaError::DimensionMismatch(format!(
                "block {}: {} hotkeys, {} stakes, {} permits, {} weight rows",
                self.block,
                n,
                self.stakes.len(),
                self.validator_permit.len(),
                self.weights.len()
            )));
        }
        if let Some((uid, row)) = self.weights.iter().enumerate().find(|(_, r)| r.len() != n) {
            return Err(YumaError::DimensionMismatch(format!(
                "block {}: weight row {} has {} entries for {} uids",
                self.block,
                uid,
                row.len(),
                n
            )));
        }
        Ok(())
    }
}
