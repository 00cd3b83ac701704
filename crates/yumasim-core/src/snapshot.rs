// crates/yumasim-core/src/snapshot.rs
//
// One epoch of case input: who is active, what they weighted, what they stake.

use serde::{Deserialize, Serialize};

use crate::error::YumaError;
use crate::identity::Roster;

/// Weights and stake for a single epoch, with the identities they are indexed by.
///
/// `weights[v][m]` is validator `validators[v]`'s raw weight on miner
/// `miners[m]`; `stakes[v]` is that validator's raw stake. Neither needs to be
/// normalized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochSnapshot {
    pub validators: Vec<String>,
    pub miners: Vec<String>,
    pub weights: Vec<Vec<f64>>,
    pub stakes: Vec<f64>,
}

impl EpochSnapshot {
    /// Check shapes and values; a malformed snapshot is rejected outright.
    pub fn validate(&self) -> Result<(), YumaError> {
        let n_validators = self.validators.len();
        let n_miners = self.miners.len();

        if n_validators == 0 || n_miners == 0 {
            return Err(YumaError::InvalidConfig(format!(
                "snapshot needs at least one validator and one miner, got {}x{}",
                n_validators, n_miners
            )));
        }
        if self.weights.len() != n_validators {
            return Err(YumaError::DimensionMismatch(format!(
                "{} weight rows for {} validators",
                self.weights.len(),
                n_validators
            )));
        }
        if self.stakes.len() != n_validators {
            return Err(YumaError::DimensionMismatch(format!(
                "{} stakes for {} validators",
                self.stakes.len(),
                n_validators
            )));
        }
        for (v, row) in self.weights.iter().enumerate() {
            if row.len() != n_miners {
                return Err(YumaError::DimensionMismatch(format!(
                    "weight row {} has {} entries for {} miners",
                    v,
                    row.len(),
                    n_miners
                )));
            }
            if let Some(w) = row.iter().find(|w| !w.is_finite() || **w < 0.0) {
                return Err(YumaError::InvalidConfig(format!(
                    "weight row {} contains invalid value {}",
                    v, w
                )));
            }
        }
        if let Some(s) = self.stakes.iter().find(|s| !s.is_finite() || **s < 0.0) {
            return Err(YumaError::InvalidConfig(format!(
                "stake vector contains invalid value {}",
                s
            )));
        }
        Ok(())
    }

    /// Identity rosters for this epoch's rows and columns.
    pub fn rosters(&self) -> Result<(Roster, Roster), YumaError> {
        Ok((
            Roster::new(self.validators.clone())?,
            Roster::new(self.miners.clone())?,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> EpochSnapshot {
        EpochSnapshot {
            validators: vec!["A".into(), "B".into()],
            miners: vec!["Server 1".into(), "Server 2".into()],
            weights: vec![vec![1.0, 0.0], vec![0.0, 1.0]],
            stakes: vec![0.5, 0.5],
        }
    }

    #[test]
    fn test_valid_snapshot() {
        assert!(snapshot().validate().is_ok());
    }

    #[test]
    fn test_row_count_mismatch() {
        let mut s = snapshot();
        s.weights.pop();
        assert!(matches!(s.validate(), Err(YumaError::DimensionMismatch(_))));
    }

    #[test]
    fn test_column_count_mismatch() {
        let mut s = snapshot();
        s.weights[1].push(0.3);
        assert!(matches!(s.validate(), Err(YumaError::DimensionMismatch(_))));
    }

    #[test]
    fn test_negative_stake_rejected() {
        let mut s = snapshot();
        s.stakes[0] = -1.0;
        assert!(matches!(s.validate(), Err(YumaError::InvalidConfig(_))));
    }

    #[test]
    fn test_empty_miners_rejected() {
        let mut s = snapshot();
        s.miners.clear();
        s.weights = vec![vec![], vec![]];
        assert!(matches!(s.validate(), Err(YumaError::InvalidConfig(_))));
    }

    #[test]
    fn test_nan_weight_rejected() {
        let mut s = snapshot();
        s.weights[0][1] = f64::NAN;
        assert!(s.validate().is_err());
    }
}
