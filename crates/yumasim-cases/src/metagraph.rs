// crates/yumasim-cases/src/metagraph.rs
//
// Replay of stored metagraph snapshots as a simulation case.
//
// Each snapshot file is one epoch. Validators are the uids holding a
// validator permit, miners are every uid, and identities are hotkeys so
// that uid reassignment between snapshots is realigned correctly. The
// "shift" scenario lags one validator's weights by one epoch to measure what
// copying last epoch's consensus earns.

use std::fs;
use std::path::Path;

use yumasim_core::{Case, EpochSnapshot, MetagraphSnapshot, YumaError};

/// A case built from a block-ordered series of metagraph snapshots.
#[derive(Debug, Clone)]
pub struct MetagraphCase {
    name: String,
    validators: Vec<String>,
    base_validator: String,
    snapshots: Vec<EpochSnapshot>,
}

impl MetagraphCase {
    /// Build the case from snapshots (sorted by block here).
    ///
    /// # Arguments
    /// * `name` - Case name used in reports.
    /// * `metas` - One snapshot per epoch.
    /// * `shift_validator` - Uid (in the first snapshot) whose weights lag by
    ///   one epoch. The case then spans snapshots 1..n, each epoch using that
    ///   validator's weights from the previous snapshot.
    ///
    /// # Errors
    /// `InvalidConfig` for no snapshots, no validators, or a shift uid that is
    /// not a validator of the first snapshot; `DimensionMismatch` for a
    /// malformed snapshot.
    pub fn from_snapshots(
        name: &str,
        mut metas: Vec<MetagraphSnapshot>,
        shift_validator: Option<usize>,
    ) -> Result<Self, YumaError> {
        for meta in &metas {
            meta.validate()?;
        }
        metas.sort_by_key(|m| m.block);

        let first = metas
            .first()
            .ok_or_else(|| YumaError::InvalidConfig("no metagraph snapshots to replay".to_string()))?;

        let epochs: Vec<EpochSnapshot> = metas.iter().map(to_epoch_snapshot).collect();

        let snapshots = match shift_validator {
            None => epochs,
            Some(uid) => {
                if !first.validator_permit.get(uid).copied().unwrap_or(false) {
                    return Err(YumaError::InvalidConfig(format!(
                        "shift validator uid {} is not a validator at block {}",
                        uid, first.block
                    )));
                }
                if epochs.len() < 2 {
                    return Err(YumaError::InvalidConfig(
                        "shifting weights needs at least two snapshots".to_string(),
                    ));
                }
                let hotkey = first.hotkeys[uid].clone();
                tracing::info!("Lagging weights of validator {} (uid {}) by one epoch", hotkey, uid);
                epochs
                    .windows(2)
                    .map(|pair| shift_row(&pair[1], &pair[0], &hotkey))
                    .collect()
            }
        };

        let mut validators: Vec<String> = Vec::new();
        for snapshot in &snapshots {
            for v in &snapshot.validators {
                if !validators.contains(v) {
                    validators.push(v.clone());
                }
            }
        }

        let base_validator = snapshots
            .first()
            .and_then(|s| {
                s.validators
                    .iter()
                    .zip(&s.stakes)
                    .max_by(|a, b| a.1.total_cmp(b.1))
                    .map(|(v, _)| v.clone())
            })
            .ok_or_else(|| YumaError::InvalidConfig("first snapshot has no validators".to_string()))?;

        tracing::debug!(
            "Metagraph case '{}': {} epochs, {} validators, base {}",
            name,
            snapshots.len(),
            validators.len(),
            base_validator
        );

        Ok(Self {
            name: name.to_string(),
            validators,
            base_validator,
            snapshots,
        })
    }
}

impl Case for MetagraphCase {
    fn name(&self) -> &str {
        &self.name
    }

    fn validators(&self) -> &[String] {
        &self.validators
    }

    fn base_validator(&self) -> &str {
        &self.base_validator
    }

    fn num_epochs(&self) -> usize {
        self.snapshots.len()
    }

    fn snapshot(&self, epoch: usize) -> Result<EpochSnapshot, YumaError> {
        self.snapshots.get(epoch).cloned().ok_or_else(|| {
            YumaError::InvalidConfig(format!(
                "{}: epoch {} out of range for {} epochs",
                self.name,
                epoch,
                self.snapshots.len()
            ))
        })
    }
}

/// Permit holders as validators, every uid as a miner, stake as fractions.
fn to_epoch_snapshot(meta: &MetagraphSnapshot) -> EpochSnapshot {
    let validator_uids = meta.validator_uids();
    let total_stake: f64 = validator_uids.iter().map(|&uid| meta.stakes[uid]).sum();

    EpochSnapshot {
        validators: validator_uids.iter().map(|&uid| meta.hotkeys[uid].clone()).collect(),
        miners: meta.hotkeys.clone(),
        weights: validator_uids.iter().map(|&uid| meta.weights[uid].clone()).collect(),
        stakes: validator_uids
            .iter()
            .map(|&uid| {
                if total_stake > 0.0 {
                    meta.stakes[uid] / total_stake
                } else {
                    0.0
                }
            })
            .collect(),
    }
}

/// `current` with `hotkey`'s weight row replaced by its row in `previous`,
/// re-indexed onto `current`'s miners (zero where absent).
fn shift_row(current: &EpochSnapshot, previous: &EpochSnapshot, hotkey: &str) -> EpochSnapshot {
    let mut shifted = current.clone();
    let Some(row) = current.validators.iter().position(|v| v == hotkey) else {
        return shifted;
    };

    shifted.weights[row] = match previous.validators.iter().position(|v| v == hotkey) {
        Some(prev_row) => current
            .miners
            .iter()
            .map(|miner| {
                previous
                    .miners
                    .iter()
                    .position(|m| m == miner)
                    .map_or(0.0, |col| previous.weights[prev_row][col])
            })
            .collect(),
        None => vec![0.0; current.miners.len()],
    };
    shifted
}

/// Load every `*.json` metagraph snapshot in `dir`, ordered by block.
pub fn load_snapshots_from_dir(dir: &Path) -> Result<Vec<MetagraphSnapshot>, YumaError> {
    let mut metas = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        let contents = fs::read_to_string(&path)?;
        let meta: MetagraphSnapshot = serde_json::from_str(&contents)
            .map_err(|e| YumaError::Serialization(format!("{}: {}", path.display(), e)))?;
        tracing::debug!("Loaded metagraph at block {} from {}", meta.block, path.display());
        metas.push(meta);
    }
    metas.sort_by_key(|m| m.block);
    tracing::info!("Loaded {} metagraph snapshots from {}", metas.len(), dir.display());
    Ok(metas)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Three uids: 0 and 1 validate, 2 only mines.
    fn meta(block: u64, weights: Vec<Vec<f64>>) -> MetagraphSnapshot {
        MetagraphSnapshot {
            block,
            hotkeys: vec!["hk0".into(), "hk1".into(), "hk2".into()],
            stakes: vec![300.0, 100.0, 0.0],
            validator_permit: vec![true, true, false],
            weights,
        }
    }

    fn weights(a: f64) -> Vec<Vec<f64>> {
        vec![
            vec![0.0, 0.0, a],
            vec![0.0, 0.0, 1.0],
            vec![0.0, 0.0, 0.0],
        ]
    }

    #[test]
    fn test_validators_and_stake_fractions() {
        let case = MetagraphCase::from_snapshots("m", vec![meta(10, weights(1.0))], None).unwrap();
        let snapshot = case.snapshot(0).unwrap();
        assert_eq!(snapshot.validators, vec!["hk0", "hk1"]);
        assert_eq!(snapshot.miners.len(), 3);
        assert!((snapshot.stakes[0] - 0.75).abs() < 1e-12);
        assert_eq!(case.base_validator(), "hk0");
    }

    #[test]
    fn test_sorted_by_block() {
        let case = MetagraphCase::from_snapshots(
            "m",
            vec![meta(30, weights(0.3)), meta(10, weights(0.1)), meta(20, weights(0.2))],
            None,
        )
        .unwrap();
        assert_eq!(case.num_epochs(), 3);
        assert_eq!(case.snapshot(0).unwrap().weights[0][2], 0.1);
        assert_eq!(case.snapshot(2).unwrap().weights[0][2], 0.3);
    }

    #[test]
    fn test_shift_lags_one_validator() {
        let case = MetagraphCase::from_snapshots(
            "m",
            vec![meta(10, weights(0.1)), meta(20, weights(0.2)), meta(30, weights(0.3))],
            Some(0),
        )
        .unwrap();
        assert_eq!(case.num_epochs(), 2);
        // Epoch 0 is block 20, with hk0's row from block 10.
        assert_eq!(case.snapshot(0).unwrap().weights[0][2], 0.1);
        assert_eq!(case.snapshot(1).unwrap().weights[0][2], 0.2);
        // Other validators are untouched.
        assert_eq!(case.snapshot(1).unwrap().weights[1][2], 1.0);
    }

    #[test]
    fn test_shift_requires_validator_uid() {
        let err = MetagraphCase::from_snapshots(
            "m",
            vec![meta(10, weights(0.1)), meta(20, weights(0.2))],
            Some(2),
        )
        .unwrap_err();
        assert!(matches!(err, YumaError::InvalidConfig(_)));
    }

    #[test]
    fn test_empty_rejected() {
        assert!(MetagraphCase::from_snapshots("m", vec![], None).is_err());
    }

    #[test]
    fn test_load_from_dir() {
        let dir = tempfile::tempdir().unwrap();
        for (file, block) in [("b.json", 20u64), ("a.json", 30), ("c.json", 10)] {
            let json = serde_json::to_string(&meta(block, weights(block as f64))).unwrap();
            fs::write(dir.path().join(file), json).unwrap();
        }
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let metas = load_snapshots_from_dir(dir.path()).unwrap();
        let blocks: Vec<u64> = metas.iter().map(|m| m.block).collect();
        assert_eq!(blocks, vec![10, 20, 30]);
    }

    #[test]
    fn test_load_malformed_json() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("bad.json"), "{ not json").unwrap();
        let err = load_snapshots_from_dir(dir.path()).unwrap_err();
        assert!(matches!(err, YumaError::Serialization(_)));
    }
}
