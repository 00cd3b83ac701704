// crates/yumasim-consensus/src/bonds.rs
//
// Bond matrix management and the bonding rules of every Yuma variant.
//
// Bonds represent a validator's accumulated stake-weighted trust in a miner.
// The EMA rules (Rust, Classic, Delayed) rebuild column-normalized bonds each
// epoch and smooth them against the previous ones. The purchase rules
// (Capacity, Relative) decay the previous bonds and buy more up to a cap.

use serde::{Deserialize, Serialize};

use yumasim_core::Roster;

use crate::weights::{realign_rows, WeightMatrix, NORMALIZATION_EPSILON};

/// Largest bond a capacity-bonding validator can hold per unit of stake.
pub const MAXINT: f64 = u64::MAX as f64;

/// Upper bound of a relative bond cell.
pub const RELATIVE_BOND_CAP: f64 = 1.0;

/// A dense bond matrix where B[validator_idx][miner_idx] = bond value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BondMatrix {
    /// Dense bond matrix: bonds[validator_idx][miner_idx].
    pub bonds: Vec<Vec<f64>>,
}

/// EMA rate applied to fresh bonds: one value, or one per miner (liquid alpha).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BondAlpha {
    Fixed(f64),
    PerMiner(Vec<f64>),
}

impl BondAlpha {
    pub fn for_miner(&self, m: usize) -> f64 {
        match self {
            BondAlpha::Fixed(alpha) => *alpha,
            BondAlpha::PerMiner(alphas) => alphas[m],
        }
    }
}

/// Output of one bonding step.
#[derive(Debug, Clone)]
pub struct BondUpdate {
    /// Bonds threaded to the next epoch.
    pub bonds: BondMatrix,
    /// Freshly formed bonds before smoothing (EMA rules only).
    pub instant_bonds: Option<BondMatrix>,
    /// Weights the fresh bonds were formed from (Classic/Delayed only).
    pub weight_for_bond: Option<WeightMatrix>,
}

impl BondMatrix {
    /// Create a new zero-initialized bond matrix.
    pub fn new(validators: usize, miners: usize) -> Self {
        Self {
            bonds: vec![vec![0.0; miners]; validators],
        }
    }

    pub fn from_rows(bonds: Vec<Vec<f64>>) -> Self {
        Self { bonds }
    }

    pub fn get(&self, v: usize, m: usize) -> f64 {
        self.bonds[v][m]
    }

    pub fn n_validators(&self) -> usize {
        self.bonds.len()
    }

    pub fn n_miners(&self) -> usize {
        self.bonds.first().map_or(0, |row| row.len())
    }

    /// Largest cell value, 0.0 for an empty matrix.
    pub fn max_value(&self) -> f64 {
        self.bonds
            .iter()
            .flat_map(|row| row.iter().copied())
            .fold(0.0, f64::max)
    }

    pub fn column_sums(&self) -> Vec<f64> {
        let mut sums = vec![0.0; self.n_miners()];
        for row in &self.bonds {
            for (acc, &b) in sums.iter_mut().zip(row) {
                *acc += b;
            }
        }
        sums
    }

    /// Divide each column by (column sum + NORMALIZATION_EPSILON).
    pub fn normalize_columns(&mut self) {
        let sums = self.column_sums();
        for row in &mut self.bonds {
            for (b, &sum) in row.iter_mut().zip(&sums) {
                *b /= sum + NORMALIZATION_EPSILON;
            }
        }
    }

    /// Zero every validator's bond on miner `m`.
    pub fn reset_column(&mut self, m: usize) {
        for row in &mut self.bonds {
            if let Some(b) = row.get_mut(m) {
                *b = 0.0;
            }
        }
    }

    /// Per-validator sum over miners of B[v][m] * incentive[m].
    pub fn weighted_by(&self, incentive: &[f64]) -> Vec<f64> {
        self.bonds
            .iter()
            .map(|row| row.iter().zip(incentive).map(|(&b, &i)| b * i).sum())
            .collect()
    }

    /// Re-index bonds from one pair of rosters to another.
    ///
    /// Bonds follow their validator and miner identities; entrants start at
    /// zero and leavers are dropped.
    pub fn realign(
        &self,
        old_validators: &Roster,
        old_miners: &Roster,
        new_validators: &Roster,
        new_miners: &Roster,
    ) -> Self {
        if old_validators.same_order(new_validators) && old_miners.same_order(new_miners) {
            return self.clone();
        }
        Self {
            bonds: realign_rows(
                &self.bonds,
                &old_validators.remap_to(new_validators),
                &old_miners.remap_to(new_miners),
            ),
        }
    }

    /// alpha * self + (1 - alpha) * prev, or a copy of self without `prev`.
    pub fn ema(&self, prev: Option<&BondMatrix>, alpha: &BondAlpha) -> Self {
        let Some(prev) = prev else {
            return self.clone();
        };
        Self {
            bonds: self
                .bonds
                .iter()
                .zip(&prev.bonds)
                .map(|(row, prow)| {
                    row.iter()
                        .zip(prow)
                        .enumerate()
                        .map(|(m, (&b, &old))| {
                            let a = alpha.for_miner(m);
                            a * b + (1.0 - a) * old
                        })
                        .collect()
                })
                .collect(),
        }
    }
}

/// B[v][m] = stake[v] * W[v][m].
fn stake_weighted(weights: &WeightMatrix, stakes: &[f64]) -> BondMatrix {
    BondMatrix {
        bonds: weights
            .weights
            .iter()
            .zip(stakes)
            .map(|(row, &s)| row.iter().map(|&w| s * w).collect())
            .collect(),
    }
}

/// Rust-rule bonds (Yuma 0).
///
/// Fresh bonds are stake-weighted clipped weights, column-normalized with the
/// epsilon guard. The EMA is column-normalized again before it is threaded.
pub fn rust_bonds(
    clipped: &WeightMatrix,
    stakes: &[f64],
    prev: Option<&BondMatrix>,
    alpha: &BondAlpha,
) -> BondUpdate {
    let mut fresh = stake_weighted(clipped, stakes);
    fresh.normalize_columns();

    let mut ema = fresh.ema(prev, alpha);
    ema.normalize_columns();

    BondUpdate {
        bonds: ema,
        instant_bonds: Some(fresh),
        weight_for_bond: None,
    }
}

/// Classic-rule bonds (Yuma 1, and Yuma 2 when `weights` are the previous epoch's).
///
/// W_b = (1 - bond_penalty) * W + bond_penalty * W_clipped; fresh bonds are
/// stake-weighted W_b divided by its column sums, zero-filled for empty
/// columns. The EMA is threaded as-is.
pub fn classic_bonds(
    weights: &WeightMatrix,
    clipped: &WeightMatrix,
    stakes: &[f64],
    bond_penalty: f64,
    prev: Option<&BondMatrix>,
    alpha: &BondAlpha,
) -> BondUpdate {
    let weight_for_bond = weights.blend(clipped, bond_penalty);

    let mut fresh = stake_weighted(&weight_for_bond, stakes);
    let sums = fresh.column_sums();
    for row in &mut fresh.bonds {
        for (b, &sum) in row.iter_mut().zip(&sums) {
            *b = if sum != 0.0 { *b / sum } else { 0.0 };
        }
    }

    let ema = fresh.ema(prev, alpha);

    BondUpdate {
        bonds: ema,
        instant_bonds: Some(fresh),
        weight_for_bond: Some(weight_for_bond),
    }
}

/// Capacity-rule bonds (Yuma 3).
///
/// Each validator may hold up to stake * MAXINT per miner. Every epoch the
/// old bonds decay by `decay_rate` and the validator buys
/// min(capacity_alpha * capacity, remaining capacity), spread over miners by
/// weight. The result is clamped to the capacity.
pub fn capacity_bonds(
    weights: &WeightMatrix,
    stakes: &[f64],
    prev: Option<&BondMatrix>,
    capacity_alpha: f64,
    decay_rate: f64,
) -> BondUpdate {
    let n_miners = weights.n_miners();
    let decay = 1.0 - decay_rate;

    let bonds = weights
        .weights
        .iter()
        .zip(stakes)
        .enumerate()
        .map(|(v, (row, &s))| {
            let capacity = s * MAXINT;
            (0..n_miners)
                .map(|m| {
                    let old = prev.map_or(0.0, |p| p.bonds[v][m]);
                    let remaining = (capacity - old).max(0.0);
                    let purchase = (capacity_alpha * capacity).min(remaining) * row[m];
                    (decay * old + purchase).min(capacity)
                })
                .collect()
        })
        .collect();

    BondUpdate {
        bonds: BondMatrix { bonds },
        instant_bonds: None,
        weight_for_bond: None,
    }
}

/// Relative-rule bonds (Yuma 4).
///
/// Each cell decays by its miner's alpha and buys alpha * W back, never past
/// RELATIVE_BOND_CAP.
pub fn relative_bonds(
    weights: &WeightMatrix,
    prev: Option<&BondMatrix>,
    alpha: &BondAlpha,
) -> BondUpdate {
    let bonds = weights
        .weights
        .iter()
        .enumerate()
        .map(|(v, row)| {
            row.iter()
                .enumerate()
                .map(|(m, &w)| {
                    let a = alpha.for_miner(m);
                    let old = prev.map_or(0.0, |p| p.bonds[v][m]);
                    let decayed = old * (1.0 - a);
                    let remaining = (RELATIVE_BOND_CAP - decayed).max(0.0);
                    let purchase = (a * w).min(remaining);
                    (decayed + purchase).min(RELATIVE_BOND_CAP)
                })
                .collect()
        })
        .collect();

    BondUpdate {
        bonds: BondMatrix { bonds },
        instant_bonds: None,
        weight_for_bond: None,
    }
}
