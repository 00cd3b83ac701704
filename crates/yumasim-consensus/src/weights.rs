// crates/yumasim-consensus/src/weights.rs
//
// Weight matrix management and normalization for the Yuma simulator.
//
// The weight matrix W[validator][miner] stores each validator's raw weight
// assignment for each miner in the current epoch. Also hosts the small
// vector helpers every Yuma step shares: stake normalization, stake-weighted
// column sums, and zero-filled division.

use serde::{Deserialize, Serialize};

use yumasim_core::Roster;

/// Added to denominators so all-zero rows and columns never divide by zero.
pub const NORMALIZATION_EPSILON: f64 = 1e-6;

/// A dense weight matrix where W[validator_idx][miner_idx] = weight.
///
/// After `normalize`, each validator's row sums to 1.0 (less the epsilon
/// guard); an all-zero row stays all zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeightMatrix {
    /// Dense weight matrix: weights[validator_idx][miner_idx].
    pub weights: Vec<Vec<f64>>,
}

impl WeightMatrix {
    /// Create a new zero-initialized weight matrix.
    pub fn new(validators: usize, miners: usize) -> Self {
        Self {
            weights: vec![vec![0.0; miners]; validators],
        }
    }

    pub fn from_rows(weights: Vec<Vec<f64>>) -> Self {
        Self { weights }
    }

    /// Set the weight for validator `v` on miner `m`.
    pub fn set(&mut self, v: usize, m: usize, w: f64) {
        self.weights[v][m] = w;
    }

    /// Get the weight for validator `v` on miner `m`.
    pub fn get(&self, v: usize, m: usize) -> f64 {
        self.weights[v][m]
    }

    pub fn n_validators(&self) -> usize {
        self.weights.len()
    }

    pub fn n_miners(&self) -> usize {
        self.weights.first().map_or(0, |row| row.len())
    }

    /// Divide each row by (row sum + NORMALIZATION_EPSILON).
    pub fn normalize(&mut self) {
        for row in &mut self.weights {
            let sum: f64 = row.iter().sum();
            for w in row.iter_mut() {
                *w /= sum + NORMALIZATION_EPSILON;
            }
        }
    }

    /// Row-normalized copy of this matrix.
    pub fn normalized(&self) -> Self {
        let mut out = self.clone();
        out.normalize();
        out
    }

    pub fn row_sums(&self) -> Vec<f64> {
        self.weights.iter().map(|row| row.iter().sum()).collect()
    }

    /// Weights of every validator on miner `m`.
    pub fn column(&self, m: usize) -> Vec<f64> {
        self.weights.iter().map(|row| row[m]).collect()
    }

    /// Elementwise min against a per-miner cap: W_clipped[v][m] = min(W[v][m], cap[m]).
    pub fn clip_to(&self, caps: &[f64]) -> Self {
        Self {
            weights: self
                .weights
                .iter()
                .map(|row| row.iter().zip(caps).map(|(&w, &c)| w.min(c)).collect())
                .collect(),
        }
    }

    /// (1 - penalty) * self + penalty * clipped.
    pub fn blend(&self, clipped: &WeightMatrix, penalty: f64) -> Self {
        Self {
            weights: self
                .weights
                .iter()
                .zip(&clipped.weights)
                .map(|(row, crow)| {
                    row.iter()
                        .zip(crow)
                        .map(|(&w, &c)| (1.0 - penalty) * w + penalty * c)
                        .collect()
                })
                .collect(),
        }
    }

    /// Per-miner sum over validators of stake[v] * W[v][m].
    pub fn stake_weighted_column_sums(&self, stakes: &[f64]) -> Vec<f64> {
        let mut sums = vec![0.0; self.n_miners()];
        for (row, &s) in self.weights.iter().zip(stakes) {
            for (acc, &w) in sums.iter_mut().zip(row) {
                *acc += s * w;
            }
        }
        sums
    }

    /// Re-index this matrix from one pair of rosters to another.
    ///
    /// Rows and columns are carried by identity; entrants are zero.
    pub fn realign(
        &self,
        old_validators: &Roster,
        old_miners: &Roster,
        new_validators: &Roster,
        new_miners: &Roster,
    ) -> Self {
        Self {
            weights: realign_rows(
                &self.weights,
                &old_validators.remap_to(new_validators),
                &old_miners.remap_to(new_miners),
            ),
        }
    }
}

/// Rebuild `rows` so that new row `i` / column `j` takes old row
/// `row_map[i]` / column `col_map[j]`, or 0.0 where the map is None.
pub(crate) fn realign_rows(
    rows: &[Vec<f64>],
    row_map: &[Option<usize>],
    col_map: &[Option<usize>],
) -> Vec<Vec<f64>> {
    row_map
        .iter()
        .map(|old_row| match old_row {
            Some(r) => col_map
                .iter()
                .map(|old_col| old_col.map_or(0.0, |c| rows[*r][c]))
                .collect(),
            None => vec![0.0; col_map.len()],
        })
        .collect()
}

/// Normalize stake to sum to 1.0; a zero-sum vector becomes all zeros.
pub fn normalize_stake(stakes: &[f64]) -> Vec<f64> {
    let total: f64 = stakes.iter().sum();
    if total > 0.0 {
        stakes.iter().map(|&s| s / total).collect()
    } else {
        vec![0.0; stakes.len()]
    }
}

/// values / sum(values), zero-filled when the sum is zero.
pub fn normalize_or_zero(values: &[f64]) -> Vec<f64> {
    let total: f64 = values.iter().sum();
    values
        .iter()
        .map(|&v| finite_or_zero(v / total))
        .collect()
}

/// values / (sum(values) + NORMALIZATION_EPSILON).
pub fn normalize_with_epsilon(values: &[f64]) -> Vec<f64> {
    let total: f64 = values.iter().sum();
    values
        .iter()
        .map(|&v| finite_or_zero(v / (total + NORMALIZATION_EPSILON)))
        .collect()
}

/// Elementwise num / den with NaN and infinities replaced by 0.0.
pub fn ratio_or_zero(num: &[f64], den: &[f64]) -> Vec<f64> {
    num.iter()
        .zip(den)
        .map(|(&n, &d)| finite_or_zero(n / d))
        .collect()
}

pub(crate) fn finite_or_zero(x: f64) -> f64 {
    if x.is_finite() {
        x
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_rows() {
        let mut wm = WeightMatrix::from_rows(vec![vec![3.0, 1.0], vec![0.0, 0.0], vec![0.2, 0.2]]);
        wm.normalize();
        let sums = wm.row_sums();
        assert!((sums[0] - 1.0).abs() < 1e-5);
        assert_eq!(sums[1], 0.0);
        assert!((sums[2] - 1.0).abs() < 1e-5);
        assert!((wm.get(0, 0) - 0.75).abs() < 1e-5);
    }

    #[test]
    fn test_normalize_stake_zero_sum() {
        assert_eq!(normalize_stake(&[0.0, 0.0]), vec![0.0, 0.0]);
        let s = normalize_stake(&[2.0, 6.0]);
        assert!((s[0] - 0.25).abs() < 1e-12);
        assert!((s[1] - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_clip_and_blend() {
        let wm = WeightMatrix::from_rows(vec![vec![0.8, 0.2], vec![0.1, 0.9]]);
        let clipped = wm.clip_to(&[0.5, 0.5]);
        assert_eq!(clipped.weights, vec![vec![0.5, 0.2], vec![0.1, 0.5]]);

        let blended = wm.blend(&clipped, 0.5);
        assert!((blended.get(0, 0) - 0.65).abs() < 1e-12);
        assert!((blended.get(1, 1) - 0.7).abs() < 1e-12);
    }

    #[test]
    fn test_stake_weighted_column_sums() {
        let wm = WeightMatrix::from_rows(vec![vec![1.0, 0.0], vec![0.5, 0.5]]);
        let sums = wm.stake_weighted_column_sums(&[0.8, 0.2]);
        assert!((sums[0] - 0.9).abs() < 1e-12);
        assert!((sums[1] - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_zero_filled_division() {
        assert_eq!(normalize_or_zero(&[0.0, 0.0]), vec![0.0, 0.0]);
        assert_eq!(ratio_or_zero(&[1.0, 0.0], &[2.0, 0.0]), vec![0.5, 0.0]);
        assert_eq!(normalize_with_epsilon(&[0.0, 0.0]), vec![0.0, 0.0]);
    }

    #[test]
    fn test_realign_carries_by_identity() {
        let roster = |ids: &[&str]| Roster::new(ids.iter().map(|s| s.to_string()).collect()).unwrap();
        let wm = WeightMatrix::from_rows(vec![vec![0.1, 0.2], vec![0.3, 0.4]]);
        let moved = wm.realign(
            &roster(&["a", "b"]),
            &roster(&["x", "y"]),
            &roster(&["b", "c"]),
            &roster(&["y", "z", "x"]),
        );
        assert_eq!(moved.weights, vec![vec![0.4, 0.0, 0.3], vec![0.0, 0.0, 0.0]]);
    }
}
