// crates/yumasim-consensus/src/threshold.rs
//
// Per-miner consensus threshold by bisection.
//
// For each miner the threshold is the smallest weight c such that the stake
// of validators weighting that miner strictly above c does not exceed kappa.
// The search runs over [0, 1] and stops once the bracket is narrower than
// 1 / consensus_precision, so its cost per (miner, epoch) is fixed.

use crate::weights::WeightMatrix;

/// Number of steps in the grid consensus values are quantized onto.
pub const CONSENSUS_GRID_STEPS: f64 = 65_535.0;

/// Final bracket of a threshold search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bracket {
    pub low: f64,
    pub high: f64,
    pub iterations: u32,
}

impl Bracket {
    /// The threshold the search converged to (the upper end).
    pub fn threshold(&self) -> f64 {
        self.high
    }

    pub fn width(&self) -> f64 {
        self.high - self.low
    }
}

/// Bisect for one miner's threshold.
///
/// # Arguments
/// * `column` - Normalized weight of every validator on this miner.
/// * `stakes` - Normalized stake of every validator.
/// * `kappa` - Maximum stake fraction allowed strictly above the threshold.
/// * `precision` - Stop once high - low <= 1 / precision.
pub fn bisect_threshold(column: &[f64], stakes: &[f64], kappa: f64, precision: u32) -> Bracket {
    let tolerance = 1.0 / f64::from(precision);
    let mut low = 0.0;
    let mut high = 1.0;
    let mut iterations = 0;

    while high - low > tolerance {
        let mid = (high + low) / 2.0;
        let stake_above: f64 = column
            .iter()
            .zip(stakes)
            .filter(|(&w, _)| w > mid)
            .map(|(_, &s)| s)
            .sum();
        if stake_above > kappa {
            // Too much stake above mid: the threshold lies higher.
            low = mid;
        } else {
            high = mid;
        }
        iterations += 1;
    }

    Bracket {
        low,
        high,
        iterations,
    }
}

/// Threshold for every miner, evaluated column by column.
pub fn consensus_thresholds(
    weights: &WeightMatrix,
    stakes: &[f64],
    kappa: f64,
    precision: u32,
) -> Vec<f64> {
    (0..weights.n_miners())
        .map(|m| bisect_threshold(&weights.column(m), stakes, kappa, precision).threshold())
        .collect()
}

/// Normalize consensus to sum to 1 and truncate onto the 65535-step grid.
///
/// Truncation keeps values comparable across epochs despite float noise.
/// A zero-sum vector quantizes to all zeros.
pub fn quantize_consensus(consensus: &[f64]) -> Vec<f64> {
    let total: f64 = consensus.iter().sum();
    if total <= 0.0 {
        return vec![0.0; consensus.len()];
    }
    consensus
        .iter()
        .map(|&c| (c / total * CONSENSUS_GRID_STEPS).floor() / CONSENSUS_GRID_STEPS)
        .collect()
}
