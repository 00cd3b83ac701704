// crates/yumasim-consensus/src/liquid_alpha.rs
//
// Liquid alpha: a per-miner bond EMA rate derived from consensus.
//
// A logistic curve is fitted through two anchor points: the lower consensus
// anchor maps to alpha_low and the upper anchor maps to alpha_high. Anchors
// default to the 25th and 75th percentiles of the epoch's consensus vector.
// The sigmoid value is the weight kept on the old bonds, so the bond alpha
// applied to the fresh bonds is 1 - alpha.

use serde::{Deserialize, Serialize};

use yumasim_core::YumaParams;

use crate::weights::finite_or_zero;

/// Liquid-alpha coefficients and the per-miner alpha they produce.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiquidAlpha {
    /// Logistic slope.
    pub a: f64,
    /// Logistic offset.
    pub b: f64,
    pub consensus_low: f64,
    pub consensus_high: f64,
    /// Clamped sigmoid per miner, always within [alpha_low, alpha_high].
    pub alpha: Vec<f64>,
}

impl LiquidAlpha {
    /// Fit the curve to `consensus` and evaluate it for every miner.
    ///
    /// If the two anchors coincide, the upper one is replaced by the 99th
    /// percentile. If they still coincide the slope is infinite; sigmoid
    /// values that come out NaN resolve to 0 and so clamp to alpha_low.
    pub fn compute(consensus: &[f64], params: &YumaParams) -> Self {
        let mut consensus_high = params
            .override_consensus_high
            .unwrap_or_else(|| quantile(consensus, 0.75));
        let consensus_low = params
            .override_consensus_low
            .unwrap_or_else(|| quantile(consensus, 0.25));

        if consensus_high == consensus_low {
            consensus_high = quantile(consensus, 0.99);
        }

        let logit_high = (1.0 / params.alpha_high - 1.0).ln();
        let logit_low = (1.0 / params.alpha_low - 1.0).ln();
        let a = (logit_high - logit_low) / (consensus_low - consensus_high);
        let b = logit_low + a * consensus_low;

        let alpha = consensus
            .iter()
            .map(|&c| {
                let sigmoid = 1.0 / (1.0 + (-a * c + b).exp());
                finite_or_zero(sigmoid).clamp(params.alpha_low, params.alpha_high)
            })
            .collect();

        Self {
            a,
            b,
            consensus_low,
            consensus_high,
            alpha,
        }
    }

    /// Bond alpha per miner: 1 - alpha.
    pub fn bond_alpha(&self) -> Vec<f64> {
        self.alpha.iter().map(|&a| 1.0 - a).collect()
    }
}

/// Linear-interpolation quantile of `values` at `q` in [0, 1].
///
/// Matches the usual "linear" definition: position q * (n - 1) in the sorted
/// values, interpolated between its neighbours. Empty input yields 0.0.
pub fn quantile(values: &[f64], q: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let position = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let fraction = position - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * fraction
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantile_interpolates() {
        let v = [4.0, 1.0, 3.0, 2.0];
        assert!((quantile(&v, 0.0) - 1.0).abs() < 1e-12);
        assert!((quantile(&v, 1.0) - 4.0).abs() < 1e-12);
        assert!((quantile(&v, 0.5) - 2.5).abs() < 1e-12);
        assert!((quantile(&v, 0.25) - 1.75).abs() < 1e-12);
        assert_eq!(quantile(&[], 0.5), 0.0);
    }

    #[test]
    fn test_anchors_map_to_bounds() {
        let params = YumaParams {
            override_consensus_low: Some(0.2),
            override_consensus_high: Some(0.6),
            ..YumaParams::default()
        };
        let la = LiquidAlpha::compute(&[0.2, 0.6, 0.4], &params);
        assert!((la.alpha[0] - params.alpha_low).abs() < 1e-9);
        assert!((la.alpha[1] - params.alpha_high).abs() < 1e-9);
        assert!(la.alpha[2] > params.alpha_low && la.alpha[2] < params.alpha_high);
    }

    #[test]
    fn test_alpha_clamped_to_bounds() {
        let params = YumaParams::default();
        let consensus = [0.0, 0.01, 0.05, 0.1, 0.2, 0.3, 0.31];
        let la = LiquidAlpha::compute(&consensus, &params);
        for &a in &la.alpha {
            assert!(a >= params.alpha_low && a <= params.alpha_high, "alpha {} out of bounds", a);
        }
        for &ba in &la.bond_alpha() {
            assert!(ba >= 1.0 - params.alpha_high - 1e-12 && ba <= 1.0 - params.alpha_low + 1e-12);
        }
    }

    #[test]
    fn test_degenerate_interval_uses_99th_percentile() {
        // 25th and 75th percentiles are both 0.1; the 99th sits near 0.7.
        let consensus = [0.1, 0.1, 0.1, 0.1, 0.1, 0.7];
        let la = LiquidAlpha::compute(&consensus, &YumaParams::default());
        assert_eq!(la.consensus_low, 0.1);
        assert!((la.consensus_high - quantile(&consensus, 0.99)).abs() < 1e-12);
        assert!(la.a.is_finite());
    }

    #[test]
    fn test_fully_degenerate_consensus_stays_finite() {
        let params = YumaParams::default();
        let la = LiquidAlpha::compute(&[0.5, 0.5], &params);
        for &a in &la.alpha {
            assert!(a.is_finite());
            assert!(a >= params.alpha_low && a <= params.alpha_high);
        }
    }
}
