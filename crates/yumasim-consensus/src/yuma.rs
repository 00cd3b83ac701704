// crates/yumasim-consensus/src/yuma.rs
//
// One epoch of Yuma consensus for any bonding rule.
//
// Every variant shares the same front half: weight and stake normalization,
// prerank, bisection consensus, clipping, rank, incentive, and trust. They
// differ only in how bonds are formed and how dividends are read off them.

use serde::{Deserialize, Serialize};

use yumasim_core::{YumaConfig, YumaError};

use crate::bonds::{
    capacity_bonds, classic_bonds, relative_bonds, rust_bonds, BondAlpha, BondMatrix, BondUpdate,
};
use crate::liquid_alpha::LiquidAlpha;
use crate::threshold::{consensus_thresholds, quantize_consensus};
use crate::version::{BondingRule, YumaVariant};
use crate::weights::{
    normalize_or_zero, normalize_stake, normalize_with_epsilon, ratio_or_zero, WeightMatrix,
};

/// Everything computed for one epoch, keyed by the name it serializes under.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpochResult {
    /// Row-normalized weights.
    pub weight: WeightMatrix,
    /// Normalized stake.
    pub stake: Vec<f64>,
    pub server_prerank: Vec<f64>,
    /// Quantized consensus threshold per miner.
    pub server_consensus_weight: Vec<f64>,
    pub consensus_clipped_weight: WeightMatrix,
    pub server_rank: Vec<f64>,
    pub server_incentive: Vec<f64>,
    pub server_trust: Vec<f64>,
    pub validator_trust: Vec<f64>,
    /// Blended weights bonds were formed from (Classic and Delayed only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight_for_bond: Option<WeightMatrix>,
    /// Fresh bonds before the EMA (EMA rules only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validator_bond: Option<BondMatrix>,
    /// Bonds carried into the next epoch.
    pub validator_bonds: BondMatrix,
    pub validator_reward: Vec<f64>,
    pub validator_reward_normalized: Vec<f64>,
    /// EMA rate used this epoch; absent for capacity bonding.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bond_alpha: Option<BondAlpha>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alpha_a: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alpha_b: Option<f64>,
}

/// Run one epoch of Yuma consensus.
///
/// # Arguments
/// * `variant` - Bonding rule and liquid-alpha flag.
/// * `weights` - Raw weight matrix \[validators x miners\].
/// * `stakes` - Raw stake per validator.
/// * `prev_bonds` - Bonds from the previous epoch, `None` at epoch 0.
/// * `prev_weights` - Previous normalized weights, read by the Delayed rule only.
///   Falls back to this epoch's normalized weights when absent.
/// * `config` - Simulation hyperparameters and variant parameters.
///
/// # Errors
/// `InvalidConfig` for an empty matrix, `DimensionMismatch` when any input
/// disagrees with the weight matrix's shape.
pub fn yuma_epoch(
    variant: YumaVariant,
    weights: &WeightMatrix,
    stakes: &[f64],
    prev_bonds: Option<&BondMatrix>,
    prev_weights: Option<&WeightMatrix>,
    config: &YumaConfig,
) -> Result<EpochResult, YumaError> {
    check_shapes(weights, stakes, prev_bonds, prev_weights)?;
    if variant.liquid_alpha {
        config.params.validate_liquid_alpha()?;
    }

    let sim = &config.simulation;
    let params = &config.params;

    // Step 1: Normalize weights and stake
    let weight = weights.normalized();
    let stake = normalize_stake(stakes);

    // Step 2: Prerank
    let server_prerank = weight.stake_weighted_column_sums(&stake);

    // Step 3: Consensus, quantized onto the fixed grid
    let server_consensus_weight = quantize_consensus(&consensus_thresholds(
        &weight,
        &stake,
        sim.kappa,
        sim.consensus_precision,
    ));

    // Step 4: Clip. The Delayed rule clips last epoch's weights.
    let bond_source = match variant.rule {
        BondingRule::Delayed => prev_weights.unwrap_or(&weight),
        _ => &weight,
    };
    let consensus_clipped_weight = bond_source.clip_to(&server_consensus_weight);

    // Step 5: Rank, incentive, trust
    let server_rank = consensus_clipped_weight.stake_weighted_column_sums(&stake);
    let server_incentive = normalize_or_zero(&server_rank);
    let server_trust = ratio_or_zero(&server_rank, &server_prerank);
    let validator_trust = ratio_or_zero(&consensus_clipped_weight.row_sums(), &weight.row_sums());

    // Step 6: Bond alpha, per miner when liquid alpha is on
    let liquid = if variant.liquid_alpha {
        Some(LiquidAlpha::compute(&server_consensus_weight, params))
    } else {
        None
    };
    let alpha = match &liquid {
        Some(la) => BondAlpha::PerMiner(la.bond_alpha()),
        None => BondAlpha::Fixed(params.bond_alpha),
    };

    // Step 7: Bonds
    let BondUpdate {
        bonds,
        instant_bonds,
        weight_for_bond,
    } = match variant.rule {
        BondingRule::Rust => rust_bonds(&consensus_clipped_weight, &stake, prev_bonds, &alpha),
        BondingRule::Classic | BondingRule::Delayed => classic_bonds(
            bond_source,
            &consensus_clipped_weight,
            &stake,
            sim.bond_penalty,
            prev_bonds,
            &alpha,
        ),
        BondingRule::Capacity => capacity_bonds(
            &weight,
            &stake,
            prev_bonds,
            params.capacity_alpha,
            params.decay_rate,
        ),
        BondingRule::Relative => relative_bonds(&weight, prev_bonds, &alpha),
    };

    // Step 8: Dividends
    let mut validator_reward = bonds.weighted_by(&server_incentive);
    if variant.rule == BondingRule::Relative {
        for (d, &s) in validator_reward.iter_mut().zip(&stake) {
            *d *= s;
        }
    }
    let validator_reward_normalized = normalize_with_epsilon(&validator_reward);

    let bond_alpha = variant.rule.supports_liquid_alpha().then_some(alpha);

    Ok(EpochResult {
        weight,
        stake,
        server_prerank,
        server_consensus_weight,
        consensus_clipped_weight,
        server_rank,
        server_incentive,
        server_trust,
        validator_trust,
        weight_for_bond,
        validator_bond: instant_bonds,
        validator_bonds: bonds,
        validator_reward,
        validator_reward_normalized,
        bond_alpha,
        alpha_a: liquid.as_ref().map(|la| la.a),
        alpha_b: liquid.as_ref().map(|la| la.b),
    })
}

fn check_shapes(
    weights: &WeightMatrix,
    stakes: &[f64],
    prev_bonds: Option<&BondMatrix>,
    prev_weights: Option<&WeightMatrix>,
) -> Result<(), YumaError> {
    let n_validators = weights.n_validators();
    let n_miners = weights.n_miners();

    if n_validators == 0 || n_miners == 0 {
        return Err(YumaError::InvalidConfig(format!(
            "weight matrix must be non-empty, got {}x{}",
            n_validators, n_miners
        )));
    }
    if let Some(v) = weights.weights.iter().position(|row| row.len() != n_miners) {
        return Err(YumaError::DimensionMismatch(format!(
            "weight row {} has {} entries, expected {}",
            v,
            weights.weights[v].len(),
            n_miners
        )));
    }
    if stakes.len() != n_validators {
        return Err(YumaError::DimensionMismatch(format!(
            "{} stakes for {} validators",
            stakes.len(),
            n_validators
        )));
    }
    if let Some(b) = prev_bonds {
        if b.n_validators() != n_validators || b.bonds.iter().any(|row| row.len() != n_miners) {
            return Err(YumaError::DimensionMismatch(format!(
                "previous bonds are {}x{}, weights are {}x{}",
                b.n_validators(),
                b.n_miners(),
                n_validators,
                n_miners
            )));
        }
    }
    if let Some(w) = prev_weights {
        if w.n_validators() != n_validators || w.weights.iter().any(|row| row.len() != n_miners) {
            return Err(YumaError::DimensionMismatch(format!(
                "previous weights are {}x{}, weights are {}x{}",
                w.n_validators(),
                w.n_miners(),
                n_validators,
                n_miners
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use yumasim_core::YumaParams;

    fn variant(rule: BondingRule) -> YumaVariant {
        YumaVariant {
            rule,
            liquid_alpha: false,
        }
    }

    fn all_rules() -> [BondingRule; 5] {
        [
            BondingRule::Rust,
            BondingRule::Classic,
            BondingRule::Delayed,
            BondingRule::Capacity,
            BondingRule::Relative,
        ]
    }

    #[test]
    fn test_symmetric_two_by_two() {
        let w = WeightMatrix::from_rows(vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
        let result = yuma_epoch(
            variant(BondingRule::Classic),
            &w,
            &[0.5, 0.5],
            None,
            None,
            &YumaConfig::default(),
        )
        .unwrap();

        assert!((result.server_incentive[0] - 0.5).abs() < 1e-5);
        assert!((result.server_incentive[1] - 0.5).abs() < 1e-5);
        assert!((result.validator_reward_normalized[0] - 0.5).abs() < 1e-5);
        assert!((result.validator_reward_normalized[1] - 0.5).abs() < 1e-5);
    }

    #[test]
    fn test_classic_and_delayed_agree_at_epoch_zero() {
        let w = WeightMatrix::from_rows(vec![
            vec![0.7, 0.3, 0.0],
            vec![0.2, 0.5, 0.3],
            vec![0.0, 0.1, 0.9],
        ]);
        let stakes = [0.6, 0.3, 0.1];
        let config = YumaConfig::default();

        let classic = yuma_epoch(variant(BondingRule::Classic), &w, &stakes, None, None, &config).unwrap();
        let delayed = yuma_epoch(variant(BondingRule::Delayed), &w, &stakes, None, None, &config).unwrap();

        assert_eq!(classic.validator_bonds, delayed.validator_bonds);
        assert_eq!(classic.validator_reward, delayed.validator_reward);
        assert_eq!(classic.server_incentive, delayed.server_incentive);
        assert_eq!(classic.weight_for_bond, delayed.weight_for_bond);
    }

    #[test]
    fn test_zero_stake_yields_zeros() {
        let w = WeightMatrix::from_rows(vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
        for rule in all_rules() {
            let result = yuma_epoch(variant(rule), &w, &[0.0, 0.0], None, None, &YumaConfig::default())
                .unwrap();
            assert!(result.server_incentive.iter().all(|&i| i == 0.0), "{:?}", rule);
            assert!(result.validator_reward_normalized.iter().all(|&d| d == 0.0), "{:?}", rule);
            assert!(result.server_trust.iter().all(|t| t.is_finite()));
            assert!(result.validator_trust.iter().all(|t| t.is_finite()));
        }
    }

    #[test]
    fn test_normalized_dividends_sum_to_one() {
        let w = WeightMatrix::from_rows(vec![vec![0.6, 0.4], vec![0.5, 0.5], vec![0.9, 0.1]]);
        let stakes = [0.5, 0.3, 0.2];
        for rule in all_rules() {
            let result = yuma_epoch(variant(rule), &w, &stakes, None, None, &YumaConfig::default())
                .unwrap();
            let total: f64 = result.validator_reward_normalized.iter().sum();
            assert!((total - 1.0).abs() < 1e-3, "{:?} summed to {}", rule, total);
        }
    }

    #[test]
    fn test_all_zero_weights_give_zero_dividends() {
        let w = WeightMatrix::from_rows(vec![vec![0.0, 0.0], vec![0.0, 0.0]]);
        let result = yuma_epoch(
            variant(BondingRule::Rust),
            &w,
            &[0.5, 0.5],
            None,
            None,
            &YumaConfig::default(),
        )
        .unwrap();
        assert_eq!(result.validator_reward_normalized, vec![0.0, 0.0]);
    }

    #[test]
    fn test_liquid_alpha_exposes_coefficients() {
        let w = WeightMatrix::from_rows(vec![vec![0.8, 0.2, 0.0], vec![0.1, 0.6, 0.3]]);
        let config = YumaConfig::new(Default::default(), YumaParams::default());
        let liquid = YumaVariant {
            rule: BondingRule::Classic,
            liquid_alpha: true,
        };
        let result = yuma_epoch(liquid, &w, &[0.7, 0.3], None, None, &config).unwrap();
        assert!(result.alpha_a.is_some());
        assert!(result.alpha_b.is_some());
        assert!(matches!(result.bond_alpha, Some(BondAlpha::PerMiner(ref a)) if a.len() == 3));

        let fixed = yuma_epoch(variant(BondingRule::Classic), &w, &[0.7, 0.3], None, None, &config).unwrap();
        assert!(fixed.alpha_a.is_none());
        assert_eq!(fixed.bond_alpha, Some(BondAlpha::Fixed(0.1)));
    }

    #[test]
    fn test_liquid_alpha_inverted_bounds_rejected() {
        let w = WeightMatrix::from_rows(vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
        let params = YumaParams {
            alpha_low: 0.9,
            alpha_high: 0.7,
            ..YumaParams::default()
        };
        let config = YumaConfig::new(Default::default(), params);
        let liquid = YumaVariant {
            rule: BondingRule::Relative,
            liquid_alpha: true,
        };
        let err = yuma_epoch(liquid, &w, &[0.5, 0.5], None, None, &config).unwrap_err();
        assert!(matches!(err, YumaError::InvalidConfig(_)));
    }

    #[test]
    fn test_capacity_has_no_bond_alpha() {
        let w = WeightMatrix::from_rows(vec![vec![1.0, 0.0]]);
        let result = yuma_epoch(
            variant(BondingRule::Capacity),
            &w,
            &[1.0],
            None,
            None,
            &YumaConfig::default(),
        )
        .unwrap();
        assert!(result.bond_alpha.is_none());
        assert!(result.validator_bond.is_none());
    }

    #[test]
    fn test_stake_length_mismatch() {
        let w = WeightMatrix::from_rows(vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
        let err = yuma_epoch(variant(BondingRule::Rust), &w, &[1.0], None, None, &YumaConfig::default())
            .unwrap_err();
        assert!(matches!(err, YumaError::DimensionMismatch(_)));
    }

    #[test]
    fn test_prev_bonds_shape_mismatch() {
        let w = WeightMatrix::from_rows(vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
        let bonds = BondMatrix::new(2, 3);
        let err = yuma_epoch(
            variant(BondingRule::Classic),
            &w,
            &[0.5, 0.5],
            Some(&bonds),
            None,
            &YumaConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, YumaError::DimensionMismatch(_)));
    }

    #[test]
    fn test_result_serializes_by_name() {
        let w = WeightMatrix::from_rows(vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
        let result = yuma_epoch(
            variant(BondingRule::Rust),
            &w,
            &[0.5, 0.5],
            None,
            None,
            &YumaConfig::default(),
        )
        .unwrap();
        let json = serde_json::to_value(&result).unwrap();
        assert!(json.get("server_incentive").is_some());
        assert!(json.get("validator_bonds").is_some());
        assert!(json.get("weight_for_bond").is_none());
        assert!(json["weight"].is_array());
    }
}
