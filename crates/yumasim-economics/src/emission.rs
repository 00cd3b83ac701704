// crates/yumasim-economics/src/emission.rs
//
// Converting normalized validator rewards into emission.
//
// Each epoch emits `total_epoch_emission` tokens. Validators share
// `validator_emission_ratio` (0.41 by default) of it in proportion to their
// normalized reward; the rest goes to miners and is not tracked here.

use yumasim_core::SimulationHyperparameters;

/// Tokens per stake unit.
pub const STAKE_UNIT: f64 = 1000.0;

/// Validators holding no more than this many stake units earn no reported dividend.
pub const MIN_STAKE_UNITS: f64 = 1e-6;

/// Validator emission for one epoch: ratio * D_normalized * total emission.
pub fn validator_emission(normalized_rewards: &[f64], hyper: &SimulationHyperparameters) -> Vec<f64> {
    normalized_rewards
        .iter()
        .map(|&d| hyper.validator_emission_ratio * d * hyper.total_epoch_emission)
        .collect()
}

/// Stake of each validator expressed in stake units.
///
/// `stakes` are the case's stake fractions, scaled by the subnet's total stake.
pub fn stake_units(stakes: &[f64], hyper: &SimulationHyperparameters) -> Vec<f64> {
    stakes
        .iter()
        .map(|&s| s * hyper.total_subnet_stake / STAKE_UNIT)
        .collect()
}

/// Dividend per 1000 staked tokens for each validator in one epoch.
///
/// Returns 0.0 for validators whose stake is at or below `MIN_STAKE_UNITS`,
/// so unstaked validators never produce infinities.
///
/// # Panics
/// Panics if `normalized_rewards.len() != stakes.len()`.
pub fn dividends_per_stake_unit(
    normalized_rewards: &[f64],
    stakes: &[f64],
    hyper: &SimulationHyperparameters,
) -> Vec<f64> {
    assert_eq!(
        normalized_rewards.len(),
        stakes.len(),
        "normalized_rewards and stakes must have the same length"
    );

    let emission = validator_emission(normalized_rewards, hyper);
    stake_units(stakes, hyper)
        .into_iter()
        .zip(emission)
        .map(|(units, e)| if units > MIN_STAKE_UNITS { e / units } else { 0.0 })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validator_emission_uses_ratio() {
        let hyper = SimulationHyperparameters::default();
        let e = validator_emission(&[0.5, 0.5], &hyper);
        // 0.41 * 0.5 * 100
        assert!((e[0] - 20.5).abs() < 1e-10);
        assert!((e[1] - 20.5).abs() < 1e-10);
    }

    #[test]
    fn test_stake_units() {
        let hyper = SimulationHyperparameters::default();
        let units = stake_units(&[0.8, 0.1, 0.1], &hyper);
        assert!((units[0] - 800.0).abs() < 1e-9);
        assert!((units[1] - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_dividend_per_stake_unit() {
        let hyper = SimulationHyperparameters::default();
        let d = dividends_per_stake_unit(&[0.8, 0.1, 0.1], &[0.8, 0.1, 0.1], &hyper);
        // Proportional reward: every validator earns 41 * share / (share * 1000).
        for value in d {
            assert!((value - 0.041).abs() < 1e-10);
        }
    }

    #[test]
    fn test_zero_stake_yields_zero_dividend() {
        let hyper = SimulationHyperparameters::default();
        let d = dividends_per_stake_unit(&[0.7, 0.3], &[1.0, 0.0], &hyper);
        assert_eq!(d[1], 0.0);
        assert!(d[0].is_finite());
    }
}
