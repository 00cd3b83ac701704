// crates/yumasim-consensus/src/simulation.rs
//
// Epoch-stepping simulation loop.
//
// Feeds a case's snapshots through one Yuma version, threading bonds (and
// for the Delayed rule, the previous normalized weights) from epoch to epoch.
// Threaded matrices are realigned by identity whenever the validator or
// miner set changes, and the reset-capable versions wipe a miner's bond
// column at the case's reset epoch. Each epoch's normalized dividends are
// converted into dividend per 1000 stake units.

use std::collections::HashMap;
use std::ops::Range;

use serde::Serialize;

use yumasim_core::{BondReset, Case, EpochSnapshot, Roster, YumaConfig, YumaError};
use yumasim_economics::{dividends_per_stake_unit, total_dividends, TotalDividends};

use crate::bonds::BondMatrix;
use crate::version::{BondingRule, ResetPolicy, YumaVariant, YumaVersion};
use crate::weights::WeightMatrix;
use crate::yuma::{yuma_epoch, EpochResult};

/// What the loop carries from one epoch into the next.
///
/// Capturing this after epoch `t` and resuming from it reproduces epochs
/// `t + 1..` exactly.
#[derive(Debug, Clone, Default)]
pub struct SimulationState {
    /// Validator roster the threaded matrices are indexed by.
    pub validators: Option<Roster>,
    /// Miner roster the threaded matrices are indexed by.
    pub miners: Option<Roster>,
    pub bonds: Option<BondMatrix>,
    /// Previous normalized weights (Delayed rule only).
    pub prev_weights: Option<WeightMatrix>,
    /// Previous quantized consensus, read by the conditional reset.
    pub prev_consensus: Option<Vec<f64>>,
}

impl SimulationState {
    /// Re-index all threaded state onto this epoch's rosters.
    ///
    /// Entrant validators get zero bonds and, for the Delayed rule, their
    /// current normalized weights as previous weights. Entrant miners get
    /// zero bonds and zero previous consensus.
    fn realign(&mut self, validators: &Roster, miners: &Roster, current: &WeightMatrix) {
        let (Some(old_validators), Some(old_miners)) = (&self.validators, &self.miners) else {
            return;
        };
        if old_validators.same_order(validators) && old_miners.same_order(miners) {
            return;
        }

        self.bonds = self
            .bonds
            .as_ref()
            .map(|b| b.realign(old_validators, old_miners, validators, miners));

        if let Some(prev) = &self.prev_weights {
            let mut moved = prev.realign(old_validators, old_miners, validators, miners);
            for (v, old) in old_validators.remap_to(validators).iter().enumerate() {
                if old.is_none() {
                    moved.weights[v] = current.weights[v].clone();
                }
            }
            self.prev_weights = Some(moved);
        }

        self.prev_consensus = self.prev_consensus.as_ref().map(|c| {
            old_miners
                .remap_to(miners)
                .iter()
                .map(|old| old.map_or(0.0, |m| c[m]))
                .collect()
        });
    }
}

/// Stepping driver for one Yuma version.
#[derive(Debug, Clone)]
pub struct EpochSimulator {
    version: YumaVersion,
    variant: YumaVariant,
    config: YumaConfig,
    bond_reset: Option<BondReset>,
    state: SimulationState,
}

impl EpochSimulator {
    /// Create a simulator with empty state.
    ///
    /// # Errors
    /// `InvalidConfig` if the configuration is out of range, including
    /// liquid-alpha bounds for versions that force liquid alpha on.
    pub fn new(version: YumaVersion, config: &YumaConfig) -> Result<Self, YumaError> {
        config.validate()?;
        let variant = version.variant(&config.params);
        if variant.liquid_alpha {
            config.params.validate_liquid_alpha()?;
        }
        Ok(Self {
            version,
            variant,
            config: config.clone(),
            bond_reset: None,
            state: SimulationState::default(),
        })
    }

    pub fn with_bond_reset(mut self, bond_reset: Option<BondReset>) -> Self {
        self.bond_reset = bond_reset;
        self
    }

    /// Continue from previously captured state.
    pub fn resume(mut self, state: SimulationState) -> Self {
        self.state = state;
        self
    }

    pub fn version(&self) -> YumaVersion {
        self.version
    }

    pub fn variant(&self) -> YumaVariant {
        self.variant
    }

    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    pub fn into_state(self) -> SimulationState {
        self.state
    }

    /// Compute epoch `epoch` from `snapshot` and advance the threaded state.
    pub fn step(&mut self, epoch: usize, snapshot: &EpochSnapshot) -> Result<EpochResult, YumaError> {
        snapshot.validate()?;
        let (validators, miners) = snapshot.rosters()?;
        let weights = WeightMatrix::from_rows(snapshot.weights.clone());

        self.state.realign(&validators, &miners, &weights.normalized());
        self.apply_bond_reset(epoch);

        if snapshot.stakes.iter().sum::<f64>() == 0.0 {
            tracing::warn!("Epoch {}: total stake is zero, dividends will be zero", epoch);
        }

        let result = yuma_epoch(
            self.variant,
            &weights,
            &snapshot.stakes,
            self.state.bonds.as_ref(),
            self.state.prev_weights.as_ref(),
            &self.config,
        )?;

        tracing::debug!(
            "Epoch {} ({}): {} validators, {} miners, max bond {:.6}",
            epoch,
            self.version,
            validators.len(),
            miners.len(),
            result.validator_bonds.max_value()
        );

        self.state.bonds = Some(result.validator_bonds.clone());
        self.state.prev_consensus = Some(result.server_consensus_weight.clone());
        if self.variant.rule == BondingRule::Delayed {
            self.state.prev_weights = Some(result.weight.clone());
        }
        self.state.validators = Some(validators);
        self.state.miners = Some(miners);

        Ok(result)
    }

    fn apply_bond_reset(&mut self, epoch: usize) {
        let Some(reset) = self.bond_reset else {
            return;
        };
        if reset.epoch != epoch {
            return;
        }
        let Some(bonds) = self.state.bonds.as_mut() else {
            return;
        };

        let triggered = match self.version.reset_policy() {
            ResetPolicy::None => false,
            ResetPolicy::Unconditional => true,
            ResetPolicy::Conditional => self
                .state
                .prev_consensus
                .as_ref()
                .and_then(|c| c.get(reset.miner_index))
                .is_some_and(|&c| c == 0.0),
        };

        if triggered {
            tracing::debug!(
                "Epoch {}: resetting bonds on miner column {}",
                epoch,
                reset.miner_index
            );
            bonds.reset_column(reset.miner_index);
        }
    }

    /// Step through `epochs` of `case`, collecting dividend, bond and
    /// incentive series.
    ///
    /// Every snapshot in the range is loaded and validated before the first
    /// epoch is computed.
    pub fn run(&mut self, case: &dyn Case, epochs: Range<usize>) -> Result<SimulationResult, YumaError> {
        let snapshots = load_snapshots(case, epochs.clone())?;

        let mut result = SimulationResult {
            case_name: case.name().to_string(),
            version: self.version,
            validators: case.validators().to_vec(),
            base_validator: case.base_validator().to_string(),
            epochs: epochs.clone(),
            miners_per_epoch: Vec::with_capacity(snapshots.len()),
            dividends_per_validator: case
                .validators()
                .iter()
                .map(|v| (v.clone(), Vec::with_capacity(snapshots.len())))
                .collect(),
            bonds_per_epoch: Vec::with_capacity(snapshots.len()),
            incentives_per_epoch: Vec::with_capacity(snapshots.len()),
        };

        for (epoch, snapshot) in epochs.zip(&snapshots) {
            let epoch_result = self.step(epoch, snapshot)?;
            let dividends = dividends_per_stake_unit(
                &epoch_result.validator_reward_normalized,
                &snapshot.stakes,
                &self.config.simulation,
            );

            for (validator, series) in result.dividends_per_validator.iter_mut() {
                let dividend = snapshot
                    .validators
                    .iter()
                    .position(|v| v == validator)
                    .map_or(0.0, |i| dividends[i]);
                series.push(dividend);
            }
            result.miners_per_epoch.push(snapshot.miners.clone());
            result.bonds_per_epoch.push(epoch_result.validator_bonds);
            result.incentives_per_epoch.push(epoch_result.server_incentive);
        }

        Ok(result)
    }
}

/// Time series produced by one (case, version) run.
#[derive(Debug, Clone, Serialize)]
pub struct SimulationResult {
    pub case_name: String,
    pub version: YumaVersion,
    /// Every validator of the case, in display order.
    pub validators: Vec<String>,
    pub base_validator: String,
    /// Epoch indices covered by this result.
    pub epochs: Range<usize>,
    /// Miner identities, per epoch.
    pub miners_per_epoch: Vec<Vec<String>>,
    /// Dividend per 1000 stake units, per epoch; 0.0 where a validator was absent.
    pub dividends_per_validator: HashMap<String, Vec<f64>>,
    pub bonds_per_epoch: Vec<BondMatrix>,
    pub incentives_per_epoch: Vec<Vec<f64>>,
}

impl SimulationResult {
    pub fn num_epochs(&self) -> usize {
        self.bonds_per_epoch.len()
    }

    /// Totals over the run and percentage difference against the base validator.
    pub fn total_dividends(&self) -> TotalDividends {
        total_dividends(
            &self.validators,
            &self.dividends_per_validator,
            &self.base_validator,
            self.num_epochs(),
        )
    }

    /// Dividend series of `validator`, empty if it is not part of the case.
    pub fn dividends(&self, validator: &str) -> &[f64] {
        self.dividends_per_validator
            .get(validator)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// Run `case` from epoch 0 to the end under `version`.
///
/// The configuration and the whole case are validated before any epoch is
/// computed: snapshot shapes and values, validators known to the case, the
/// base validator, and the bond reset's miner index.
pub fn run_simulation(
    case: &dyn Case,
    version: YumaVersion,
    config: &YumaConfig,
) -> Result<SimulationResult, YumaError> {
    let mut simulator = EpochSimulator::new(version, config)?.with_bond_reset(case.bond_reset());
    validate_case(case)?;

    tracing::info!(
        "Simulating {} with {} over {} epochs",
        case.name(),
        version,
        case.num_epochs()
    );

    simulator.run(case, 0..case.num_epochs())
}

/// Check the case-level invariants the loop relies on.
pub fn validate_case(case: &dyn Case) -> Result<(), YumaError> {
    if !case.validators().iter().any(|v| v == case.base_validator()) {
        return Err(YumaError::InvalidConfig(format!(
            "{}: base validator '{}' is not one of the case's validators",
            case.name(),
            case.base_validator()
        )));
    }

    let snapshots = load_snapshots(case, 0..case.num_epochs())?;

    if let Some(reset) = case.bond_reset() {
        if let Some(snapshot) = snapshots.get(reset.epoch) {
            if reset.miner_index >= snapshot.miners.len() {
                return Err(YumaError::InvalidConfig(format!(
                    "{}: bond reset miner index {} out of range for {} miners",
                    case.name(),
                    reset.miner_index,
                    snapshot.miners.len()
                )));
            }
        }
    }
    Ok(())
}

fn load_snapshots(case: &dyn Case, epochs: Range<usize>) -> Result<Vec<EpochSnapshot>, YumaError> {
    if epochs.end > case.num_epochs() {
        return Err(YumaError::InvalidConfig(format!(
            "{}: epoch range {:?} exceeds {} epochs",
            case.name(),
            epochs,
            case.num_epochs()
        )));
    }

    epochs
        .map(|epoch| {
            let snapshot = case.snapshot(epoch)?;
            snapshot.validate()?;
            if let Some(unknown) = snapshot
                .validators
                .iter()
                .find(|v| !case.validators().contains(v))
            {
                return Err(YumaError::InvalidConfig(format!(
                    "{}: epoch {} validator '{}' is not one of the case's validators",
                    case.name(),
                    epoch,
                    unknown
                )));
            }
            Ok(snapshot)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Fixed-weight case with an optional stake change and reset.
    struct TestCase {
        validators: Vec<String>,
        weights: Vec<Vec<f64>>,
        stakes: Vec<f64>,
        epochs: usize,
        reset: Option<BondReset>,
    }

    impl TestCase {
        fn two_by_two() -> Self {
            Self {
                validators: vec!["A".into(), "B".into()],
                weights: vec![vec![1.0, 0.0], vec![0.0, 1.0]],
                stakes: vec![0.5, 0.5],
                epochs: 5,
                reset: None,
            }
        }
    }

    impl Case for TestCase {
        fn name(&self) -> &str {
            "test"
        }

        fn validators(&self) -> &[String] {
            &self.validators
        }

        fn base_validator(&self) -> &str {
            &self.validators[0]
        }

        fn num_epochs(&self) -> usize {
            self.epochs
        }

        fn snapshot(&self, _epoch: usize) -> Result<EpochSnapshot, YumaError> {
            Ok(EpochSnapshot {
                validators: self.validators.clone(),
                miners: (0..self.weights[0].len()).map(|m| format!("Server {}", m + 1)).collect(),
                weights: self.weights.clone(),
                stakes: self.stakes.clone(),
            })
        }

        fn bond_reset(&self) -> Option<BondReset> {
            self.reset
        }
    }

    #[test]
    fn test_series_lengths() {
        let case = TestCase::two_by_two();
        let result = run_simulation(&case, YumaVersion::Yuma1, &YumaConfig::default()).unwrap();
        assert_eq!(result.num_epochs(), 5);
        assert_eq!(result.incentives_per_epoch.len(), 5);
        assert_eq!(result.dividends("A").len(), 5);
        assert_eq!(result.dividends("B").len(), 5);
    }

    #[test]
    fn test_symmetric_dividends_match() {
        let case = TestCase::two_by_two();
        let result = run_simulation(&case, YumaVersion::Yuma0, &YumaConfig::default()).unwrap();
        let totals = result.total_dividends();
        assert!((totals.total("A") - totals.total("B")).abs() < 1e-9);
        // 0.41 * 0.5 * 100 emission over 500 stake units per epoch.
        assert!((result.dividends("A")[0] - 0.041).abs() < 1e-6);
    }

    #[test]
    fn test_bad_base_validator_fails_before_stepping() {
        struct NoBase(TestCase);
        impl Case for NoBase {
            fn name(&self) -> &str {
                "no base"
            }
            fn validators(&self) -> &[String] {
                self.0.validators()
            }
            fn base_validator(&self) -> &str {
                "Z"
            }
            fn num_epochs(&self) -> usize {
                self.0.num_epochs()
            }
            fn snapshot(&self, epoch: usize) -> Result<EpochSnapshot, YumaError> {
                self.0.snapshot(epoch)
            }
        }
        let err = run_simulation(&NoBase(TestCase::two_by_two()), YumaVersion::Yuma1, &YumaConfig::default())
            .unwrap_err();
        assert!(matches!(err, YumaError::InvalidConfig(_)));
    }

    #[test]
    fn test_reset_index_out_of_range() {
        let mut case = TestCase::two_by_two();
        case.reset = Some(BondReset {
            miner_index: 7,
            epoch: 2,
        });
        let err = run_simulation(&case, YumaVersion::Yuma31, &YumaConfig::default()).unwrap_err();
        assert!(matches!(err, YumaError::InvalidConfig(_)));
    }

    #[test]
    fn test_forced_liquid_alpha_checks_bounds() {
        let mut config = YumaConfig::default();
        config.params.liquid_alpha = false;
        config.params.alpha_low = 0.9;
        config.params.alpha_high = 0.7;
        assert!(config.validate().is_ok());

        let case = TestCase::two_by_two();
        for version in [YumaVersion::Yuma1Liquid, YumaVersion::Yuma4Liquid] {
            let err = run_simulation(&case, version, &config).unwrap_err();
            assert!(matches!(err, YumaError::InvalidConfig(_)), "{}", version);
        }
        // Versions that leave liquid alpha off never read the bounds.
        assert!(run_simulation(&case, YumaVersion::Yuma1, &config).is_ok());
    }

    #[test]
    fn test_unconditional_reset_zeroes_column() {
        let mut simulator = EpochSimulator::new(YumaVersion::Yuma31, &YumaConfig::default())
            .unwrap()
            .with_bond_reset(Some(BondReset {
                miner_index: 1,
                epoch: 2,
            }));
        let case = TestCase::two_by_two();
        let snapshot = case.snapshot(0).unwrap();
        let first = simulator.step(0, &snapshot).unwrap();
        let second = simulator.step(1, &snapshot).unwrap();
        assert!(second.validator_bonds.get(1, 1) > first.validator_bonds.get(1, 1));

        // Wiped before epoch 2 runs: the column holds one epoch of purchase again.
        let third = simulator.step(2, &snapshot).unwrap();
        assert_eq!(third.validator_bonds.get(1, 1), first.validator_bonds.get(1, 1));
        assert_eq!(third.validator_bonds.get(0, 0), {
            let mut no_reset = EpochSimulator::new(YumaVersion::Yuma3, &YumaConfig::default()).unwrap();
            (0..3)
                .map(|epoch| no_reset.step(epoch, &snapshot).unwrap())
                .last()
                .unwrap()
                .validator_bonds
                .get(0, 0)
        });
    }

    #[test]
    fn test_conditional_reset_needs_zero_consensus() {
        // Both miners hold consensus, so the conditional reset never fires.
        let reset = Some(BondReset {
            miner_index: 1,
            epoch: 2,
        });
        let case = TestCase::two_by_two();
        let snapshot = case.snapshot(0).unwrap();

        let mut plain = EpochSimulator::new(YumaVersion::Yuma3, &YumaConfig::default()).unwrap();
        let mut conditional = EpochSimulator::new(YumaVersion::Yuma32, &YumaConfig::default())
            .unwrap()
            .with_bond_reset(reset);
        for epoch in 0..4 {
            let a = plain.step(epoch, &snapshot).unwrap();
            let b = conditional.step(epoch, &snapshot).unwrap();
            assert_eq!(a.validator_bonds, b.validator_bonds);
        }
    }

    #[test]
    fn test_resume_reproduces_tail() {
        let case = TestCase {
            validators: vec!["A".into(), "B".into(), "C".into()],
            weights: vec![vec![0.7, 0.3], vec![0.4, 0.6], vec![0.0, 1.0]],
            stakes: vec![0.6, 0.3, 0.1],
            epochs: 8,
            reset: None,
        };
        let config = YumaConfig::default();
        for version in YumaVersion::all() {
            let full = run_simulation(&case, version, &config).unwrap();

            let mut head = EpochSimulator::new(version, &config).unwrap();
            head.run(&case, 0..5).unwrap();
            let mut tail = EpochSimulator::new(version, &config)
                .unwrap()
                .resume(head.into_state());
            let replay = tail.run(&case, 5..8).unwrap();

            assert_eq!(replay.bonds_per_epoch.last(), full.bonds_per_epoch.last(), "{}", version);
            assert_eq!(replay.dividends("A").last(), full.dividends("A").last(), "{}", version);
        }
    }
}
