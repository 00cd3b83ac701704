// crates/yumasim-core/src/config.rs
//
// Simulation-wide hyperparameters and per-variant Yuma parameters.
//
// Both structures are immutable for the duration of a run. They are merged
// into a `YumaConfig` once at the call site; nothing flattens or injects
// fields dynamically.

use serde::{Deserialize, Serialize};

use crate::error::YumaError;

/// Constants shared by every variant in a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationHyperparameters {
    /// Stake fraction that must sit above a miner's consensus threshold.
    #[serde(default = "default_kappa")]
    pub kappa: f64,

    /// Blend between raw and clipped weights when forming bonds (0 = raw, 1 = clipped).
    #[serde(default = "default_bond_penalty")]
    pub bond_penalty: f64,

    /// Total emission per epoch, in stake units.
    #[serde(default = "default_total_epoch_emission")]
    pub total_epoch_emission: f64,

    /// Share of the epoch emission paid to validators as dividends.
    #[serde(default = "default_validator_emission_ratio")]
    pub validator_emission_ratio: f64,

    /// Total stake of the subnet, used to turn stake fractions into units.
    #[serde(default = "default_total_subnet_stake")]
    pub total_subnet_stake: f64,

    /// Bisection stops once the bracket is narrower than 1 / consensus_precision.
    #[serde(default = "default_consensus_precision")]
    pub consensus_precision: u32,
}

fn default_kappa() -> f64 {
    0.5
}

fn default_bond_penalty() -> f64 {
    1.0
}

fn default_total_epoch_emission() -> f64 {
    100.0
}

fn default_validator_emission_ratio() -> f64 {
    0.41
}

fn default_total_subnet_stake() -> f64 {
    1_000_000.0
}

fn default_consensus_precision() -> u32 {
    100_000
}

impl Default for SimulationHyperparameters {
    fn default() -> Self {
        Self {
            kappa: default_kappa(),
            bond_penalty: default_bond_penalty(),
            total_epoch_emission: default_total_epoch_emission(),
            validator_emission_ratio: default_validator_emission_ratio(),
            total_subnet_stake: default_total_subnet_stake(),
            consensus_precision: default_consensus_precision(),
        }
    }
}

/// Constants specific to a Yuma variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YumaParams {
    /// EMA weight given to the freshly computed bonds.
    #[serde(default = "default_bond_alpha")]
    pub bond_alpha: f64,

    /// Derive a per-miner bond alpha from consensus instead of `bond_alpha`.
    #[serde(default)]
    pub liquid_alpha: bool,

    /// Upper clamp for the liquid-alpha sigmoid.
    #[serde(default = "default_alpha_high")]
    pub alpha_high: f64,

    /// Lower clamp for the liquid-alpha sigmoid.
    #[serde(default = "default_alpha_low")]
    pub alpha_low: f64,

    /// Per-epoch bond decay for capacity bonding.
    #[serde(default = "default_decay_rate")]
    pub decay_rate: f64,

    /// Fraction of a validator's capacity purchasable per epoch.
    #[serde(default = "default_capacity_alpha")]
    pub capacity_alpha: f64,

    /// Fixed upper consensus anchor for liquid alpha (otherwise the 75th percentile).
    #[serde(default)]
    pub override_consensus_high: Option<f64>,

    /// Fixed lower consensus anchor for liquid alpha (otherwise the 25th percentile).
    #[serde(default)]
    pub override_consensus_low: Option<f64>,
}

fn default_bond_alpha() -> f64 {
    0.1
}

fn default_alpha_high() -> f64 {
    0.9
}

fn default_alpha_low() -> f64 {
    0.7
}

fn default_decay_rate() -> f64 {
    0.1
}

fn default_capacity_alpha() -> f64 {
    0.1
}

impl Default for YumaParams {
    fn default() -> Self {
        Self {
            bond_alpha: default_bond_alpha(),
            liquid_alpha: false,
            alpha_high: default_alpha_high(),
            alpha_low: default_alpha_low(),
            decay_rate: default_decay_rate(),
            capacity_alpha: default_capacity_alpha(),
            override_consensus_high: None,
            override_consensus_low: None,
        }
    }
}

impl YumaParams {
    /// Parameters used for the relative-bond (Yuma 4) research runs.
    pub fn relative_bonds() -> Self {
        Self {
            bond_alpha: 0.025,
            alpha_high: 0.99,
            alpha_low: 0.9,
            ..Self::default()
        }
    }

    /// Copy of these parameters with liquid alpha switched on.
    pub fn with_liquid_alpha(&self) -> Self {
        Self {
            liquid_alpha: true,
            ..self.clone()
        }
    }
}

/// The explicit merge of simulation hyperparameters and variant parameters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct YumaConfig {
    #[serde(default)]
    pub simulation: SimulationHyperparameters,
    #[serde(default, rename = "yuma")]
    pub params: YumaParams,
}

impl YumaConfig {
    pub fn new(simulation: SimulationHyperparameters, params: YumaParams) -> Self {
        Self { simulation, params }
    }

    /// Check ranges that would otherwise poison every epoch.
    ///
    /// Called by the simulation loop before any epoch is computed.
    pub fn validate(&self) -> Result<(), YumaError> {
        let sim = &self.simulation;
        let p = &self.params;

        if sim.consensus_precision == 0 {
            return Err(YumaError::InvalidConfig(
                "consensus_precision must be positive".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&sim.kappa) {
            return Err(YumaError::InvalidConfig(format!(
                "kappa must be in [0, 1], got {}",
                sim.kappa
            )));
        }
        if !(0.0..=1.0).contains(&sim.bond_penalty) {
            return Err(YumaError::InvalidConfig(format!(
                "bond_penalty must be in [0, 1], got {}",
                sim.bond_penalty
            )));
        }
        for (name, value) in [
            ("bond_alpha", p.bond_alpha),
            ("decay_rate", p.decay_rate),
            ("capacity_alpha", p.capacity_alpha),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(YumaError::InvalidConfig(format!(
                    "{} must be in [0, 1], got {}",
                    name, value
                )));
            }
        }
        if p.liquid_alpha {
            p.validate_liquid_alpha()?;
        }
        Ok(())
    }
}

impl YumaParams {
    /// Check the liquid-alpha bounds.
    ///
    /// Needed whenever liquid alpha is in effect, including versions that
    /// switch it on regardless of `liquid_alpha`.
    pub fn validate_liquid_alpha(&self) -> Result<(), YumaError> {
        // The sigmoid takes ln(1/alpha - 1), which is undefined at 0 and 1.
        if !(self.alpha_low > 0.0 && self.alpha_low < self.alpha_high && self.alpha_high < 1.0) {
            return Err(YumaError::InvalidConfig(format!(
                "liquid alpha requires 0 < alpha_low < alpha_high < 1, got [{}, {}]",
                self.alpha_low, self.alpha_high
            )));
        }
        Ok(())
    }
}
