// crates/yumasim-consensus/src/version.rs
//
// Named Yuma research variants and the bonding rule each one runs.
//
// A `YumaVersion` is what users pick by name. It resolves to a
// `YumaVariant` (bonding rule plus effective liquid-alpha flag) and a
// `ResetPolicy` the simulation loop applies to threaded bonds.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use yumasim_core::{YumaError, YumaParams};

/// How fresh bonds are formed from an epoch's weights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BondingRule {
    /// Column-normalized EMA bonds, renormalized after smoothing.
    Rust,
    /// EMA over stake-weighted blended weights.
    Classic,
    /// Classic, fed the previous epoch's weights.
    Delayed,
    /// Capacity-limited bond purchase with decay.
    Capacity,
    /// Per-cell relative bonds capped at 1.0.
    Relative,
}

impl BondingRule {
    /// Capacity bonding has no EMA rate to modulate.
    pub fn supports_liquid_alpha(&self) -> bool {
        !matches!(self, BondingRule::Capacity)
    }
}

/// A bonding rule with the liquid-alpha switch resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YumaVariant {
    pub rule: BondingRule,
    pub liquid_alpha: bool,
}

/// When the loop wipes a miner's bond column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResetPolicy {
    None,
    /// Always at the case's reset epoch.
    Unconditional,
    /// At the reset epoch, only if the previous consensus for that miner was zero.
    Conditional,
}

/// The research variants, by display name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum YumaVersion {
    Yuma0,
    Yuma1,
    Yuma1Liquid,
    Yuma2,
    Yuma3,
    Yuma31,
    Yuma32,
    Yuma4,
    Yuma4Liquid,
}

impl YumaVersion {
    /// Every version, in presentation order.
    pub fn all() -> [YumaVersion; 9] {
        [
            YumaVersion::Yuma0,
            YumaVersion::Yuma1,
            YumaVersion::Yuma1Liquid,
            YumaVersion::Yuma2,
            YumaVersion::Yuma3,
            YumaVersion::Yuma31,
            YumaVersion::Yuma32,
            YumaVersion::Yuma4,
            YumaVersion::Yuma4Liquid,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            YumaVersion::Yuma0 => "Yuma 0 (subtensor)",
            YumaVersion::Yuma1 => "Yuma 1 (paper)",
            YumaVersion::Yuma1Liquid => "Yuma 1 (paper) - liquid alpha on",
            YumaVersion::Yuma2 => "Yuma 2 (Adrian-Fish)",
            YumaVersion::Yuma3 => "Yuma 3 (Rhef)",
            YumaVersion::Yuma31 => "Yuma 3.1 (Rhef+reset)",
            YumaVersion::Yuma32 => "Yuma 3.2 (Rhef+conditional)",
            YumaVersion::Yuma4 => "Yuma 4 (Rhef+relative bonds)",
            YumaVersion::Yuma4Liquid => "Yuma 4 (Rhef+relative bonds) - liquid alpha on",
        }
    }

    pub fn bonding_rule(&self) -> BondingRule {
        match self {
            YumaVersion::Yuma0 => BondingRule::Rust,
            YumaVersion::Yuma1 | YumaVersion::Yuma1Liquid => BondingRule::Classic,
            YumaVersion::Yuma2 => BondingRule::Delayed,
            YumaVersion::Yuma3 | YumaVersion::Yuma31 | YumaVersion::Yuma32 => {
                BondingRule::Capacity
            }
            YumaVersion::Yuma4 | YumaVersion::Yuma4Liquid => BondingRule::Relative,
        }
    }

    /// Versions named "liquid alpha on" run with liquid alpha regardless of params.
    pub fn forces_liquid_alpha(&self) -> bool {
        matches!(self, YumaVersion::Yuma1Liquid | YumaVersion::Yuma4Liquid)
    }

    pub fn reset_policy(&self) -> ResetPolicy {
        match self {
            YumaVersion::Yuma31 => ResetPolicy::Unconditional,
            YumaVersion::Yuma32 | YumaVersion::Yuma4 | YumaVersion::Yuma4Liquid => {
                ResetPolicy::Conditional
            }
            _ => ResetPolicy::None,
        }
    }

    /// Resolve the bonding rule and effective liquid-alpha flag under `params`.
    pub fn variant(&self, params: &YumaParams) -> YumaVariant {
        let rule = self.bonding_rule();
        YumaVariant {
            rule,
            liquid_alpha: (self.forces_liquid_alpha() || params.liquid_alpha)
                && rule.supports_liquid_alpha(),
        }
    }

    /// Parameters this version runs with in a sweep, starting from `base`.
    ///
    /// "Liquid alpha on" versions switch liquid alpha on; the liquid
    /// relative-bond version always runs with the relative-bond constants.
    pub fn sweep_params(&self, base: &YumaParams) -> YumaParams {
        match self {
            YumaVersion::Yuma4Liquid => YumaParams::relative_bonds().with_liquid_alpha(),
            YumaVersion::Yuma1Liquid => base.with_liquid_alpha(),
            _ => base.clone(),
        }
    }
}

impl fmt::Display for YumaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for YumaVersion {
    type Err = YumaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        YumaVersion::all()
            .into_iter()
            .find(|v| v.name() == s)
            .ok_or_else(|| YumaError::UnknownVersion(s.to_string()))
    }
}
