// crates/yumasim-economics/src/lib.rs
//
// yumasim-economics: emission accounting and dividend totals for the Yuma
// consensus simulator.
//
// Stake is tracked in units of 1000 tokens: a validator's dividend is
// reported as emission received per 1000 staked tokens, which makes
// validators of very different size directly comparable.

pub mod emission;
pub mod rewards;

// Re-export key types for ergonomic access from downstream crates.
pub use emission::{
    dividends_per_stake_unit, stake_units, validator_emission, MIN_STAKE_UNITS, STAKE_UNIT,
};
pub use rewards::{total_dividends, TotalDividends};
