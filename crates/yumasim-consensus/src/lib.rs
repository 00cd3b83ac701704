// crates/yumasim-consensus/src/lib.rs
//
// yumasim-consensus: Yuma consensus variants, bonding rules, and the epoch
// simulation loop.
//
// Every variant runs the same consensus front half (normalization, bisection
// threshold, clipping, incentive) and differs only in how bonds evolve. The
// simulation loop threads bonds across epochs and turns each epoch's
// normalized dividends into per-stake-unit dividends.

pub mod bonds;
pub mod liquid_alpha;
pub mod simulation;
pub mod summary;
pub mod threshold;
pub mod version;
pub mod weights;
pub mod yuma;

// Re-export key types for ergonomic access from downstream crates.
pub use bonds::{BondAlpha, BondMatrix};
pub use simulation::{run_simulation, validate_case, EpochSimulator, SimulationResult, SimulationState};
pub use summary::{total_dividends_table, DividendsTable, ValidatorLabels};
pub use version::{BondingRule, ResetPolicy, YumaVariant, YumaVersion};
pub use weights::WeightMatrix;
pub use yuma::{yuma_epoch, EpochResult};
