// crates/yumasim-core/src/traits.rs

use serde::{Deserialize, Serialize};

use crate::error::YumaError;
use crate::snapshot::EpochSnapshot;

/// A miner column whose bonds may be wiped at a given epoch.
///
/// Used by the reset-capable Yuma versions (3.1, 3.2, 4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BondReset {
    /// Column index of the miner in that epoch's snapshot.
    pub miner_index: usize,
    /// Epoch at which the reset applies.
    pub epoch: usize,
}

/// Supplier of per-epoch simulation input.
///
/// Implemented by yumasim-cases (synthetic scenarios and metagraph replay).
/// The simulation loop treats a case as already loaded; it only validates
/// shapes before stepping.
pub trait Case {
    /// Human-readable case name.
    fn name(&self) -> &str;

    /// Every validator that appears in any epoch, in display order.
    fn validators(&self) -> &[String];

    /// Validator that percentage differences are reported against.
    fn base_validator(&self) -> &str;

    /// Number of epochs the case spans.
    fn num_epochs(&self) -> usize;

    /// Input for epoch `epoch` (0-based, `< num_epochs()`).
    fn snapshot(&self, epoch: usize) -> Result<EpochSnapshot, YumaError>;

    /// Optional bond reset used by the reset-capable versions.
    fn bond_reset(&self) -> Option<BondReset> {
        None
    }
}
