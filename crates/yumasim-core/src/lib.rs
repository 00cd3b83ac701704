// crates/yumasim-core/src/lib.rs
//
// yumasim-core: Core types, configuration, and case traits for the Yuma
// consensus simulator.
//
// This is the leaf crate that all other crates in the workspace depend on.
// It defines the configuration structures, the per-epoch case input, the
// identity roster used to realign matrices between epochs, and the error type.

pub mod config;
pub mod error;
pub mod identity;
pub mod metagraph;
pub mod snapshot;
pub mod traits;

// Re-export key types for ergonomic access from downstream crates.
// Usage: `use yumasim_core::YumaConfig;`

// Configuration
pub use config::{SimulationHyperparameters, YumaConfig, YumaParams};

// Identity roster
pub use identity::Roster;

// Case input
pub use metagraph::MetagraphSnapshot;
pub use snapshot::EpochSnapshot;
pub use traits::{BondReset, Case};

// Error type
pub use error::YumaError;
