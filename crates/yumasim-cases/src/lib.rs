// crates/yumasim-cases/src/lib.rs
//
// yumasim-cases: Simulation inputs for the Yuma consensus simulator.
//
// Two providers implement the `Case` trait: the synthetic scenario library
// (fourteen named three-validator scenarios) and replay of stored metagraph
// snapshots.

pub mod metagraph;
pub mod synthetic;

// Re-export key types for ergonomic access from downstream crates.
pub use metagraph::{load_snapshots_from_dir, MetagraphCase};
pub use synthetic::{all_cases, create_case, SyntheticCase, CASE_KEYS, DEFAULT_NUM_EPOCHS};
