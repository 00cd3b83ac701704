// crates/yumasim-cli/src/commands/mod.rs
//
// Command module declarations for the yumasim CLI.

pub mod cases;
pub mod dividends;
pub mod replay;
pub mod simulate;

/// Bond penalties swept when none are given.
pub const DEFAULT_BOND_PENALTIES: [f64; 4] = [0.0, 0.5, 0.99, 1.0];

/// Bond penalty as it appears in output file names: always with a
/// fractional part, so 1 is written "1.0".
pub fn penalty_label(bond_penalty: f64) -> String {
    format!("{:?}", bond_penalty)
}
