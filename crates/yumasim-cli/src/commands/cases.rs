// crates/yumasim-cli/src/commands/cases.rs
//
// `yumasim cases` — list the registered synthetic scenarios.

use tabled::Tabled;

use yumasim_cases::{create_case, CASE_KEYS};
use yumasim_core::Case;

use crate::output::format_table;

/// A row in the case listing.
#[derive(Tabled)]
struct CaseRow {
    #[tabled(rename = "Key")]
    key: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Base validator")]
    base_validator: String,
    #[tabled(rename = "Epochs")]
    epochs: usize,
    #[tabled(rename = "Bond reset")]
    bond_reset: String,
}

/// Run the cases command.
pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut rows = Vec::with_capacity(CASE_KEYS.len());
    for key in CASE_KEYS {
        let case = create_case(key)?;
        rows.push(CaseRow {
            key: key.to_string(),
            name: case.name().to_string(),
            base_validator: case.base_validator().to_string(),
            epochs: case.num_epochs(),
            bond_reset: case.bond_reset().map_or("--".to_string(), |r| {
                format!("{} @ epoch {}", case.servers()[r.miner_index], r.epoch)
            }),
        });
    }

    println!("{}", format_table(&rows));
    Ok(())
}
