// crates/yumasim-cli/src/commands/dividends.rs
//
// `yumasim dividends` — total-dividends tables for every synthetic case and
// every Yuma version, one CSV per bond penalty.

use std::path::PathBuf;

use clap::Args;

use yumasim_cases::{all_cases, create_case};
use yumasim_consensus::{total_dividends_table, ValidatorLabels, YumaVersion};
use yumasim_core::{Case, YumaConfig};

use super::{penalty_label, DEFAULT_BOND_PENALTIES};
use crate::output::write_file;

/// Total-dividends sweep command.
#[derive(Debug, Args)]
pub struct DividendsCmd {
    /// Bond penalties to sweep, one CSV each.
    #[arg(long, num_args = 1.., default_values_t = DEFAULT_BOND_PENALTIES)]
    pub bond_penalties: Vec<f64>,

    /// Directory the CSV files are written to.
    #[arg(long, default_value = "results")]
    pub output_dir: PathBuf,

    /// Restrict the sweep to these case keys (default: all).
    #[arg(long, num_args = 1..)]
    pub cases: Vec<String>,
}

/// Run the dividends command.
pub fn run(cmd: &DividendsCmd, config: &YumaConfig) -> Result<(), Box<dyn std::error::Error>> {
    let cases: Vec<Box<dyn Case>> = if cmd.cases.is_empty() {
        all_cases()
            .into_iter()
            .map(|c| Box::new(c) as Box<dyn Case>)
            .collect()
    } else {
        cmd.cases
            .iter()
            .map(|key| create_case(key).map(|c| Box::new(c) as Box<dyn Case>))
            .collect::<Result<_, _>>()?
    };

    let versions: Vec<(YumaVersion, _)> = YumaVersion::all()
        .into_iter()
        .map(|v| (v, v.sweep_params(&config.params)))
        .collect();

    for &bond_penalty in &cmd.bond_penalties {
        tracing::info!(
            "Generating total dividends table for bond_penalty={}",
            bond_penalty
        );
        let mut simulation = config.simulation.clone();
        simulation.bond_penalty = bond_penalty;

        let table = total_dividends_table(&cases, &versions, &simulation, ValidatorLabels::Positional)?;
        let path = write_file(
            &cmd.output_dir,
            &format!("total_dividends_b{}.csv", penalty_label(bond_penalty)),
            &table.to_csv()?,
        )?;
        println!(
            "bond_penalty={}: {} cases x {} columns -> {}",
            bond_penalty,
            table.rows.len(),
            table.columns.len(),
            path.display()
        );
    }

    Ok(())
}
