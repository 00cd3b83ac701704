// crates/yumasim-cli/src/commands/replay.rs
//
// `yumasim replay --metagraphs-dir <dir>` — replay stored metagraph snapshots
// and report total dividends per validator hotkey.

use std::path::PathBuf;

use clap::Args;

use yumasim_cases::{load_snapshots_from_dir, MetagraphCase};
use yumasim_consensus::{total_dividends_table, ValidatorLabels, YumaVersion};
use yumasim_core::{Case, YumaConfig};

use super::{penalty_label, DEFAULT_BOND_PENALTIES};
use crate::output::{format_json, format_records, write_file, OutputFormat};

/// Metagraph replay command.
#[derive(Debug, Args)]
pub struct ReplayCmd {
    /// Directory holding one JSON metagraph snapshot per epoch.
    #[arg(long, default_value = "metagraphs")]
    pub metagraphs_dir: PathBuf,

    /// Lag one validator's weights by one epoch.
    #[arg(long)]
    pub introduce_shift: bool,

    /// Uid of the validator whose weights are lagged.
    #[arg(long, default_value = "0")]
    pub shift_validator_id: usize,

    /// Bond penalties to replay under.
    #[arg(long, num_args = 1.., default_values_t = DEFAULT_BOND_PENALTIES)]
    pub bond_penalties: Vec<f64>,

    /// Yuma versions to replay.
    #[arg(long, num_args = 1.., default_value = "Yuma 4 (Rhef+relative bonds) - liquid alpha on")]
    pub versions: Vec<String>,

    /// Also write one CSV per bond penalty to this directory.
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Print tables as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Run the replay command.
pub fn run(cmd: &ReplayCmd, config: &YumaConfig) -> Result<(), Box<dyn std::error::Error>> {
    let versions = cmd
        .versions
        .iter()
        .map(|name| {
            let version: YumaVersion = name.parse()?;
            Ok((version, version.sweep_params(&config.params)))
        })
        .collect::<Result<Vec<_>, yumasim_core::YumaError>>()?;

    let metas = load_snapshots_from_dir(&cmd.metagraphs_dir)?;
    let shift = cmd.introduce_shift.then_some(cmd.shift_validator_id);
    let case = MetagraphCase::from_snapshots("Metagraph simulation", metas, shift)?;
    let validators = case.validators().to_vec();
    let cases: Vec<Box<dyn Case>> = vec![Box::new(case)];

    let file_kind = if cmd.introduce_shift { "shifted" } else { "results" };

    for &bond_penalty in &cmd.bond_penalties {
        tracing::info!("Replaying metagraphs with bond_penalty={}", bond_penalty);
        let mut simulation = config.simulation.clone();
        simulation.bond_penalty = bond_penalty;

        let table = total_dividends_table(&cases, &versions, &simulation, ValidatorLabels::Names)?;

        match OutputFormat::from_json_flag(cmd.json) {
            OutputFormat::Json => println!("{}", format_json(&table)),
            OutputFormat::Table => {
                let mut header = vec!["Validator".to_string()];
                header.extend(versions.iter().map(|(v, _)| v.to_string()));
                let rows = validators
                    .iter()
                    .map(|validator| {
                        let mut row = vec![validator.clone()];
                        row.extend(versions.iter().map(|(version, _)| {
                            format!("{:.6}", table.value(0, &format!("{} - {}", validator, version)))
                        }));
                        row
                    })
                    .collect();
                println!("bond_penalty={}", bond_penalty);
                println!("{}", format_records(header, rows));
            }
        }

        if let Some(dir) = &cmd.output_dir {
            write_file(
                dir,
                &format!(
                    "metagraph_total_dividends_{}_b{}.csv",
                    file_kind,
                    penalty_label(bond_penalty)
                ),
                &table.to_csv()?,
            )?;
        }
    }

    Ok(())
}
