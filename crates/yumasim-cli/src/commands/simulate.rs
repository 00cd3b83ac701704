// crates/yumasim-cli/src/commands/simulate.rs
//
// `yumasim simulate --case <key> --version <name>` — run one case under one
// Yuma version and print per-epoch dividends and totals.

use clap::Args;
use serde::Serialize;
use tabled::Tabled;

use yumasim_cases::create_case;
use yumasim_consensus::{run_simulation, SimulationResult, YumaVersion};
use yumasim_core::YumaConfig;
use yumasim_economics::TotalDividends;

use crate::output::{format_json, format_records, format_table, OutputFormat};

/// Single-run simulation command.
#[derive(Debug, Args)]
pub struct SimulateCmd {
    /// Registry key of the case, e.g. "Case 1".
    #[arg(long)]
    pub case: String,

    /// Yuma version name, e.g. "Yuma 1 (paper)".
    #[arg(long)]
    pub version: String,

    /// Override the configured bond penalty.
    #[arg(long)]
    pub bond_penalty: Option<f64>,

    /// Simulate only the first N epochs.
    #[arg(long)]
    pub epochs: Option<usize>,

    /// Print the full result as JSON.
    #[arg(long)]
    pub json: bool,
}

/// JSON body of a simulation run.
#[derive(Serialize)]
struct SimulationReport<'a> {
    result: &'a SimulationResult,
    totals: &'a TotalDividends,
}

/// A row in the totals table.
#[derive(Tabled)]
struct TotalRow {
    #[tabled(rename = "Validator")]
    validator: String,
    #[tabled(rename = "Total dividends")]
    total: String,
    #[tabled(rename = "vs base")]
    diff: String,
}

/// Run the simulate command.
pub fn run(cmd: &SimulateCmd, config: &YumaConfig) -> Result<(), Box<dyn std::error::Error>> {
    let version: YumaVersion = cmd.version.parse()?;
    let mut case = create_case(&cmd.case)?;
    if let Some(epochs) = cmd.epochs {
        case = case.with_num_epochs(epochs);
    }

    let mut config = config.clone();
    if let Some(bond_penalty) = cmd.bond_penalty {
        config.simulation.bond_penalty = bond_penalty;
    }
    config.params = version.sweep_params(&config.params);

    let result = run_simulation(&case, version, &config)?;
    let totals = result.total_dividends();

    match OutputFormat::from_json_flag(cmd.json) {
        OutputFormat::Json => {
            let report = SimulationReport {
                result: &result,
                totals: &totals,
            };
            println!("{}", format_json(&report));
        }
        OutputFormat::Table => {
            println!("{} | {}", result.case_name, version);
            println!("Dividend per 1000 stake units");
            println!();

            let mut header = vec!["Epoch".to_string()];
            header.extend(result.validators.iter().cloned());
            let rows = result
                .epochs
                .clone()
                .enumerate()
                .map(|(i, epoch)| {
                    let mut row = vec![epoch.to_string()];
                    row.extend(
                        result
                            .validators
                            .iter()
                            .map(|v| format!("{:.6}", result.dividends(v)[i])),
                    );
                    row
                })
                .collect();
            println!("{}", format_records(header, rows));
            println!();

            let total_rows: Vec<TotalRow> = result
                .validators
                .iter()
                .map(|v| TotalRow {
                    validator: v.clone(),
                    total: format!("{:.6}", totals.total(v)),
                    diff: format!(
                        "{:+.2}%",
                        totals.percentage_diff_vs_base.get(v).copied().unwrap_or(0.0)
                    ),
                })
                .collect();
            println!("{}", format_table(&total_rows));
        }
    }

    Ok(())
}
