// crates/yumasim-cli/src/main.rs
//
// CLI entrypoint for the Yuma consensus simulator.
//
// Provides subcommands for listing the synthetic cases, running one case
// under one Yuma version, sweeping total dividends across all cases and
// versions, and replaying stored metagraph snapshots.

mod commands;
mod config;
mod output;

use clap::{Parser, Subcommand};
use commands::dividends::DividendsCmd;
use commands::replay::ReplayCmd;
use commands::simulate::SimulateCmd;

/// yumasim: compare Yuma consensus variants on synthetic and replayed subnets.
#[derive(Parser, Debug)]
#[command(
    name = "yumasim",
    version = "0.1.0",
    about = "Yuma consensus simulator: compare bonding and EMA variants by validator dividends"
)]
struct Cli {
    /// Path to a TOML configuration file with [simulation] and [yuma] tables.
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level subcommands.
#[derive(Debug, Subcommand)]
enum Commands {
    /// List the registered synthetic cases.
    Cases,

    /// Run one case under one Yuma version.
    Simulate(SimulateCmd),

    /// Write total-dividends tables for all cases and versions.
    Dividends(DividendsCmd),

    /// Replay stored metagraph snapshots.
    Replay(ReplayCmd),
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing subscriber for structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = config::load_or_default(cli.config.as_deref())?;

    match &cli.command {
        Commands::Cases => commands::cases::run()?,
        Commands::Simulate(cmd) => commands::simulate::run(cmd, &config)?,
        Commands::Dividends(cmd) => commands::dividends::run(cmd, &config)?,
        Commands::Replay(cmd) => commands::replay::run(cmd, &config)?,
    }

    Ok(())
}
