//! podanchor - harvest sensor readings into a pod and anchor them in a ledger.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

mod commands;
mod error;

#[derive(Parser, Debug)]
#[command(name = "podanchor")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the configuration file (TOML, YAML or JSON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log filter (trace, debug, info, warn, error, or a full directive)
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write a commented configuration file, unless one already exists
    Init,

    /// Poll the sensor forever, storing readings in the pod
    Harvest(commands::harvest::HarvestArgs),

    /// Check stored files against the ledger
    Verify(commands::verify::VerifyArgs),

    /// Inspect the ledger
    #[command(subcommand)]
    Ledger(commands::ledger::LedgerCommands),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = EnvFilter::try_new(&cli.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("Unable to start the async runtime: {err}");
            return ExitCode::FAILURE;
        },
    };

    let config = cli.config.as_deref();
    let result = match cli.command {
        Commands::Init => commands::init::run(config),
        Commands::Harvest(args) => runtime.block_on(commands::harvest::run(config, args)),
        Commands::Verify(args) => runtime.block_on(commands::verify::run(config, args)),
        Commands::Ledger(command) => runtime.block_on(commands::ledger::run(config, command)),
    };
    match result {
        Ok(code) => code,
        Err(err) => {
            tracing::error!(error = ?err, "Command failed");
            ExitCode::FAILURE
        },
    }
}
