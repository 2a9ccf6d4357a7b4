//! # entrovault CLI entry point
//!
//! Parses command-line arguments, loads configuration, initialises tracing,
//! and dispatches to the subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use entrovault_cli::{resolve_state_file, run_command, Command, LogFormat, VaultConfig};

/// entrovault: a write-once encrypted value vault with entropy mixing.
#[derive(Parser, Debug)]
#[command(name = "entrovault", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to a YAML configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Path to the deployment state file (overrides the configuration).
    #[arg(long, global = true)]
    state: Option<PathBuf>,

    /// Log output format (overrides the configuration).
    #[arg(long, value_enum, global = true)]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Command,
}

fn init_tracing(verbose: u8, format: LogFormat) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    match format {
        LogFormat::Pretty => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = VaultConfig::load(cli.config.as_deref());
    let format = cli
        .log_format
        .or_else(|| config.as_ref().ok().map(|c| c.log_format))
        .unwrap_or_default();
    init_tracing(cli.verbose, format);

    let config = match config {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("{e:#}");
            return ExitCode::from(1);
        }
    };
    let state_file = resolve_state_file(cli.state.as_deref(), &config);
    tracing::debug!(state_file = %state_file.display(), "resolved state file");

    match run_command(&cli.command, &config, &state_file) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}
