//! sqlrelay CLI - apply SQL migrations to a hosted database over RPC

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod output;

use commands::{apply, check, history, plan, setup};

/// sqlrelay - apply SQL migrations to a hosted database
#[derive(Parser)]
#[command(name = "sqr", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply a migration script to the remote endpoint
    Apply {
        /// Path to the SQL script (reads stdin when omitted and piped)
        file: Option<PathBuf>,
        /// Classify and report without sending anything
        #[arg(long)]
        dry_run: bool,
        /// Stop at the first failed statement
        #[arg(long)]
        bail: bool,
        /// Skip the confirmation prompt
        #[arg(long, short)]
        yes: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show how a script would be split and classified, without executing
    Plan {
        /// Path to the SQL script (reads stdin when omitted and piped)
        file: Option<PathBuf>,
        /// Add advisory syntax checks to each statement
        #[arg(long)]
        check: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run pre-flight checks on configuration and credentials
    Check {
        /// Also probe the endpoint for reachability
        #[arg(long)]
        probe: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Configure the endpoint URL
    Setup {
        /// Endpoint base URL (prompts when omitted)
        #[arg(long)]
        endpoint: Option<String>,
    },

    /// View and manage run history
    History {
        #[command(subcommand)]
        command: history::HistoryCommands,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = run(cli);

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Apply {
            file,
            dry_run,
            bail,
            yes,
            json,
        } => apply::run(file, dry_run, bail, yes, json),
        Commands::Plan { file, check, json } => plan::run(file, check, json),
        Commands::Check { probe, json } => check::run(probe, json),
        Commands::Setup { endpoint } => setup::run(endpoint),
        Commands::History { command } => history::run(command),
    }
}
