//! History command - view and manage recorded runs

use anyhow::Result;
use chrono::{TimeZone, Utc};
use clap::Subcommand;
use colored::Colorize;

use super::get_logger;
use crate::output;

#[derive(Subcommand)]
pub enum HistoryCommands {
    /// Show recent runs
    List {
        /// Number of runs to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
        /// Show only runs with failures
        #[arg(long)]
        failures: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete the run history
    Clear {
        /// Skip confirmation prompt
        #[arg(long, short = 'f')]
        force: bool,
    },
}

fn format_timestamp(timestamp_ms: i64) -> String {
    Utc.timestamp_millis_opt(timestamp_ms)
        .single()
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| timestamp_ms.to_string())
}

pub fn run(command: HistoryCommands) -> Result<()> {
    let logger = get_logger().ok_or_else(|| anyhow::anyhow!("Failed to open run history"))?;

    match command {
        HistoryCommands::List {
            limit,
            failures,
            json,
        } => {
            let records = if failures {
                logger.failures(limit)?
            } else {
                logger.recent(limit)?
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&records)?);
                return Ok(());
            }

            if records.is_empty() {
                println!("No runs recorded yet.");
                return Ok(());
            }

            let mut table = output::create_table();
            table.set_header(vec![
                "Time", "Command", "Script", "Executed", "Skipped", "Failed", "Duration",
            ]);

            for record in &records {
                let failed = if record.failed > 0 {
                    record.failed.to_string().red().to_string()
                } else {
                    record.failed.to_string()
                };
                table.add_row(vec![
                    format_timestamp(record.timestamp_ms),
                    if record.dry_run {
                        format!("{} (dry run)", record.command)
                    } else {
                        record.command.clone()
                    },
                    record.source.clone().unwrap_or_default(),
                    record.executed.to_string(),
                    record.skipped.to_string(),
                    failed,
                    output::format_duration(record.duration_ms),
                ]);
            }

            println!("{}", table);

            let errors: Vec<_> = records.iter().filter(|r| r.error.is_some()).collect();
            if !errors.is_empty() {
                println!();
                println!("{}", "Aborted runs:".red().bold());
                for record in errors.iter().take(3) {
                    println!(
                        "  {} [{}]: {}",
                        format_timestamp(record.timestamp_ms).dimmed(),
                        record.command,
                        record.error.as_deref().unwrap_or("Unknown error")
                    );
                }
            }
        }
        HistoryCommands::Clear { force } => {
            if !force {
                use dialoguer::Confirm;
                if !Confirm::new()
                    .with_prompt("Delete the run history?")
                    .default(false)
                    .interact()?
                {
                    println!("Cancelled.");
                    return Ok(());
                }
            }

            let deleted = logger.clear()?;
            println!("Deleted {} run record(s)", deleted);
        }
    }

    Ok(())
}
