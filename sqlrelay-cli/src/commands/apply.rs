//! Apply command - run a migration script against the remote endpoint

use std::path::PathBuf;

use anyhow::Result;
use colored::Colorize;
use dialoguer::Confirm;
use indicatif::{ProgressBar, ProgressStyle};

use sqlrelay_core::{ApplyOptions, ApplyReport, RunRecord, StatementOutcome};

use super::{get_context, get_logger, log_run, read_script};
use crate::output;

pub fn run(
    file: Option<PathBuf>,
    dry_run: bool,
    bail: bool,
    yes: bool,
    json: bool,
) -> Result<()> {
    let report = match apply_script(file, dry_run, bail, yes, json) {
        Ok(Some(report)) => report,
        // Cancelled at the prompt, or an empty script
        Ok(None) => return Ok(()),
        Err(e) => {
            // The run died before producing a report; record the abort
            let logger = get_logger();
            log_run(
                &logger,
                &RunRecord::from_error("apply", env!("CARGO_PKG_VERSION"), format!("{:#}", e)),
            );
            return Err(e);
        }
    };

    if report.has_failures() {
        anyhow::bail!(
            "{} of {} statement(s) failed; the target schema may be partially migrated",
            report.failed,
            report.total
        );
    }

    Ok(())
}

fn apply_script(
    file: Option<PathBuf>,
    dry_run: bool,
    bail: bool,
    yes: bool,
    json: bool,
) -> Result<Option<ApplyReport>> {
    let script = read_script(file.as_deref())?;
    let statements = script.statements();

    if statements.is_empty() {
        output::warning("No statements found in script.");
        return Ok(None);
    }

    let ctx = get_context()?;
    let endpoint = ctx.config.require_endpoint()?.to_string();

    if !dry_run && !yes && !json && atty::is(atty::Stream::Stdin) {
        let confirmed = Confirm::new()
            .with_prompt(format!(
                "Apply {} statement(s) from {} to {}?",
                statements.len(),
                script.source,
                endpoint
            ))
            .default(false)
            .interact()?;
        if !confirmed {
            println!("Cancelled.");
            return Ok(None);
        }
    }

    let options = ApplyOptions { dry_run, bail };

    let progress = if json {
        ProgressBar::hidden()
    } else {
        let pb = ProgressBar::new(statements.len() as u64);
        pb.set_style(
            ProgressStyle::with_template("[{bar:30}] {pos}/{len} {msg}")
                .expect("static progress template")
                .progress_chars("=> "),
        );
        pb
    };

    let report = ctx.apply_service.apply(&script, options, |statement, _| {
        progress.set_message(statement.preview.clone());
        match &statement.outcome {
            StatementOutcome::Failed { reason } => {
                progress.println(format!(
                    "{} statement {}: {}",
                    "Failed".red(),
                    statement.index + 1,
                    reason
                ));
            }
            StatementOutcome::Skipped => {
                progress.println(format!(
                    "{} statement {} (verification query)",
                    "Skipped".yellow(),
                    statement.index + 1
                ));
            }
            _ => {}
        }
        progress.inc(1);
    })?;
    progress.finish_and_clear();

    let logger = get_logger();
    log_run(
        &logger,
        &RunRecord::from_report("apply", env!("CARGO_PKG_VERSION"), &report),
    );

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_summary(&report);
    }

    Ok(Some(report))
}

fn print_summary(report: &ApplyReport) {
    println!();
    if report.dry_run {
        println!("{}", "DRY RUN - nothing was sent".yellow());
        println!(
            "{} statement(s) would be executed, {} skipped",
            report.planned, report.skipped
        );
        return;
    }

    if report.has_failures() {
        output::error(&format!(
            "Migration finished with failures in {}",
            output::format_duration(report.duration_ms)
        ));
    } else {
        output::success(&format!(
            "Migration complete in {}",
            output::format_duration(report.duration_ms)
        ));
    }
    println!("  Executed: {}", report.executed);
    println!("  Skipped: {} (verification queries)", report.skipped);
    if report.failed > 0 {
        println!("  Failed: {}", report.failed);
    }
    println!("  Script checksum: {}", &report.checksum[..12]);

    println!();
    output::info("Next steps:");
    println!("  1. Inspect the new schema in the database dashboard");
    println!("  2. Run any verification queries from the script manually");
    println!("  3. 'sqr history list' shows this run later");
}
