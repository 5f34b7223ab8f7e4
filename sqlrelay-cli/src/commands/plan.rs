//! Plan command - show how a script splits and classifies, without executing

use std::path::PathBuf;

use anyhow::Result;
use colored::Colorize;
use serde_json::json;

use sqlrelay_core::Action;

use crate::output;
use super::read_script;

pub fn run(file: Option<PathBuf>, check: bool, json: bool) -> Result<()> {
    let script = read_script(file.as_deref())?;
    let statements = script.statements();

    if json {
        let rows: Vec<serde_json::Value> = statements
            .iter()
            .map(|s| {
                let mut row = json!({
                    "index": s.index,
                    "action": s.action(),
                    "preview": s.preview(),
                });
                if check {
                    row["syntaxWarning"] = json!(s.syntax_warning());
                }
                row
            })
            .collect();
        println!(
            "{}",
            serde_json::to_string_pretty(&json!({
                "source": script.source,
                "checksum": script.checksum,
                "statements": rows,
            }))?
        );
        return Ok(());
    }

    if statements.is_empty() {
        output::warning("No statements found in script.");
        return Ok(());
    }

    let mut table = output::create_table();
    let mut header = vec!["#", "Action", "Statement"];
    if check {
        header.push("Syntax");
    }
    table.set_header(header);

    let mut warnings = 0;
    for statement in &statements {
        let action = match statement.action() {
            Action::Execute => "execute".to_string(),
            Action::Skip => "skip".to_string(),
        };
        let mut row = vec![
            (statement.index + 1).to_string(),
            action,
            statement.preview(),
        ];
        if check {
            match statement.syntax_warning() {
                Some(_) => {
                    warnings += 1;
                    row.push("!".to_string());
                }
                None => row.push(String::new()),
            }
        }
        table.add_row(row);
    }

    println!("{}", table);
    println!();

    let execute = statements
        .iter()
        .filter(|s| s.action() == Action::Execute)
        .count();
    println!(
        "{} statement(s): {} to execute, {} skipped",
        statements.len(),
        execute,
        statements.len() - execute
    );

    if check && warnings > 0 {
        println!();
        println!("{}", "Syntax warnings:".yellow());
        for statement in &statements {
            if let Some(warning) = statement.syntax_warning() {
                println!(
                    "  {} statement {}: {}",
                    "!".yellow(),
                    statement.index + 1,
                    warning
                );
            }
        }
        println!(
            "{}",
            "Warnings are advisory; a ';' inside a string literal can split a statement early."
                .dimmed()
        );
    }

    Ok(())
}
