//! Statement splitting and classification
//!
//! A statement is just "text between two `;` occurrences" - there is no
//! structural parsing of SQL here. The remote endpoint is the authority on
//! validity; `syntax_warning` exists only so `plan --check` can point out
//! fragments that look like a bad split.

use serde::Serialize;
use sqlparser::dialect::GenericDialect;
use sqlparser::parser::Parser;

/// Maximum characters shown in a statement preview
const PREVIEW_LEN: usize = 60;

/// What to do with a statement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// Send to the remote endpoint
    Execute,
    /// Verification query, never sent to the mutation endpoint
    Skip,
}

/// One candidate SQL statement from a migration script
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    /// Zero-based position in the script
    pub index: usize,
    /// Statement text, trimmed, without the trailing `;`
    pub text: String,
}

/// Split a script into candidate statements.
///
/// Splits on `;`, trims each piece, and drops pieces that are blank or
/// consist only of `--` line comments. A fragment that mixes comment lines
/// with SQL is kept whole. Statement order equals source order.
///
/// Known limitation: the split does not understand string literals or block
/// comments, so a `;` inside a quoted literal terminates a statement early.
/// Use `Statement::syntax_warning` to surface fragments that no longer parse.
pub fn split_statements(sql: &str) -> Vec<Statement> {
    sql.split(';')
        .map(str::trim)
        .filter(|s| !is_comment_only(s))
        .enumerate()
        .map(|(index, text)| Statement {
            index,
            text: text.to_string(),
        })
        .collect()
}

/// True when every line is blank or a `--` comment (an empty fragment counts)
fn is_comment_only(fragment: &str) -> bool {
    fragment
        .lines()
        .map(str::trim)
        .all(|line| line.is_empty() || line.starts_with("--"))
}

impl Statement {
    /// Classify the statement.
    ///
    /// Verification queries against `information_schema` are skipped: the
    /// heuristic matches a case-insensitive `SELECT` together with the
    /// literal substring `FROM information_schema`.
    pub fn action(&self) -> Action {
        if self.text.to_uppercase().contains("SELECT")
            && self.text.contains("FROM information_schema")
        {
            Action::Skip
        } else {
            Action::Execute
        }
    }

    /// Short single-line preview for progress output
    pub fn preview(&self) -> String {
        // Comment-only fragments never survive splitting, so a non-comment
        // line exists for any statement produced by `split_statements`.
        let first_line = self
            .text
            .lines()
            .map(str::trim)
            .find(|l| !l.is_empty() && !l.starts_with("--"))
            .unwrap_or("");

        if first_line.chars().count() > PREVIEW_LEN {
            let truncated: String = first_line.chars().take(PREVIEW_LEN).collect();
            format!("{}...", truncated)
        } else {
            first_line.to_string()
        }
    }

    /// Best-effort syntax check using a generic SQL dialect.
    ///
    /// Returns the parse error message when the text does not parse.
    /// Advisory only - a warning never blocks execution.
    pub fn syntax_warning(&self) -> Option<String> {
        match Parser::parse_sql(&GenericDialect {}, &self.text) {
            Ok(_) => None,
            Err(e) => Some(e.to_string()),
        }
    }
}
