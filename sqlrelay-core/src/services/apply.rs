//! Apply service - runs a migration script against the remote endpoint
//!
//! Statements are processed strictly in source order, one at a time.
//! Verification queries are skipped, everything else is submitted through
//! the executor port. A failed statement is recorded and processing
//! continues (best-effort, no rollback) unless `bail` is set.

use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;

use crate::domain::{
    Action, ApplyReport, MigrationScript, StatementOutcome, StatementReport,
};
use crate::ports::StatementExecutor;

/// Options for an apply run
#[derive(Debug, Clone, Copy, Default)]
pub struct ApplyOptions {
    /// Classify and report without sending anything
    pub dry_run: bool,
    /// Stop at the first failed statement
    pub bail: bool,
}

/// Apply service for migration runs
pub struct ApplyService {
    executor: Arc<dyn StatementExecutor>,
}

impl ApplyService {
    pub fn new(executor: Arc<dyn StatementExecutor>) -> Self {
        Self { executor }
    }

    /// Apply a script, invoking `progress` after each statement is resolved.
    pub fn apply<F>(
        &self,
        script: &MigrationScript,
        options: ApplyOptions,
        mut progress: F,
    ) -> Result<ApplyReport>
    where
        F: FnMut(&StatementReport, usize),
    {
        let started = Instant::now();
        let statements = script.statements();
        let total = statements.len();
        let mut reports = Vec::with_capacity(total);

        for statement in &statements {
            let action = statement.action();
            let outcome = match action {
                Action::Skip => StatementOutcome::Skipped,
                Action::Execute if options.dry_run => StatementOutcome::Planned,
                Action::Execute => match self.executor.execute(&statement.text) {
                    Ok(()) => StatementOutcome::Executed,
                    Err(e) => StatementOutcome::Failed {
                        reason: e.to_string(),
                    },
                },
            };

            let report = StatementReport {
                index: statement.index,
                preview: statement.preview(),
                action,
                outcome,
            };
            progress(&report, total);

            let failed = report.is_failed();
            reports.push(report);

            if failed && options.bail {
                break;
            }
        }

        Ok(ApplyReport::new(
            script.source.clone(),
            script.checksum.clone(),
            reports,
            started.elapsed().as_millis() as u64,
            options.dry_run,
        ))
    }

    /// Apply without progress reporting
    pub fn apply_quiet(
        &self,
        script: &MigrationScript,
        options: ApplyOptions,
    ) -> Result<ApplyReport> {
        self.apply(script, options, |_, _| {})
    }
}
