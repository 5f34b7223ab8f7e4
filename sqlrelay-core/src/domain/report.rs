//! Per-statement outcomes and the apply report

use serde::Serialize;

use crate::domain::statement::Action;

/// Outcome of processing one statement.
///
/// `Executed` means the endpoint returned an HTTP success status, not merely
/// that a request was sent. Transport failures and non-2xx responses are both
/// `Failed`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum StatementOutcome {
    /// Verification query, not sent
    Skipped,
    /// Dry run - would have been sent
    Planned,
    /// Sent and acknowledged with an HTTP success status
    Executed,
    /// Sent but refused, or the request never completed
    Failed { reason: String },
}

/// Report for one statement
#[derive(Debug, Clone, Serialize)]
pub struct StatementReport {
    pub index: usize,
    pub preview: String,
    pub action: Action,
    #[serde(flatten)]
    pub outcome: StatementOutcome,
}

impl StatementReport {
    pub fn is_failed(&self) -> bool {
        matches!(self.outcome, StatementOutcome::Failed { .. })
    }
}

/// Summary of an apply run
#[derive(Debug, Clone, Serialize)]
pub struct ApplyReport {
    /// Where the script came from (path or `<stdin>`)
    pub source: String,
    /// SHA-256 of the script text
    pub checksum: String,
    /// Total candidate statements after splitting
    pub total: usize,
    pub executed: usize,
    pub skipped: usize,
    pub failed: usize,
    pub planned: usize,
    pub duration_ms: u64,
    pub dry_run: bool,
    pub statements: Vec<StatementReport>,
}

impl ApplyReport {
    /// Assemble a report, deriving counts from the per-statement outcomes
    pub fn new(
        source: String,
        checksum: String,
        statements: Vec<StatementReport>,
        duration_ms: u64,
        dry_run: bool,
    ) -> Self {
        let mut executed = 0;
        let mut skipped = 0;
        let mut failed = 0;
        let mut planned = 0;

        for s in &statements {
            match s.outcome {
                StatementOutcome::Executed => executed += 1,
                StatementOutcome::Skipped => skipped += 1,
                StatementOutcome::Failed { .. } => failed += 1,
                StatementOutcome::Planned => planned += 1,
            }
        }

        Self {
            source,
            checksum,
            total: statements.len(),
            executed,
            skipped,
            failed,
            planned,
            duration_ms,
            dry_run,
            statements,
        }
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(outcome: StatementOutcome) -> StatementReport {
        StatementReport {
            index: 0,
            preview: "CREATE TABLE t".to_string(),
            action: Action::Execute,
            outcome,
        }
    }

    #[test]
    fn test_counts_match_outcomes() {
        let statements = vec![
            report(StatementOutcome::Executed),
            report(StatementOutcome::Skipped),
            report(StatementOutcome::Failed {
                reason: "HTTP 400".to_string(),
            }),
            report(StatementOutcome::Executed),
        ];

        let summary = ApplyReport::new("m.sql".into(), "abc".into(), statements, 12, false);
        assert_eq!(summary.total, 4);
        assert_eq!(summary.executed, 2);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.planned, 0);
        assert!(summary.has_failures());
    }

    #[test]
    fn test_no_failures_on_clean_run() {
        let statements = vec![report(StatementOutcome::Executed)];
        let summary = ApplyReport::new("m.sql".into(), "abc".into(), statements, 1, false);
        assert!(!summary.has_failures());
    }

    #[test]
    fn test_report_serializes_outcome_status() {
        let summary = ApplyReport::new(
            "m.sql".into(),
            "abc".into(),
            vec![report(StatementOutcome::Failed {
                reason: "timeout".to_string(),
            })],
            5,
            false,
        );
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["statements"][0]["status"], "failed");
        assert_eq!(json["statements"][0]["reason"], "timeout");
    }
}
