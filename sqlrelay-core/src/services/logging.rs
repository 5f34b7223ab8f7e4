//! Run history - structured logging of apply runs
//!
//! Runs are appended to runs.jsonl in the app directory, one JSON object per
//! line. No statement text is ever logged - only counts, the script
//! checksum, and error summaries.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::Result;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::ApplyReport;

/// Get current unix timestamp in milliseconds
fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

/// Detect the current platform
fn detect_platform() -> &'static str {
    if cfg!(target_os = "macos") {
        "macos"
    } else if cfg!(target_os = "windows") {
        "windows"
    } else if cfg!(target_os = "linux") {
        "linux"
    } else {
        "unknown"
    }
}

/// One recorded run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRecord {
    pub id: Uuid,
    pub timestamp_ms: i64,
    pub app_version: String,
    pub platform: String,
    /// Command that produced the record
    pub command: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
    pub executed: usize,
    pub skipped: usize,
    pub failed: usize,
    pub duration_ms: u64,
    pub dry_run: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RunRecord {
    /// Build a record from an apply report
    pub fn from_report(command: &str, app_version: &str, report: &ApplyReport) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp_ms: now_ms(),
            app_version: app_version.to_string(),
            platform: detect_platform().to_string(),
            command: command.to_string(),
            source: Some(report.source.clone()),
            checksum: Some(report.checksum.clone()),
            executed: report.executed,
            skipped: report.skipped,
            failed: report.failed,
            duration_ms: report.duration_ms,
            dry_run: report.dry_run,
            error: None,
        }
    }

    /// Build a record for a run that died before producing a report
    pub fn from_error(command: &str, app_version: &str, error: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp_ms: now_ms(),
            app_version: app_version.to_string(),
            platform: detect_platform().to_string(),
            command: command.to_string(),
            source: None,
            checksum: None,
            executed: 0,
            skipped: 0,
            failed: 0,
            duration_ms: 0,
            dry_run: false,
            error: Some(error.into()),
        }
    }

    pub fn is_failure(&self) -> bool {
        self.failed > 0 || self.error.is_some()
    }
}

/// Service for recording and querying run history
pub struct LoggingService {
    log_path: PathBuf,
}

impl LoggingService {
    /// Create a new logging service, ensuring the app directory exists
    pub fn new(app_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(app_dir)?;
        Ok(Self {
            log_path: app_dir.join("runs.jsonl"),
        })
    }

    /// Append a run record
    pub fn record(&self, record: &RunRecord) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)?;
        let line = serde_json::to_string(record)?;
        writeln!(file, "{}", line)?;
        Ok(())
    }

    /// Most recent runs, newest first. Malformed lines are skipped.
    pub fn recent(&self, limit: usize) -> Result<Vec<RunRecord>> {
        let mut records = self.read_all()?;
        records.reverse();
        records.truncate(limit);
        Ok(records)
    }

    /// Most recent failed runs, newest first
    pub fn failures(&self, limit: usize) -> Result<Vec<RunRecord>> {
        let mut records = self.read_all()?;
        records.retain(RunRecord::is_failure);
        records.reverse();
        records.truncate(limit);
        Ok(records)
    }

    /// Total recorded runs
    pub fn count(&self) -> Result<usize> {
        Ok(self.read_all()?.len())
    }

    /// Delete the run history, returning how many records were removed
    pub fn clear(&self) -> Result<usize> {
        let count = self.count()?;
        if self.log_path.exists() {
            std::fs::remove_file(&self.log_path)?;
        }
        Ok(count)
    }

    pub fn path(&self) -> &Path {
        &self.log_path
    }

    fn read_all(&self) -> Result<Vec<RunRecord>> {
        if !self.log_path.exists() {
            return Ok(Vec::new());
        }
        let content = std::fs::read_to_string(&self.log_path)?;
        Ok(content
            .lines()
            .filter_map(|line| serde_json::from_str(line).ok())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn record_with(failed: usize) -> RunRecord {
        RunRecord {
            id: Uuid::new_v4(),
            timestamp_ms: now_ms(),
            app_version: "0.1.0".to_string(),
            platform: "linux".to_string(),
            command: "apply".to_string(),
            source: Some("m.sql".to_string()),
            checksum: Some("abc".to_string()),
            executed: 3,
            skipped: 1,
            failed,
            duration_ms: 42,
            dry_run: false,
            error: None,
        }
    }

    #[test]
    fn test_record_and_recent_round_trip() {
        let dir = TempDir::new().unwrap();
        let service = LoggingService::new(dir.path()).unwrap();

        let first = record_with(0);
        let second = record_with(1);
        service.record(&first).unwrap();
        service.record(&second).unwrap();

        let recent = service.recent(10).unwrap();
        assert_eq!(recent.len(), 2);
        // Newest first
        assert_eq!(recent[0].id, second.id);
        assert_eq!(recent[1].id, first.id);
    }

    #[test]
    fn test_failures_filters_clean_runs() {
        let dir = TempDir::new().unwrap();
        let service = LoggingService::new(dir.path()).unwrap();

        service.record(&record_with(0)).unwrap();
        service.record(&record_with(2)).unwrap();

        let failures = service.failures(10).unwrap();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].failed, 2);
    }

    #[test]
    fn test_malformed_lines_are_skipped() {
        let dir = TempDir::new().unwrap();
        let service = LoggingService::new(dir.path()).unwrap();

        service.record(&record_with(0)).unwrap();
        std::fs::write(
            service.path(),
            format!(
                "{}\nnot json at all\n",
                std::fs::read_to_string(service.path()).unwrap().trim_end()
            ),
        )
        .unwrap();

        assert_eq!(service.recent(10).unwrap().len(), 1);
    }

    #[test]
    fn test_clear_removes_history() {
        let dir = TempDir::new().unwrap();
        let service = LoggingService::new(dir.path()).unwrap();

        service.record(&record_with(0)).unwrap();
        let deleted = service.clear().unwrap();
        assert_eq!(deleted, 1);
        assert_eq!(service.count().unwrap(), 0);
    }

    #[test]
    fn test_recent_on_empty_history() {
        let dir = TempDir::new().unwrap();
        let service = LoggingService::new(dir.path()).unwrap();
        assert!(service.recent(10).unwrap().is_empty());
    }
}
