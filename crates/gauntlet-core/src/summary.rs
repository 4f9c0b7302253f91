//! Suite summary persistence.
//!
//! After a suite completes, one row per executed test goes to a tabular
//! store, plus a single-line overall-status artifact for automation to read.
//! Appending to a pre-existing store is additive, never destructive.

use crate::suite::SuiteResults;
use chrono::Utc;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use thiserror::Error;

/// Errors from the summary-persistence collaborator.
#[derive(Debug, Error)]
pub enum SummaryError {
    /// Filesystem failure while persisting the summary.
    #[error("failed to persist summary at {path}: {source}")]
    Io {
        /// File being written.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },
}

/// Persists the results of a completed suite run.
pub trait SummaryStore: Send + Sync {
    /// Appends one row per executed test and records the suite verdict.
    fn persist(&self, results: &SuiteResults) -> Result<(), SummaryError>;
}

/// Tab-separated summary store.
///
/// Writes `summary.tsv` (one row per test: category, identifier, name,
/// description, status, reasons) with append semantics, and `suite-status`
/// containing just the overall verdict.
#[derive(Debug, Clone)]
pub struct TsvSummaryStore {
    dir: PathBuf,
}

impl TsvSummaryStore {
    const SUMMARY_FILE: &'static str = "summary.tsv";
    const STATUS_FILE: &'static str = "suite-status";

    /// Creates a store writing into `dir`.
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// Path of the tabular summary file.
    pub fn summary_path(&self) -> PathBuf {
        self.dir.join(Self::SUMMARY_FILE)
    }

    /// Path of the single-line overall-status file.
    pub fn status_path(&self) -> PathBuf {
        self.dir.join(Self::STATUS_FILE)
    }

    fn io_err(&self, path: PathBuf) -> impl FnOnce(std::io::Error) -> SummaryError {
        move |source| SummaryError::Io { path, source }
    }
}

impl SummaryStore for TsvSummaryStore {
    fn persist(&self, results: &SuiteResults) -> Result<(), SummaryError> {
        fs::create_dir_all(&self.dir).map_err(self.io_err(self.dir.clone()))?;

        let path = self.summary_path();
        let mut file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&path)
            .map_err(self.io_err(path.clone()))?;

        let newly_created = file
            .metadata()
            .map(|m| m.len() == 0)
            .unwrap_or(false);
        if newly_created {
            writeln!(file, "# gauntlet summary, created {}", Utc::now().to_rfc3339())
                .map_err(self.io_err(path.clone()))?;
            writeln!(file, "category\tidentifier\tname\tdescription\tstatus\treasons")
                .map_err(self.io_err(path.clone()))?;
        }

        for record in &results.records {
            writeln!(
                file,
                "{}\t{}\t{}\t{}\t{}\t{}",
                escape(&record.test.category),
                escape(record.test.identifier.as_deref().unwrap_or("")),
                escape(&record.test.name),
                escape(&record.test.description),
                record.overall_status(),
                escape(&record.failure_reasons().join("; ")),
            )
            .map_err(self.io_err(path.clone()))?;
        }

        let status_path = self.status_path();
        fs::write(&status_path, format!("{}\n", results.overall))
            .map_err(self.io_err(status_path))?;
        Ok(())
    }
}

/// Keeps embedded tabs/newlines from corrupting the row structure.
fn escape(field: &str) -> String {
    field.replace(['\t', '\n', '\r'], " ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::case::TestIdentity;
    use crate::check::CheckResult;
    use crate::lifecycle::TestExecutionRecord;
    use crate::phase::PhaseContext;
    use crate::status::Status;
    use std::time::Duration;

    fn record(name: &str, pass: bool) -> TestExecutionRecord {
        let mut setup = PhaseContext::new();
        setup.record(CheckResult::passed("setup completed"));
        let mut body = PhaseContext::new();
        body.record(if pass {
            CheckResult::passed("checked")
        } else {
            CheckResult::outcome(Status::Fail, "mismatch")
        });
        let mut cleanup = PhaseContext::new();
        cleanup.record(CheckResult::passed("cleanup completed"));
        TestExecutionRecord {
            test: TestIdentity {
                name: name.to_string(),
                description: "a test".to_string(),
                category: "smoke".to_string(),
                identifier: Some("ID-1".to_string()),
            },
            setup,
            body: Some(body),
            cleanup,
            setup_ran: true,
            body_ran: true,
            cleaned_up: true,
            duration: Duration::from_millis(3),
        }
    }

    fn results(records: Vec<TestExecutionRecord>) -> SuiteResults {
        let overall = Status::aggregate(records.iter().map(TestExecutionRecord::overall_status));
        SuiteResults {
            records,
            overall,
            filtered_out: 0,
            duration: Duration::from_millis(10),
        }
    }

    #[test]
    fn test_writes_header_rows_and_status() {
        let dir = tempfile::tempdir().unwrap();
        let store = TsvSummaryStore::new(dir.path().to_path_buf());

        store.persist(&results(vec![record("a", true), record("b", false)])).unwrap();

        let summary = fs::read_to_string(store.summary_path()).unwrap();
        assert!(summary.contains("category\tidentifier\tname"));
        assert!(summary.contains("smoke\tID-1\ta\ta test\tPASS\t"));
        assert!(summary.contains("\tFAIL\tbody: mismatch"));

        let status = fs::read_to_string(store.status_path()).unwrap();
        assert_eq!(status.trim(), "FAIL");
    }

    #[test]
    fn test_append_preserves_existing_rows() {
        let dir = tempfile::tempdir().unwrap();
        let store = TsvSummaryStore::new(dir.path().to_path_buf());

        store.persist(&results(vec![record("first", true)])).unwrap();
        store.persist(&results(vec![record("second", true)])).unwrap();

        let summary = fs::read_to_string(store.summary_path()).unwrap();
        assert!(summary.contains("\tfirst\t"));
        assert!(summary.contains("\tsecond\t"));
        // Header written only once.
        assert_eq!(summary.matches("category\tidentifier").count(), 1);
    }

    #[test]
    fn test_status_file_reflects_latest_run() {
        let dir = tempfile::tempdir().unwrap();
        let store = TsvSummaryStore::new(dir.path().to_path_buf());

        store.persist(&results(vec![record("a", false)])).unwrap();
        store.persist(&results(vec![record("a", true)])).unwrap();

        let status = fs::read_to_string(store.status_path()).unwrap();
        assert_eq!(status.trim(), "PASS");
    }
}
