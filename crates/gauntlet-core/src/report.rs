//! Reporting collaborators.
//!
//! The engine reports three kinds of events, synchronously and in order:
//! every recorded check, every completed test execution, and suite
//! start/finish. The `Reporter` trait is the boundary; the engine makes no
//! assumption about rendering beyond that contract.

use crate::check::CheckResult;
use crate::lifecycle::TestExecutionRecord;
use crate::phase::Phase;
use crate::status::Status;
use crate::suite::SuiteResults;
use colored::Colorize;
use std::fs;
use std::path::PathBuf;
use tracing::warn;

/// Receives execution events from the engine.
///
/// All methods default to no-ops so implementations subscribe only to what
/// they render.
pub trait Reporter: Send + Sync {
    /// A check outcome was recorded against a phase of the named test.
    fn check_recorded(&self, test_name: &str, phase: Phase, result: &CheckResult) {
        let _ = (test_name, phase, result);
    }

    /// A test execution completed and its record is frozen.
    fn test_completed(&self, record: &TestExecutionRecord) {
        let _ = record;
    }

    /// The suite is about to run the given number of eligible tests.
    fn suite_started(&self, eligible: usize) {
        let _ = eligible;
    }

    /// The suite finished; results carry every record and the suite verdict.
    fn suite_finished(&self, results: &SuiteResults) {
        let _ = results;
    }
}

/// Discards every event. Useful in tests and embedded use.
pub struct NullReporter;

impl Reporter for NullReporter {}

/// Verbosity level for terminal output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// Show only the suite verdict line.
    Quiet,
    /// One line per test plus the summary.
    #[default]
    Normal,
    /// Every recorded check as it happens.
    Verbose,
}

/// Colored terminal reporter.
#[derive(Debug, Default)]
pub struct TerminalReporter {
    verbosity: Verbosity,
}

impl TerminalReporter {
    /// Creates a reporter with normal verbosity.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a reporter with the given verbosity.
    pub fn with_verbosity(verbosity: Verbosity) -> Self {
        Self { verbosity }
    }

    fn status_glyph(status: Status) -> &'static str {
        match status {
            Status::Pass => "✅",
            Status::Fail => "❌",
            Status::Inconclusive => "❓",
            Status::Subjective => "👀",
        }
    }

    fn colorize(status: Status) -> colored::ColoredString {
        let text = status.to_string();
        match status {
            Status::Pass => text.green(),
            Status::Fail => text.red(),
            Status::Inconclusive => text.yellow(),
            Status::Subjective => text.magenta(),
        }
    }

    /// Prints failure details for every non-passing test.
    pub fn print_failures(&self, results: &SuiteResults) {
        for record in results
            .records
            .iter()
            .filter(|r| !r.overall_status().is_passing())
        {
            println!(
                "\n{} {}",
                Self::colorize(record.overall_status()).bold(),
                record.test.name.bold()
            );
            for reason in record.failure_reasons() {
                println!("    {}", reason);
            }
        }
    }

    /// Prints the suite summary block.
    pub fn print_summary(&self, results: &SuiteResults) {
        println!("\n{}", "━".repeat(40).dimmed());
        println!(
            "  {} passed, {} failed, {} inconclusive, {} subjective, {} filtered out",
            results.count_of(Status::Pass),
            results.count_of(Status::Fail),
            results.count_of(Status::Inconclusive),
            results.count_of(Status::Subjective),
            results.filtered_out,
        );
        println!(
            "  suite verdict: {} {}",
            Self::colorize(results.overall).bold(),
            format!("({:.1}s)", results.duration.as_secs_f64()).dimmed()
        );
    }
}

impl Reporter for TerminalReporter {
    fn suite_started(&self, eligible: usize) {
        if self.verbosity != Verbosity::Quiet {
            println!(
                "\n{}",
                format!(
                    "Running {} test{}...",
                    eligible,
                    if eligible == 1 { "" } else { "s" }
                )
                .bold()
            );
        }
    }

    fn check_recorded(&self, test_name: &str, phase: Phase, result: &CheckResult) {
        if self.verbosity == Verbosity::Verbose {
            println!(
                "    {} [{}/{}] {}",
                Self::status_glyph(result.status),
                test_name.dimmed(),
                phase,
                result.description
            );
            for failure in &result.failures {
                println!("        {}", failure.message.dimmed());
            }
        }
    }

    fn test_completed(&self, record: &TestExecutionRecord) {
        if self.verbosity != Verbosity::Quiet {
            let status = record.overall_status();
            println!(
                "  {} {} {}",
                Self::status_glyph(status),
                record.test.name,
                format!("({:.1}s)", record.duration.as_secs_f64()).dimmed()
            );
        }
    }

    fn suite_finished(&self, results: &SuiteResults) {
        if self.verbosity == Verbosity::Quiet {
            println!("{}", Self::colorize(results.overall));
            return;
        }
        if !results.overall.is_passing() {
            self.print_failures(results);
        }
        self.print_summary(results);
    }
}

/// Writes the full suite results as JSON when the suite finishes.
#[derive(Debug)]
pub struct JsonReporter {
    path: PathBuf,
}

impl JsonReporter {
    /// Creates a reporter writing to the given file path.
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl Reporter for JsonReporter {
    fn suite_finished(&self, results: &SuiteResults) {
        let rendered = match serde_json::to_string_pretty(results) {
            Ok(json) => json,
            Err(e) => {
                warn!("failed to serialize suite results: {e}");
                return;
            }
        };
        if let Err(e) = fs::write(&self.path, rendered) {
            warn!("failed to write JSON report to {}: {e}", self.path.display());
        }
    }
}

/// Fans one event stream out to several reporters, preserving order.
pub struct MultiReporter {
    reporters: Vec<std::sync::Arc<dyn Reporter>>,
}

impl MultiReporter {
    /// Creates a fan-out over the given reporters.
    pub fn new(reporters: Vec<std::sync::Arc<dyn Reporter>>) -> Self {
        Self { reporters }
    }
}

impl Reporter for MultiReporter {
    fn check_recorded(&self, test_name: &str, phase: Phase, result: &CheckResult) {
        for r in &self.reporters {
            r.check_recorded(test_name, phase, result);
        }
    }

    fn test_completed(&self, record: &TestExecutionRecord) {
        for r in &self.reporters {
            r.test_completed(record);
        }
    }

    fn suite_started(&self, eligible: usize) {
        for r in &self.reporters {
            r.suite_started(eligible);
        }
    }

    fn suite_finished(&self, results: &SuiteResults) {
        for r in &self.reporters {
            r.suite_finished(results);
        }
    }
}
