//! Suite orchestration: filtering, sequential execution, aggregation.

use crate::artifacts::ArtifactPaths;
use crate::case::{TestCase, TestIdentity};
use crate::filter::FilterSet;
use crate::lifecycle::{TestExecutionRecord, TestLifecycle, duration_serde};
use crate::report::{NullReporter, Reporter};
use crate::status::Status;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Cancellation token sampled once at the top of each test's execution.
///
/// Engaging the switch does not interrupt an in-flight body; every test that
/// has not started yet is skipped instead. Written by an external controller,
/// read-only from the runner's perspective.
#[derive(Debug, Clone, Default)]
pub struct KillSwitch {
    engaged: Arc<AtomicBool>,
}

impl KillSwitch {
    /// Creates a disengaged switch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Disables execution for every test that has not started yet.
    pub fn engage(&self) {
        self.engaged.store(true, Ordering::SeqCst);
    }

    /// Whether the switch has been engaged.
    pub fn is_engaged(&self) -> bool {
        self.engaged.load(Ordering::SeqCst)
    }
}

/// Aggregated outcome of one suite run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteResults {
    /// One record per executed test, in execution order.
    pub records: Vec<TestExecutionRecord>,
    /// Severity fold of every executed test's overall status.
    pub overall: Status,
    /// Number of discovered tests the filter declared ineligible.
    pub filtered_out: usize,
    /// Wall-clock duration of the run.
    #[serde(with = "duration_serde")]
    pub duration: Duration,
}

impl SuiteResults {
    /// Results of a run that executed nothing.
    pub fn empty() -> Self {
        Self {
            records: Vec::new(),
            overall: Status::Inconclusive,
            filtered_out: 0,
            duration: Duration::ZERO,
        }
    }

    /// Number of executed tests whose overall status is `status`.
    pub fn count_of(&self, status: Status) -> usize {
        self.records
            .iter()
            .filter(|r| r.overall_status() == status)
            .count()
    }

    /// Number of executed tests.
    pub fn total(&self) -> usize {
        self.records.len()
    }

    /// Whether every executed test passed and at least one test ran.
    pub fn all_passed(&self) -> bool {
        self.overall.is_passing()
    }
}

/// Runs discovered tests sequentially, in discovery order.
///
/// Ineligible tests are skipped without creating any execution state. Every
/// eligible test is driven through the full lifecycle; no failure in one
/// test stops the next from running.
pub struct SuiteRunner {
    tests: Vec<Arc<dyn TestCase>>,
    filter: FilterSet,
    reporter: Arc<dyn Reporter>,
    artifacts: Option<Arc<dyn ArtifactPaths>>,
    kill: KillSwitch,
}

impl SuiteRunner {
    /// Creates a runner over the discovered tests with a permissive filter
    /// and no reporting.
    pub fn new(tests: Vec<Arc<dyn TestCase>>) -> Self {
        Self {
            tests,
            filter: FilterSet::none(),
            reporter: Arc::new(NullReporter),
            artifacts: None,
            kill: KillSwitch::new(),
        }
    }

    /// Sets the selection filter.
    pub fn with_filter(mut self, filter: FilterSet) -> Self {
        self.filter = filter;
        self
    }

    /// Sets the reporting collaborator.
    pub fn with_reporter(mut self, reporter: Arc<dyn Reporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Sets the artifact-directory collaborator.
    pub fn with_artifacts(mut self, artifacts: Arc<dyn ArtifactPaths>) -> Self {
        self.artifacts = Some(artifacts);
        self
    }

    /// Uses an externally controlled kill switch.
    pub fn with_kill_switch(mut self, kill: KillSwitch) -> Self {
        self.kill = kill;
        self
    }

    /// A handle to this runner's kill switch, for an external controller.
    pub fn kill_switch(&self) -> KillSwitch {
        self.kill.clone()
    }

    /// Number of discovered tests, before filtering.
    pub fn test_count(&self) -> usize {
        self.tests.len()
    }

    /// Identities of the tests the filter would run, in discovery order.
    pub fn eligible_tests(&self) -> Vec<TestIdentity> {
        self.tests
            .iter()
            .map(|t| TestIdentity::of(t.as_ref()))
            .filter(|identity| self.filter.is_eligible(identity))
            .collect()
    }

    /// Runs the suite to completion and returns the aggregated results.
    pub async fn run(&self) -> SuiteResults {
        let started = Instant::now();
        let mut records = Vec::new();
        let mut filtered_out = 0usize;

        let eligible = self.eligible_tests().len();
        info!(
            discovered = self.tests.len(),
            eligible, "starting suite run"
        );
        self.reporter.suite_started(eligible);

        for test in &self.tests {
            let identity = TestIdentity::of(test.as_ref());
            if !self.filter.is_eligible(&identity) {
                debug!(test = %identity.name, "filtered out");
                filtered_out += 1;
                continue;
            }

            if let Some(artifacts) = &self.artifacts {
                // A missing scratch directory is not a verdict on the test.
                if let Err(e) = artifacts.test_dir(&identity) {
                    warn!(test = %identity.name, "artifact directory unavailable: {e}");
                }
            }

            let record = TestLifecycle::new(Arc::clone(test), self.reporter.clone())
                .run(&self.kill)
                .await;
            records.push(record);
        }

        let overall = Status::aggregate(records.iter().map(TestExecutionRecord::overall_status));
        let results = SuiteResults {
            records,
            overall,
            filtered_out,
            duration: started.elapsed(),
        };
        info!(
            executed = results.total(),
            filtered_out,
            verdict = %results.overall,
            "suite run complete"
        );
        self.reporter.suite_finished(&results);
        results
    }
}
