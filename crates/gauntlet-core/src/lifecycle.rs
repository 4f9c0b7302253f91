//! The per-test lifecycle state machine.
//!
//! Each eligible test is driven through setup → body → cleanup. Failures are
//! isolated per phase: an unanticipated failure in setup makes the test
//! inconclusive, in body it is a real failure, in cleanup it is flagged for
//! human judgment. Cleanup always runs, and nothing a test does can escape
//! the driver and take down the suite.
//!
//! The body runs on a dedicated tokio task that the driver joins on. The
//! current contract is a blocking join with no timeout; the task boundary
//! exists so a timeout or interruption policy can be added without
//! restructuring the driver.

use crate::case::{TestCase, TestIdentity};
use crate::check::{CheckFailure, CheckResult, Checks};
use crate::phase::{Phase, PhaseContext};
use crate::report::Reporter;
use crate::status::Status;
use crate::suite::KillSwitch;
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Mutable execution state shared between the lifecycle driver and the
/// check recorder.
///
/// The phase a check is attributed to is a pure function of three booleans,
/// so a check call is always attributable to exactly one context even when
/// invoked from an unexpected code path: before setup completes it belongs
/// to setup; once setup has failed, any late check belongs to cleanup (the
/// run is doomed either way); otherwise checks belong to the body until it
/// finishes, then to cleanup.
#[derive(Debug, Default)]
pub struct ExecutionState {
    setup: PhaseContext,
    body: Option<PhaseContext>,
    cleanup: PhaseContext,
    setup_finished: bool,
    setup_passed: bool,
    body_finished: bool,
}

impl ExecutionState {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// The phase a check recorded right now is attributed to.
    pub fn current_phase(&self) -> Phase {
        if !self.setup_finished {
            Phase::Setup
        } else if !self.setup_passed {
            Phase::Cleanup
        } else if !self.body_finished {
            Phase::Body
        } else {
            Phase::Cleanup
        }
    }

    /// Appends a result to the current phase context; returns the phase it
    /// was attributed to.
    pub(crate) fn record(&mut self, result: CheckResult) -> Phase {
        let phase = self.current_phase();
        match phase {
            Phase::Setup => self.setup.record(result),
            Phase::Body => self
                .body
                .get_or_insert_with(PhaseContext::new)
                .record(result),
            Phase::Cleanup => self.cleanup.record(result),
        }
        phase
    }

    /// Freezes the setup verdict; returns whether the body may run.
    fn finish_setup(&mut self) -> bool {
        self.setup_passed = self.setup.aggregate_status().is_passing();
        self.setup_finished = true;
        self.setup_passed
    }

    fn start_body(&mut self) {
        self.body.get_or_insert_with(PhaseContext::new);
    }

    fn finish_body(&mut self) {
        self.body_finished = true;
    }

    pub(crate) fn setup_context(&self) -> &PhaseContext {
        &self.setup
    }
}

/// Everything recorded during one run of one test, frozen once cleanup has
/// returned. This is what gets reported and persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestExecutionRecord {
    /// Identity of the test that ran.
    pub test: TestIdentity,
    /// Outcomes recorded during setup.
    pub setup: PhaseContext,
    /// Outcomes recorded during the body; `None` when the body was skipped.
    pub body: Option<PhaseContext>,
    /// Outcomes recorded during cleanup.
    pub cleanup: PhaseContext,
    /// Whether the setup phase was entered.
    pub setup_ran: bool,
    /// Whether the body phase was entered.
    pub body_ran: bool,
    /// Whether cleanup returned without error or panic.
    pub cleaned_up: bool,
    /// Wall-clock duration of the whole execution.
    #[serde(with = "duration_serde")]
    pub duration: Duration,
}

impl TestExecutionRecord {
    /// Derives the overall test status from the frozen phase contexts.
    ///
    /// Pure function of the recorded statuses: a subjective setup dominates,
    /// any other non-passing setup (or a skipped body) makes the test
    /// inconclusive, and otherwise the body aggregate is the verdict.
    /// Cleanup outcomes are reported but never participate.
    pub fn overall_status(&self) -> Status {
        let setup = self.setup.aggregate_status();
        if setup == Status::Subjective {
            return Status::Subjective;
        }
        if !setup.is_passing() {
            return Status::Inconclusive;
        }
        self.body
            .as_ref()
            .map_or(Status::Inconclusive, PhaseContext::aggregate_status)
    }

    /// The three phase contexts in lifecycle order, with their phases.
    pub fn phases(&self) -> impl Iterator<Item = (Phase, &PhaseContext)> {
        [
            Some((Phase::Setup, &self.setup)),
            self.body.as_ref().map(|ctx| (Phase::Body, ctx)),
            Some((Phase::Cleanup, &self.cleanup)),
        ]
        .into_iter()
        .flatten()
    }

    /// Descriptions of every non-passing outcome, prefixed with its phase.
    pub fn failure_reasons(&self) -> Vec<String> {
        self.phases()
            .flat_map(|(phase, ctx)| {
                ctx.results()
                    .iter()
                    .filter(|r| !r.status.is_passing())
                    .map(move |r| format!("{phase}: {}", r.description))
            })
            .collect()
    }
}

/// Drives one test case through its lifecycle.
pub struct TestLifecycle {
    test: Arc<dyn TestCase>,
    reporter: Arc<dyn Reporter>,
}

impl TestLifecycle {
    /// Creates a driver for one test case.
    pub fn new(test: Arc<dyn TestCase>, reporter: Arc<dyn Reporter>) -> Self {
        Self { test, reporter }
    }

    /// Runs the test to completion and returns the frozen execution record.
    ///
    /// The kill switch is sampled exactly once, here; an engaged switch skips
    /// all three phases and leaves a single synthetic inconclusive outcome so
    /// the aborted run still surfaces in reports. This method never fails:
    /// every error a test can produce ends up inside the record.
    pub async fn run(self, kill: &KillSwitch) -> TestExecutionRecord {
        let started = Instant::now();
        let identity = TestIdentity::of(self.test.as_ref());
        let state = Arc::new(Mutex::new(ExecutionState::new()));
        let checks = Checks::new(&identity.name, state.clone(), self.reporter.clone());

        let mut setup_ran = false;
        let mut body_ran = false;
        let mut cleaned_up = false;

        if kill.is_engaged() {
            info!(test = %identity.name, "kill switch engaged, skipping execution");
            checks.record(CheckResult::outcome(
                Status::Inconclusive,
                "run aborted before the test started",
            ));
        } else {
            // SETUP — runs on the driver; a failure makes the test
            // inconclusive, never failed.
            debug!(test = %identity.name, "entering setup");
            match run_phase(self.test.setup(&checks)).await {
                Ok(()) => checks.record(CheckResult::passed("setup completed")),
                Err(failure) => checks.record(CheckResult::with_failure(
                    Phase::Setup.failure_status(),
                    "unanticipated failure during setup",
                    failure,
                )),
            }
            setup_ran = true;
            let setup_passed = lock(&state).finish_setup();

            if setup_passed {
                // BODY — on a dedicated task, joined without timeout.
                lock(&state).start_body();
                debug!(test = %identity.name, "entering body");
                body_ran = true;
                let handle = tokio::spawn({
                    let test = Arc::clone(&self.test);
                    let checks = checks.clone();
                    async move { test.body(&checks).await }
                });
                match handle.await {
                    Ok(Ok(())) => {}
                    Ok(Err(error)) => checks.record(CheckResult::with_failure(
                        Phase::Body.failure_status(),
                        "unanticipated failure during body",
                        CheckFailure::from_error(&error),
                    )),
                    Err(join_error) => {
                        let failure = if join_error.is_panic() {
                            CheckFailure::new(panic_message(join_error.into_panic()))
                        } else {
                            CheckFailure::new("body task was cancelled")
                        };
                        checks.record(CheckResult::with_failure(
                            Phase::Body.failure_status(),
                            "body terminated abnormally",
                            failure,
                        ));
                    }
                }
            } else {
                // SKIPPED_BODY — the synthetic outcome lands in cleanup via
                // the current-phase resolution; no body context is created.
                info!(test = %identity.name, "setup did not pass, declining body");
                checks.record(CheckResult::outcome(
                    Status::Inconclusive,
                    "test declined: setup did not pass",
                ));
            }
            lock(&state).finish_body();

            // CLEANUP — unconditional; a failure here needs human judgment
            // but never flips the verdict.
            debug!(test = %identity.name, "entering cleanup");
            match run_phase(self.test.cleanup(&checks)).await {
                Ok(()) => {
                    cleaned_up = true;
                    checks.record(CheckResult::passed("cleanup completed"));
                }
                Err(failure) => checks.record(CheckResult::with_failure(
                    Phase::Cleanup.failure_status(),
                    "unanticipated failure during cleanup",
                    failure,
                )),
            }
        }

        let (setup, body, cleanup) = {
            let state = lock(&state);
            (state.setup.clone(), state.body.clone(), state.cleanup.clone())
        };
        let record = TestExecutionRecord {
            test: identity,
            setup,
            body,
            cleanup,
            setup_ran,
            body_ran,
            cleaned_up,
            duration: started.elapsed(),
        };
        debug!(
            test = %record.test.name,
            status = %record.overall_status(),
            "execution complete"
        );
        self.reporter.test_completed(&record);
        record
    }
}

fn lock(state: &Mutex<ExecutionState>) -> std::sync::MutexGuard<'_, ExecutionState> {
    state.lock().unwrap_or_else(|e| e.into_inner())
}

/// Awaits a phase operation, converting an `Err` or a panic into a captured
/// failure instead of letting it escape the driver.
async fn run_phase<F>(operation: F) -> Result<(), CheckFailure>
where
    F: Future<Output = anyhow::Result<()>>,
{
    match AssertUnwindSafe(operation).catch_unwind().await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(error)) => Err(CheckFailure::from_error(&error)),
        Err(payload) => Err(CheckFailure::new(panic_message(payload))),
    }
}

/// Renders a panic payload as a message, best effort.
fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panicked: {s}")
    } else {
        "panicked with a non-string payload".to_string()
    }
}

pub(crate) mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_secs_f64().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = f64::deserialize(deserializer)?;
        Ok(Duration::from_secs_f64(secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_current_phase_resolution_table() {
        let mut state = ExecutionState::new();
        // Setup not yet complete.
        assert_eq!(state.current_phase(), Phase::Setup);

        // Setup completed and passed, body still running.
        state.setup.record(CheckResult::passed("setup completed"));
        assert!(state.finish_setup());
        assert_eq!(state.current_phase(), Phase::Body);

        // Body done.
        state.finish_body();
        assert_eq!(state.current_phase(), Phase::Cleanup);
    }

    #[test]
    fn test_late_checks_on_doomed_run_go_to_cleanup() {
        let mut state = ExecutionState::new();
        state
            .setup
            .record(CheckResult::outcome(Status::Inconclusive, "broken precondition"));
        assert!(!state.finish_setup());
        assert_eq!(state.current_phase(), Phase::Cleanup);

        let phase = state.record(CheckResult::outcome(Status::Inconclusive, "declined"));
        assert_eq!(phase, Phase::Cleanup);
        assert!(state.body.is_none());
    }

    #[test]
    fn test_record_creates_body_context_on_demand() {
        let mut state = ExecutionState::new();
        state.setup.record(CheckResult::passed("setup completed"));
        state.finish_setup();

        assert!(state.body.is_none());
        let phase = state.record(CheckResult::passed("first body check"));
        assert_eq!(phase, Phase::Body);
        assert_eq!(state.body.as_ref().unwrap().results().len(), 1);
    }

    #[test]
    fn test_overall_status_is_idempotent() {
        let record = TestExecutionRecord {
            test: TestIdentity {
                name: "t".into(),
                description: String::new(),
                category: String::new(),
                identifier: None,
            },
            setup: {
                let mut ctx = PhaseContext::new();
                ctx.record(CheckResult::passed("setup completed"));
                ctx
            },
            body: Some({
                let mut ctx = PhaseContext::new();
                ctx.record(CheckResult::outcome(Status::Fail, "assertion failed"));
                ctx.record(CheckResult::outcome(Status::Subjective, "odd timing"));
                ctx
            }),
            cleanup: {
                let mut ctx = PhaseContext::new();
                ctx.record(CheckResult::passed("cleanup completed"));
                ctx
            },
            setup_ran: true,
            body_ran: true,
            cleaned_up: true,
            duration: Duration::from_millis(5),
        };

        let first = record.overall_status();
        assert_eq!(first, Status::Fail);
        for _ in 0..3 {
            assert_eq!(record.overall_status(), first);
        }
    }

    #[test]
    fn test_cleanup_never_changes_overall_status() {
        let mut record = TestExecutionRecord {
            test: TestIdentity {
                name: "t".into(),
                description: String::new(),
                category: String::new(),
                identifier: None,
            },
            setup: {
                let mut ctx = PhaseContext::new();
                ctx.record(CheckResult::passed("setup completed"));
                ctx
            },
            body: Some({
                let mut ctx = PhaseContext::new();
                ctx.record(CheckResult::passed("all good"));
                ctx
            }),
            cleanup: PhaseContext::new(),
            setup_ran: true,
            body_ran: true,
            cleaned_up: false,
            duration: Duration::ZERO,
        };
        record.cleanup.record(CheckResult::outcome(
            Status::Subjective,
            "unanticipated failure during cleanup",
        ));
        assert_eq!(record.overall_status(), Status::Pass);
    }

    #[test]
    fn test_failure_reasons_are_phase_prefixed() {
        let mut setup = PhaseContext::new();
        setup.record(CheckResult::passed("setup completed"));
        let mut body = PhaseContext::new();
        body.record(CheckResult::outcome(Status::Fail, "count mismatch"));
        let record = TestExecutionRecord {
            test: TestIdentity {
                name: "t".into(),
                description: String::new(),
                category: String::new(),
                identifier: None,
            },
            setup,
            body: Some(body),
            cleanup: PhaseContext::new(),
            setup_ran: true,
            body_ran: true,
            cleaned_up: true,
            duration: Duration::ZERO,
        };
        assert_eq!(record.failure_reasons(), ["body: count mismatch"]);
    }

    #[test]
    fn test_panic_message_variants() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload), "panicked: boom");

        let payload: Box<dyn Any + Send> = Box::new(String::from("kaboom"));
        assert_eq!(panic_message(payload), "panicked: kaboom");

        let payload: Box<dyn Any + Send> = Box::new(42u32);
        assert_eq!(panic_message(payload), "panicked with a non-string payload");
    }
}
