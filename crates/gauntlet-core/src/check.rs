//! Check recording: the assert/require/consider surfaces.
//!
//! Gauntlet targets coarse-grained functional tests, so a failed check never
//! aborts the caller. Every check records an outcome against the current
//! phase and returns, letting every independent check in a test body get
//! evaluated. This is the defining difference from throw-on-first-failure
//! unit-test frameworks.

use crate::lifecycle::ExecutionState;
use crate::phase::Phase;
use crate::report::Reporter;
use crate::status::Status;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tracing::debug;

/// One captured error attached to a check outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckFailure {
    /// Rendered error message, including the cause chain where available.
    pub message: String,
}

impl CheckFailure {
    /// Captures an error, rendering its full cause chain.
    pub fn from_error(error: &anyhow::Error) -> Self {
        Self {
            message: format!("{error:#}"),
        }
    }

    /// Captures a plain message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// One recorded check outcome. Created once, never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckResult {
    /// Outcome of the check.
    pub status: Status,
    /// What was being checked.
    pub description: String,
    /// Captured errors, in capture order. Empty for condition checks.
    pub failures: Vec<CheckFailure>,
}

impl CheckResult {
    /// A passing outcome.
    pub fn passed(description: impl Into<String>) -> Self {
        Self::outcome(Status::Pass, description)
    }

    /// An outcome with the given status and no captured errors.
    pub fn outcome(status: Status, description: impl Into<String>) -> Self {
        Self {
            status,
            description: description.into(),
            failures: Vec::new(),
        }
    }

    /// An outcome carrying a captured failure.
    pub fn with_failure(
        status: Status,
        description: impl Into<String>,
        failure: CheckFailure,
    ) -> Self {
        Self {
            status,
            description: description.into(),
            failures: vec![failure],
        }
    }
}

/// Handle through which setup/body/cleanup code records check outcomes.
///
/// Cloneable and shared with the spawned body task; every recorded outcome is
/// appended to whichever phase context is current and forwarded to the
/// reporter synchronously, in order.
#[derive(Clone)]
pub struct Checks {
    test_name: Arc<str>,
    state: Arc<Mutex<ExecutionState>>,
    reporter: Arc<dyn Reporter>,
}

impl Checks {
    pub(crate) fn new(
        test_name: &str,
        state: Arc<Mutex<ExecutionState>>,
        reporter: Arc<dyn Reporter>,
    ) -> Self {
        Self {
            test_name: Arc::from(test_name),
            state,
            reporter,
        }
    }

    /// Records an assertion: a failing condition is a `Fail`.
    ///
    /// Returns the condition so callers can branch on it without aborting.
    pub fn check(&self, condition: bool, description: impl Into<String>) -> bool {
        self.conditional(condition, Status::Fail, description)
    }

    /// Records a requirement: a failing condition is `Inconclusive`.
    ///
    /// Use for preconditions the verdict depends on; a broken requirement
    /// means the test proves nothing either way.
    pub fn require(&self, condition: bool, description: impl Into<String>) -> bool {
        self.conditional(condition, Status::Inconclusive, description)
    }

    /// Records a consideration: a failing condition is `Subjective`.
    ///
    /// Use for observations that should surface to a human without flipping
    /// the verdict by themselves.
    pub fn consider(&self, condition: bool, description: impl Into<String>) -> bool {
        self.conditional(condition, Status::Subjective, description)
    }

    fn conditional(&self, condition: bool, on_fail: Status, description: impl Into<String>) -> bool {
        let status = if condition { Status::Pass } else { on_fail };
        self.record(CheckResult::outcome(status, description));
        condition
    }

    /// Appends an outcome to the current phase context and reports it.
    pub(crate) fn record(&self, result: CheckResult) {
        let phase = {
            let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
            state.record(result.clone())
        };
        debug!(
            test = %self.test_name,
            %phase,
            status = %result.status,
            "recorded check: {}",
            result.description
        );
        self.reporter.check_recorded(&self.test_name, phase, &result);
    }

    /// Name of the test this handle records against.
    pub fn test_name(&self) -> &str {
        &self.test_name
    }
}
