//! Lifecycle phases and per-phase check accumulation.

use crate::check::CheckResult;
use crate::status::Status;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the three lifecycle phases of a test execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Precondition phase; failures here make the test inconclusive.
    Setup,
    /// The main test logic; failures here are real test failures.
    Body,
    /// Postcondition phase; failures here are flagged for human judgment.
    Cleanup,
}

impl Phase {
    /// Status recorded for an unanticipated failure escaping this phase.
    pub fn failure_status(self) -> Status {
        match self {
            Phase::Setup => Status::Inconclusive,
            Phase::Body => Status::Fail,
            Phase::Cleanup => Status::Subjective,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Setup => write!(f, "setup"),
            Phase::Body => write!(f, "body"),
            Phase::Cleanup => write!(f, "cleanup"),
        }
    }
}

/// Accumulated check outcomes for one phase of one test execution.
///
/// Results are kept in insertion order (check order) and are never mutated
/// after being recorded. The aggregate status is derived on demand.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PhaseContext {
    results: Vec<CheckResult>,
}

impl PhaseContext {
    /// Creates an empty phase context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one check outcome. Outcomes are never reassigned later.
    pub fn record(&mut self, result: CheckResult) {
        self.results.push(result);
    }

    /// The recorded outcomes, in check order.
    pub fn results(&self) -> &[CheckResult] {
        &self.results
    }

    /// Whether nothing was recorded in this phase.
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Folds the recorded statuses by severity; empty aggregates to
    /// `Inconclusive`.
    pub fn aggregate_status(&self) -> Status {
        Status::aggregate(self.results.iter().map(|r| r.status))
    }
}
