//! # gauntlet-core
//!
//! Execution engine for coarse-grained functional and integration tests.
//!
//! Each test runs through a fixed three-phase lifecycle (setup, body,
//! cleanup) with failures isolated per phase; individual check outcomes
//! aggregate into one of four statuses instead of aborting on the first
//! failure; a selection filter decides which discovered tests execute; and
//! a suite runner folds per-test verdicts into a single suite status.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌───────────────┐     ┌─────────────┐
//! │ SuiteRunner │────▶│ TestLifecycle │────▶│  TestCase   │
//! └─────────────┘     └───────────────┘     └─────────────┘
//!        │                    │                    │
//!        ▼                    ▼                    ▼
//! ┌─────────────┐     ┌───────────────┐     ┌─────────────┐
//! │  FilterSet  │     │ PhaseContext  │◀────│   Checks    │
//! └─────────────┘     └───────────────┘     └─────────────┘
//! ```
//!
//! ## Modules
//!
//! - `status`: the four-valued status and its severity-ranked fold
//! - `check`: the assert/require/consider recorder
//! - `phase`: lifecycle phases and per-phase outcome accumulation
//! - `case`: the `TestCase` contract supplied by discovery
//! - `lifecycle`: the per-test state machine and execution record
//! - `filter`: include/exclude selection rules
//! - `suite`: sequential suite runner and kill switch
//! - `report`, `artifacts`, `summary`: boundary collaborators

pub use crate::artifacts::{ArtifactError, ArtifactPaths, DirArtifacts};
pub use crate::case::{TestCase, TestIdentity};
pub use crate::check::{CheckFailure, CheckResult, Checks};
pub use crate::filter::{FilterRule, FilterSet, RuleKind, RuleTarget};
pub use crate::lifecycle::{TestExecutionRecord, TestLifecycle};
pub use crate::phase::{Phase, PhaseContext};
pub use crate::report::{
    JsonReporter, MultiReporter, NullReporter, Reporter, TerminalReporter, Verbosity,
};
pub use crate::status::Status;
pub use crate::suite::{KillSwitch, SuiteResults, SuiteRunner};
pub use crate::summary::{SummaryError, SummaryStore, TsvSummaryStore};

pub mod artifacts;
pub mod case;
pub mod check;
pub mod filter;
pub mod lifecycle;
pub mod phase;
pub mod report;
pub mod status;
pub mod suite;
pub mod summary;

/// Library version, matching the crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
