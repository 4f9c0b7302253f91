//! The test case contract supplied by discovery.
//!
//! Gauntlet never constructs or destroys test identity; a discovery
//! collaborator hands the suite runner an ordered `Vec<Arc<dyn TestCase>>`
//! (an explicit registry, generated code, a plugin scan). The engine only
//! drives the three phase operations.

use crate::check::Checks;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A coarse-grained functional test: identity plus three phase operations.
///
/// `body` is mandatory; `setup` and `cleanup` default to a trivial pass.
/// An `Err` returned from any phase operation is treated as an unanticipated
/// failure and recorded against that phase — it never escapes the engine.
#[async_trait]
pub trait TestCase: Send + Sync {
    /// Test name, unique within a suite.
    fn name(&self) -> &str;

    /// Longer human-readable description of what the test verifies.
    fn description(&self) -> &str {
        ""
    }

    /// Slash- or pipe-delimited category path; empty means top level.
    fn category(&self) -> &str {
        ""
    }

    /// Optional external tracking identifier.
    fn identifier(&self) -> Option<&str> {
        None
    }

    /// Establishes preconditions. A failure here makes the test
    /// inconclusive, never failed.
    async fn setup(&self, checks: &Checks) -> anyhow::Result<()> {
        let _ = checks;
        Ok(())
    }

    /// The main test logic. Runs on a dedicated worker task.
    async fn body(&self, checks: &Checks) -> anyhow::Result<()>;

    /// Releases resources. Always runs, whatever setup and body did.
    async fn cleanup(&self, checks: &Checks) -> anyhow::Result<()> {
        let _ = checks;
        Ok(())
    }
}

/// Snapshot of a test's identity fields, detached from the trait object.
///
/// Used for filtering, artifact paths, and execution records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestIdentity {
    /// Test name.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// Category path (slash/pipe delimited; empty = top level).
    pub category: String,
    /// External tracking identifier, if any.
    pub identifier: Option<String>,
}

impl TestIdentity {
    /// Captures the identity of a test case.
    pub fn of(test: &dyn TestCase) -> Self {
        Self {
            name: test.name().to_string(),
            description: test.description().to_string(),
            category: test.category().to_string(),
            identifier: test.identifier().map(str::to_string),
        }
    }

    /// Segments of the category path, split on `/` and `|`.
    pub fn category_segments(&self) -> impl Iterator<Item = &str> {
        self.category
            .split(['/', '|'])
            .filter(|s| !s.is_empty())
    }
}
