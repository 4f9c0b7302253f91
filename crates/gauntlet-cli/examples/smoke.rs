//! Minimal example suite: build the test list, hand it to the CLI front end.
//!
//! ```bash
//! cargo run --example smoke -- --list
//! cargo run --example smoke -- --select "INCLUDE CATEGORY=arithmetic"
//! ```

use async_trait::async_trait;
use gauntlet_core::{Checks, TestCase};
use std::process::ExitCode;
use std::sync::Arc;

struct Addition;

#[async_trait]
impl TestCase for Addition {
    fn name(&self) -> &str {
        "addition-holds"
    }

    fn description(&self) -> &str {
        "Basic integer addition behaves"
    }

    fn category(&self) -> &str {
        "arithmetic"
    }

    async fn body(&self, checks: &Checks) -> anyhow::Result<()> {
        checks.check(2 + 2 == 4, "2 + 2 equals 4");
        checks.check(i32::MAX.checked_add(1).is_none(), "overflow is detected");
        Ok(())
    }
}

struct TempDirRoundTrip;

#[async_trait]
impl TestCase for TempDirRoundTrip {
    fn name(&self) -> &str {
        "tempfile-round-trip"
    }

    fn description(&self) -> &str {
        "Write then read a scratch file"
    }

    fn category(&self) -> &str {
        "io"
    }

    async fn body(&self, checks: &Checks) -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("probe.txt");
        std::fs::write(&path, "payload")?;

        let read_back = std::fs::read_to_string(&path)?;
        checks.check(read_back == "payload", "file contents survive a round trip");
        checks.consider(
            dir.path().to_string_lossy().len() < 120,
            "scratch path stays comfortably short",
        );
        Ok(())
    }
}

fn main() -> ExitCode {
    use clap::Parser;

    let tests: Vec<Arc<dyn TestCase>> = vec![Arc::new(Addition), Arc::new(TempDirRoundTrip)];
    gauntlet_cli::run(&gauntlet_cli::Cli::parse(), tests)
}
