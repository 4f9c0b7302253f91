//! # gauntlet-cli
//!
//! Command-line front end for the Gauntlet test execution engine.
//!
//! Gauntlet never discovers tests on its own; the consumer's binary builds
//! the test list and hands it to [`run`] together with the parsed arguments:
//!
//! ```no_run
//! use clap::Parser;
//! use gauntlet_core::TestCase;
//! use std::process::ExitCode;
//! use std::sync::Arc;
//!
//! fn main() -> ExitCode {
//!     let tests: Vec<Arc<dyn TestCase>> = vec![/* your suite */];
//!     gauntlet_cli::run(&gauntlet_cli::Cli::parse(), tests)
//! }
//! ```

use clap::Parser;
use colored::Colorize;
use gauntlet_core::{
    DirArtifacts, FilterSet, JsonReporter, MultiReporter, Reporter, Status, SuiteRunner,
    SummaryStore, TerminalReporter, TestCase, TestIdentity, TsvSummaryStore, Verbosity,
};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Runs a suite of coarse-grained functional tests.
///
/// The suite verdict maps to the process exit code: `PASS` exits 0,
/// everything else exits 1.
#[derive(Parser, Debug)]
#[command(name = "gauntlet")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Selection rule, repeatable: `INCLUDE|EXCLUDE CATEGORY|IDENTIFIER|NAME=value[;value...]`
    #[arg(long = "select", value_name = "RULE")]
    pub select: Vec<String>,

    /// List eligible tests without running them
    #[arg(long)]
    pub list: bool,

    /// Only show the suite verdict
    #[arg(short, long)]
    pub quiet: bool,

    /// Show every recorded check as it happens
    #[arg(short, long)]
    pub verbose: bool,

    /// Directory for per-test artifact directories
    #[arg(long, value_name = "DIR")]
    pub artifacts_dir: Option<PathBuf>,

    /// Directory for the tabular summary and suite-status files
    #[arg(long, value_name = "DIR")]
    pub summary_dir: Option<PathBuf>,

    /// Write the full suite results as JSON to this file
    #[arg(long, value_name = "FILE")]
    pub json_report: Option<PathBuf>,
}

impl Cli {
    fn verbosity(&self) -> Verbosity {
        if self.quiet {
            Verbosity::Quiet
        } else if self.verbose {
            Verbosity::Verbose
        } else {
            Verbosity::Normal
        }
    }
}

/// Parses the selection rules, runs (or lists) the suite, persists the
/// summary, and maps the suite verdict to an exit code.
pub fn run(cli: &Cli, tests: Vec<Arc<dyn TestCase>>) -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init()
        .ok();

    let verbosity = cli.verbosity();
    if verbosity != Verbosity::Quiet {
        println!(
            "\n{} {}",
            "Gauntlet".bold(),
            format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
        );
        println!("{}", "━".repeat(40).dimmed());
    }

    let filter = FilterSet::parse(&cli.select);
    let mut runner = SuiteRunner::new(tests).with_filter(filter);

    if cli.list {
        list_tests(&runner);
        return ExitCode::SUCCESS;
    }

    let mut reporters: Vec<Arc<dyn Reporter>> =
        vec![Arc::new(TerminalReporter::with_verbosity(verbosity))];
    if let Some(path) = &cli.json_report {
        reporters.push(Arc::new(JsonReporter::new(path.clone())));
    }
    runner = runner.with_reporter(Arc::new(MultiReporter::new(reporters)));

    if let Some(dir) = &cli.artifacts_dir {
        runner = runner.with_artifacts(Arc::new(DirArtifacts::new(dir.clone())));
    }

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("{} failed to start runtime: {e}", "Error:".red().bold());
            return ExitCode::FAILURE;
        }
    };
    let results = rt.block_on(runner.run());

    if let Some(dir) = &cli.summary_dir {
        let store = TsvSummaryStore::new(dir.clone());
        if let Err(e) = store.persist(&results) {
            eprintln!("{} {e}", "Warning:".yellow());
        } else if verbosity != Verbosity::Quiet {
            println!(
                "{}",
                format!("Summary written: {}", store.summary_path().display()).dimmed()
            );
        }
    }

    if results.overall == Status::Pass {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

/// Prints eligible tests grouped by category, without executing anything.
fn list_tests(runner: &SuiteRunner) {
    let eligible = runner.eligible_tests();
    println!("{}\n", "Eligible tests:".bold());

    let mut current_category: Option<String> = None;
    for identity in &eligible {
        let category = display_category(identity);
        if current_category.as_deref() != Some(category.as_str()) {
            println!("  {}", category.bold().underline());
            current_category = Some(category);
        }
        if identity.description.is_empty() {
            println!("    {}", identity.name.cyan());
        } else {
            println!(
                "    {}  {}",
                identity.name.cyan(),
                identity.description.dimmed()
            );
        }
    }

    println!(
        "\n  {}",
        format!(
            "Total: {} of {} discovered",
            eligible.len(),
            runner.test_count()
        )
        .dimmed()
    );
}

fn display_category(identity: &TestIdentity) -> String {
    if identity.category.is_empty() {
        "(top level)".to_string()
    } else {
        identity.category.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["gauntlet"]).unwrap();
        assert!(cli.select.is_empty());
        assert!(!cli.list);
        assert_eq!(cli.verbosity(), Verbosity::Normal);
    }

    #[test]
    fn test_repeatable_select() {
        let cli = Cli::try_parse_from([
            "gauntlet",
            "--select",
            "INCLUDE CATEGORY=Smoke",
            "--select",
            "EXCLUDE NAME=Flaky",
        ])
        .unwrap();
        assert_eq!(cli.select.len(), 2);

        let filter = FilterSet::parse(&cli.select);
        assert_eq!(filter.rules().len(), 2);
    }

    #[test]
    fn test_verbosity_flags() {
        let cli = Cli::try_parse_from(["gauntlet", "--quiet"]).unwrap();
        assert_eq!(cli.verbosity(), Verbosity::Quiet);

        let cli = Cli::try_parse_from(["gauntlet", "--verbose"]).unwrap();
        assert_eq!(cli.verbosity(), Verbosity::Verbose);
    }

    #[test]
    fn test_paths() {
        let cli = Cli::try_parse_from([
            "gauntlet",
            "--summary-dir",
            "out",
            "--json-report",
            "out/results.json",
        ])
        .unwrap();
        assert_eq!(cli.summary_dir.unwrap(), PathBuf::from("out"));
        assert_eq!(cli.json_report.unwrap(), PathBuf::from("out/results.json"));
    }
}
