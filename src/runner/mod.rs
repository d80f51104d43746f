//! Regression runner
//!
//! Orchestrates one test run: clear the working directories, run the
//! simulator, then either promote the fresh trace to the baseline archive
//! (generate) or compare it against the archived baseline (verify).

mod report;

use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::baseline::BaselineArchive;
use crate::compare::{compare_dirs, DirDiff};
use crate::config::{Config, TestCase, ARCHIVE_ROOT};
use crate::error::{RegressError, Result};
use crate::simulator::Simulator;
use crate::util::fs::{recreate_dir, rmdir};

pub use report::{SuiteReport, TestResult};

/// Exit status for a trace that differs from its baseline
pub const EXIT_MISMATCH: i32 = 1;
/// Exit status for a simulator that exited unsuccessfully
pub const EXIT_SIMULATOR_FAILED: i32 = 2;
/// Exit status for a runner error (I/O, archive, configuration)
pub const EXIT_ERROR: i32 = 3;

/// Which workflow a run performs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Promote the fresh trace to the baseline archive
    Generate,
    /// Compare the fresh trace against the baseline archive
    Verify,
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mode::Generate => write!(f, "generate"),
            Mode::Verify => write!(f, "verify"),
        }
    }
}

/// Result of a single test run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RunOutcome {
    /// Baseline archive written
    Generated { archive: PathBuf, files: usize },
    /// Fresh trace identical to the baseline
    Passed { files_compared: usize },
    /// Fresh trace differs from the baseline
    Mismatch { diff: DirDiff },
    /// Simulator exited unsuccessfully; nothing was generated or compared
    SimulatorFailed {
        code: Option<i32>,
        stderr_tail: String,
    },
}

impl RunOutcome {
    pub fn exit_code(&self) -> i32 {
        match self {
            RunOutcome::Generated { .. } | RunOutcome::Passed { .. } => 0,
            RunOutcome::Mismatch { .. } => EXIT_MISMATCH,
            RunOutcome::SimulatorFailed { .. } => EXIT_SIMULATOR_FAILED,
        }
    }

    pub fn is_success(&self) -> bool {
        self.exit_code() == 0
    }

    /// Short status label for summaries
    pub fn label(&self) -> &'static str {
        match self {
            RunOutcome::Generated { .. } => "GENERATED",
            RunOutcome::Passed { .. } => "PASS",
            RunOutcome::Mismatch { .. } => "FAIL",
            RunOutcome::SimulatorFailed { .. } => "SIMULATOR FAILED",
        }
    }
}

/// Runs regression tests against a resolved simulator
#[derive(Debug, Clone)]
pub struct RegressionRunner {
    config: Config,
    simulator: Simulator,
}

impl RegressionRunner {
    /// Build a runner, resolving the simulator program up front.
    pub fn new(config: Config) -> Result<Self> {
        config.validate_layout()?;
        let simulator = Simulator::resolve(&config.simulator)?;
        Ok(Self { config, simulator })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run one test in the given mode.
    pub fn run(&self, test: &TestCase, mode: Mode) -> Result<RunOutcome> {
        let archive = self.config.archive_path(&test.name);
        if mode == Mode::Verify && !archive.is_file() {
            return Err(RegressError::BaselineMissing {
                test: test.name.clone(),
                path: archive,
            });
        }

        tracing::info!(test = %test.name, %mode, "Starting regression run");

        if let Some(failed) = self.simulate(test)? {
            return Ok(failed);
        }

        let outcome = match mode {
            Mode::Generate => self.generate(test)?,
            Mode::Verify => self.verify(test)?,
        };

        tracing::info!(test = %test.name, outcome = outcome.label(), "Finished regression run");
        Ok(outcome)
    }

    /// Run every test in order, collecting outcomes and errors.
    pub fn run_suite(&self, tests: &[TestCase], mode: Mode) -> SuiteReport {
        let mut report = SuiteReport::new(mode);
        for test in tests {
            let started = std::time::Instant::now();
            let result = self.run(test, mode);
            if let Err(e) = &result {
                tracing::error!(test = %test.name, error = %e, "Regression run failed");
            }
            report.record(&test.name, result, started.elapsed());
        }
        report
    }

    /// Clear the trace directory and run the simulator.
    ///
    /// Returns `Some(SimulatorFailed)` when the run must stop here.
    fn simulate(&self, test: &TestCase) -> Result<Option<RunOutcome>> {
        let trace_dir = self.config.trace_dir();
        recreate_dir(&trace_dir)?;

        let template = test.args.as_ref().unwrap_or(&self.config.simulator.args);
        let args =
            self.config
                .simulator
                .expand_args(template, &test.name, &trace_dir, &self.config.root);
        let run = self.simulator.run(&args)?;

        if run.success {
            return Ok(None);
        }

        if self.config.simulator.ignore_exit_status {
            tracing::warn!(
                test = %test.name,
                code = ?run.code,
                "Simulator failed, continuing because ignore_exit_status is set"
            );
            return Ok(None);
        }

        tracing::warn!(test = %test.name, code = ?run.code, "Simulator failed");
        Ok(Some(RunOutcome::SimulatorFailed {
            code: run.code,
            stderr_tail: run.stderr_tail(20),
        }))
    }

    fn generate(&self, test: &TestCase) -> Result<RunOutcome> {
        let trace_dir = self.config.trace_dir();
        let known_dir = self.config.known_dir();
        let archive = self.config.archive_path(&test.name);

        rmdir(&known_dir)?;
        if let Some(parent) = known_dir.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::rename(&trace_dir, &known_dir)?;
        let packed = BaselineArchive::create(&known_dir, ARCHIVE_ROOT, &archive);
        rmdir(&known_dir)?;
        let files = packed?;

        Ok(RunOutcome::Generated { archive, files })
    }

    fn verify(&self, test: &TestCase) -> Result<RunOutcome> {
        let trace_dir = self.config.trace_dir();
        let known_dir = self.config.known_dir();
        let archive = self.config.archive_path(&test.name);

        rmdir(&known_dir)?;
        let compared = BaselineArchive::extract(&archive, ARCHIVE_ROOT, &known_dir)
            .and_then(|_| compare_dirs(&known_dir, &trace_dir));
        rmdir(&known_dir)?;
        let diff = compared?;

        if diff.is_empty() {
            Ok(RunOutcome::Passed {
                files_compared: diff.files_compared,
            })
        } else {
            tracing::warn!(test = %test.name, differences = diff.len(), "Trace differs from baseline");
            Ok(RunOutcome::Mismatch { diff })
        }
    }
}
