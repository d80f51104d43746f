//! Suite reporting: aggregates per-test outcomes into human-readable and
//! machine-readable summaries.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{Mode, RunOutcome, EXIT_ERROR};
use crate::compare::DiffKind;
use crate::error::RegressError;

/// How many diff entries to print per failing test.
const MAX_DIFF_LINES: usize = 10;

/// Outcome of one test in a suite.
#[derive(Debug, Clone, Serialize)]
pub struct TestResult {
    pub test: String,
    /// Set when the run completed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<RunOutcome>,
    /// Set when the run aborted with an error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub duration_ms: u64,
}

impl TestResult {
    pub fn exit_code(&self) -> i32 {
        match &self.outcome {
            Some(outcome) => outcome.exit_code(),
            None => EXIT_ERROR,
        }
    }

    fn label(&self) -> &'static str {
        match &self.outcome {
            Some(outcome) => outcome.label(),
            None => "ERROR",
        }
    }
}

/// Summary of a suite run.
#[derive(Debug, Clone, Serialize)]
pub struct SuiteReport {
    pub mode: Mode,
    pub started_at: DateTime<Utc>,
    pub results: Vec<TestResult>,
}

impl SuiteReport {
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            started_at: Utc::now(),
            results: Vec::new(),
        }
    }

    /// Record the result of one test.
    pub fn record(
        &mut self,
        test: &str,
        result: Result<RunOutcome, RegressError>,
        elapsed: Duration,
    ) {
        let (outcome, error) = match result {
            Ok(outcome) => (Some(outcome), None),
            Err(e) => (None, Some(e.to_string())),
        };
        self.results.push(TestResult {
            test: test.to_string(),
            outcome,
            error,
            duration_ms: elapsed.as_millis() as u64,
        });
    }

    /// Worst exit status across all tests (0 when every test succeeded).
    pub fn exit_code(&self) -> i32 {
        self.results
            .iter()
            .map(TestResult::exit_code)
            .max()
            .unwrap_or(0)
    }

    pub fn passed(&self) -> bool {
        self.exit_code() == 0
    }

    pub fn count_passed(&self) -> usize {
        self.results.iter().filter(|r| r.exit_code() == 0).count()
    }

    /// Render the human-readable summary.
    pub fn render(&self, verbose: bool) -> String {
        let mut out = String::new();
        for result in &self.results {
            out.push_str(&format!("{:<18} {}\n", result.label(), result.test));

            if let Some(error) = &result.error {
                out.push_str(&format!("    {}\n", error));
            }

            match &result.outcome {
                Some(RunOutcome::Generated { archive, files }) if verbose => {
                    out.push_str(&format!("    {} files -> {}\n", files, archive.display()));
                }
                Some(RunOutcome::Mismatch { diff }) => {
                    out.push_str(&format!(
                        "    {} differences ({} changed, {} missing, {} added)\n",
                        diff.len(),
                        diff.count(DiffKind::ContentDiffers),
                        diff.count(DiffKind::OnlyInBaseline),
                        diff.count(DiffKind::OnlyInTrace)
                    ));
                    let show = if verbose {
                        diff.len()
                    } else {
                        diff.len().min(MAX_DIFF_LINES)
                    };
                    for entry in &diff.entries[..show] {
                        out.push_str(&format!("    {}\n", entry));
                    }
                    if diff.len() > show {
                        out.push_str(&format!("    ... and {} more\n", diff.len() - show));
                    }
                }
                Some(RunOutcome::SimulatorFailed { code, stderr_tail }) => {
                    let code = code
                        .map(|c| c.to_string())
                        .unwrap_or_else(|| "signal".to_string());
                    out.push_str(&format!("    exit status: {}\n", code));
                    for line in stderr_tail.lines() {
                        out.push_str(&format!("    | {}\n", line));
                    }
                }
                _ => {}
            }
        }

        out.push_str(&format!(
            "\n{}: {}/{} succeeded\n",
            self.mode,
            self.count_passed(),
            self.results.len()
        ));
        out
    }

    /// Print the human-readable summary to stdout.
    pub fn print_summary(&self, verbose: bool) {
        print!("{}", self.render(verbose));
    }

    /// Serialize to JSON string.
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|e| format!("{{\"error\": \"{}\"}}", e))
    }
}
