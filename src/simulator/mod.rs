//! External simulator invocation
//!
//! The simulator is an opaque collaborator: it is spawned with an explicit
//! argument list and working directory, its output is captured, and its exit
//! status is reported back without interpretation.

use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use crate::config::SimulatorConfig;
use crate::error::{RegressError, Result};
use crate::util::tools::{detect_program, ToolStatus};

/// Captured result of one simulator process
#[derive(Debug, Clone)]
pub struct SimulatorRun {
    /// Exit code, `None` when terminated by a signal
    pub code: Option<i32>,
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
    pub duration: Duration,
}

impl SimulatorRun {
    /// Last few lines of stderr, for reports
    pub fn stderr_tail(&self, lines: usize) -> String {
        let all: Vec<&str> = self.stderr.lines().collect();
        let start = all.len().saturating_sub(lines);
        all[start..].join("\n")
    }
}

/// A resolved simulator program plus the directory it runs in
#[derive(Debug, Clone)]
pub struct Simulator {
    program: PathBuf,
    cwd: PathBuf,
}

impl Simulator {
    /// Resolve the configured program to an executable.
    pub fn resolve(config: &SimulatorConfig) -> Result<Self> {
        match detect_program(&config.program, &config.cwd) {
            ToolStatus::Available(program) => {
                tracing::debug!(program = %program.display(), "Resolved simulator");
                Ok(Self {
                    program,
                    cwd: config.cwd.clone(),
                })
            }
            ToolStatus::ConfiguredPathInvalid(path) => Err(RegressError::SimulatorNotFound(
                format!("{} is missing or not executable", path.display()),
            )),
            ToolStatus::NotFound => Err(RegressError::SimulatorNotFound(format!(
                "{} not found in PATH",
                config.program.display()
            ))),
        }
    }

    /// Run the simulator to completion with `args`.
    ///
    /// A non-zero exit is not an error here; callers decide what it means.
    pub fn run(&self, args: &[String]) -> Result<SimulatorRun> {
        tracing::info!(
            program = %self.program.display(),
            cwd = %self.cwd.display(),
            args = ?args,
            "Running simulator"
        );

        let started = Instant::now();
        let output = Command::new(&self.program)
            .args(args)
            .current_dir(&self.cwd)
            .stdin(Stdio::null())
            .output()
            .map_err(|source| RegressError::SimulatorSpawn {
                program: self.program.clone(),
                source,
            })?;
        let duration = started.elapsed();

        let run = SimulatorRun {
            code: output.status.code(),
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            duration,
        };

        if !run.stdout.trim().is_empty() {
            tracing::debug!(stdout = %run.stdout.trim_end(), "Simulator stdout");
        }
        if !run.stderr.trim().is_empty() {
            tracing::debug!(stderr = %run.stderr.trim_end(), "Simulator stderr");
        }
        tracing::debug!(
            code = ?run.code,
            elapsed_ms = duration.as_millis() as u64,
            "Simulator exited"
        );

        Ok(run)
    }
}
