//! Fake simulator fixtures
//!
//! Builds a temporary project containing a `regress.toml` and a shell
//! script standing in for the simulator. The script copies everything under
//! `payload/` into the trace directory it is given, then exits with the code
//! stored in `exit_code` (0 when absent).

use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;

const SIM_SCRIPT: &str = r#"#!/bin/sh
set -e
out="$1"
mkdir -p "$out"
if [ -d payload ]; then
    cp -R payload/. "$out"/
fi
if [ -f exit_code ]; then
    echo "simulator exiting with $(cat exit_code)" >&2
    exit "$(cat exit_code)"
fi
"#;

const CONFIG: &str = r#"root = "regression"
archive_prefix = "test-"

[simulator]
program = "sh"
cwd = "."
args = ["sim.sh", "{trace_dir}", "{test}"]

[[test]]
name = "alpha"

[[test]]
name = "beta"
"#;

/// A temporary project with a scriptable simulator
///
/// Everything is removed when the fixture is dropped.
pub struct SimFixture {
    _dir: TempDir,
    /// Project root (holds regress.toml, sim.sh, payload/)
    pub path: PathBuf,
}

impl SimFixture {
    /// Create the project with the default two-test config and an empty payload
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let path = dir.path().to_path_buf();

        fs::write(path.join("sim.sh"), SIM_SCRIPT).unwrap();
        fs::write(path.join("regress.toml"), CONFIG).unwrap();
        fs::create_dir_all(path.join("payload")).unwrap();

        Self { _dir: dir, path }
    }

    pub fn config_path(&self) -> PathBuf {
        self.path.join("regress.toml")
    }

    /// Append raw TOML to the config file
    pub fn append_config(&self, extra: &str) {
        let mut contents = fs::read_to_string(self.config_path()).unwrap();
        contents.push_str(extra);
        fs::write(self.config_path(), contents).unwrap();
    }

    /// Set a file the simulator will emit, relative to the trace directory
    pub fn set_output(&self, rel: &str, contents: &str) {
        let target = self.path.join("payload").join(rel);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(target, contents).unwrap();
    }

    /// Stop the simulator from emitting a file
    pub fn remove_output(&self, rel: &str) {
        fs::remove_file(self.path.join("payload").join(rel)).unwrap();
    }

    /// Make the simulator exit with `code`
    pub fn set_exit_code(&self, code: i32) {
        fs::write(self.path.join("exit_code"), code.to_string()).unwrap();
    }

    pub fn regression_dir(&self) -> PathBuf {
        self.path.join("regression")
    }

    pub fn archive_path(&self, test: &str) -> PathBuf {
        self.regression_dir()
            .join("tests")
            .join(format!("test-{}.bz2", test))
    }

    /// `regress --config <fixture>/regress.toml`, run from the fixture root
    pub fn regress(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::Command::cargo_bin("regress").unwrap();
        cmd.current_dir(&self.path)
            .env_remove("RUST_LOG")
            .arg("--config")
            .arg(self.config_path());
        cmd
    }
}

impl Default for SimFixture {
    fn default() -> Self {
        Self::new()
    }
}
