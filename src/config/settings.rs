use std::fs;
use std::path::{Component, Path, PathBuf};

use serde::Deserialize;

use crate::error::{RegressError, Result};
use crate::util::paths::{absolutize, resolve};

/// Example configuration file contents (bundled with the binary)
pub const EXAMPLE_CONFIG: &str = include_str!("regress.toml.example");

/// Fixed top-level directory name inside every baseline archive
pub const ARCHIVE_ROOT: &str = "knowns";

/// Runner configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding the trace, known and archive directories
    pub root: PathBuf,
    /// Prefix prepended to the test name to form the archive file name
    pub archive_prefix: String,
    /// How to invoke the simulator
    pub simulator: SimulatorConfig,
    /// Directory names under `root`
    pub layout: Layout,
    /// Configured test suite (may be empty)
    pub tests: Vec<TestCase>,
}

#[derive(Debug, Clone)]
pub struct SimulatorConfig {
    /// Program to execute
    pub program: PathBuf,
    /// Working directory the simulator runs in
    pub cwd: PathBuf,
    /// Argument template; see [`SimulatorConfig::expand_args`]
    pub args: Vec<String>,
    /// Proceed with generate/verify even when the simulator fails
    pub ignore_exit_status: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    pub traces: PathBuf,
    pub knowns: PathBuf,
    pub archives: PathBuf,
}

/// A single regression test
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TestCase {
    pub name: String,
    /// Overrides `simulator.args` for this test
    #[serde(default)]
    pub args: Option<Vec<String>>,
}

impl TestCase {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: None,
        }
    }
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            traces: PathBuf::from("traces"),
            knowns: PathBuf::from(ARCHIVE_ROOT),
            archives: PathBuf::from("tests"),
        }
    }
}

impl Layout {
    /// Check that the working directories are plain names under `root` and
    /// that no directory equals or contains another.
    ///
    /// The runner wipes `traces` and `knowns` on every run, so either one
    /// overlapping the archives would destroy baselines.
    pub fn validate(&self, root: &Path) -> std::result::Result<(), String> {
        for (key, dir) in [("layout.traces", &self.traces), ("layout.knowns", &self.knowns)] {
            if !is_plain_relative(dir) {
                return Err(format!(
                    "{} must be a relative path without '.' or '..', got '{}'",
                    key,
                    dir.display()
                ));
            }
        }
        if self.archives.as_os_str().is_empty()
            || self
                .archives
                .components()
                .any(|c| matches!(c, Component::CurDir | Component::ParentDir))
        {
            return Err(format!(
                "layout.archives must not be empty or contain '.' or '..', got '{}'",
                self.archives.display()
            ));
        }

        let dirs = [
            ("layout.traces", resolve(root, &self.traces)),
            ("layout.knowns", resolve(root, &self.knowns)),
            ("layout.archives", resolve(root, &self.archives)),
        ];
        for (i, (key, dir)) in dirs.iter().enumerate() {
            for (other_key, other) in &dirs[i + 1..] {
                if dir.starts_with(other) || other.starts_with(dir) {
                    return Err(format!("{} and {} must not overlap", key, other_key));
                }
            }
        }
        Ok(())
    }
}

fn is_plain_relative(path: &Path) -> bool {
    let mut components = path.components().peekable();
    components.peek().is_some() && components.all(|c| matches!(c, Component::Normal(_)))
}

impl Default for Config {
    fn default() -> Self {
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self::with_base_dir(&cwd)
    }
}

/// TOML representation of the `[simulator]` table
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TomlSimulatorConfig {
    pub program: Option<PathBuf>,
    pub cwd: Option<PathBuf>,
    pub args: Option<Vec<String>>,
    pub ignore_exit_status: Option<bool>,
}

/// TOML representation of the `[layout]` table
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TomlLayout {
    pub traces: Option<PathBuf>,
    pub knowns: Option<PathBuf>,
    pub archives: Option<PathBuf>,
}

/// TOML representation of the config file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TomlConfig {
    pub root: Option<PathBuf>,
    pub archive_prefix: Option<String>,
    pub simulator: Option<TomlSimulatorConfig>,
    pub layout: Option<TomlLayout>,
    #[serde(default, rename = "test")]
    pub tests: Vec<TestCase>,
}

impl Config {
    /// Defaults with relative paths anchored at `base`
    pub fn with_base_dir(base: &Path) -> Self {
        Self {
            root: base.join("regression"),
            archive_prefix: "test-".to_string(),
            simulator: SimulatorConfig {
                program: PathBuf::from("./waf"),
                cwd: base.to_path_buf(),
                args: vec![
                    "--cwd".into(),
                    "{trace_dir}".into(),
                    "--run".into(),
                    "{test}".into(),
                ],
                ignore_exit_status: false,
            },
            layout: Layout::default(),
            tests: Vec::new(),
        }
    }

    /// Load configuration.
    ///
    /// An explicit `path` must exist. Without one, `./regress.toml` is used
    /// when present and the defaults otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from(path),
            None => {
                let default_path = crate::util::default_config_path();
                if default_path.exists() {
                    Self::load_from(&default_path)
                } else {
                    tracing::debug!("No config file found, using defaults");
                    Ok(Self::default())
                }
            }
        }
    }

    /// Load a TOML file, merging it over the defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let path = absolutize(path)?;
        let base = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        let config = Self::from_toml_str(&contents, &base).map_err(|message| {
            RegressError::Config {
                path: path.clone(),
                message,
            }
        })?;
        tracing::debug!(path = %path.display(), tests = config.tests.len(), "Loaded config");
        Ok(config)
    }

    /// Parse TOML text; relative paths resolve against `base`.
    pub fn from_toml_str(contents: &str, base: &Path) -> std::result::Result<Self, String> {
        let toml_config: TomlConfig = toml::from_str(contents).map_err(|e| e.to_string())?;
        let mut config = Self::with_base_dir(base);

        if let Some(root) = toml_config.root {
            config.root = resolve(base, &root);
        }
        if let Some(prefix) = toml_config.archive_prefix {
            config.archive_prefix = prefix;
        }

        if let Some(simulator) = toml_config.simulator {
            if let Some(program) = simulator.program {
                if program.as_os_str().is_empty() {
                    return Err("simulator.program must not be empty".to_string());
                }
                config.simulator.program = program;
            }
            if let Some(cwd) = simulator.cwd {
                config.simulator.cwd = resolve(base, &cwd);
            }
            if let Some(args) = simulator.args {
                config.simulator.args = args;
            }
            if let Some(ignore) = simulator.ignore_exit_status {
                config.simulator.ignore_exit_status = ignore;
            }
        }

        if let Some(layout) = toml_config.layout {
            if let Some(traces) = layout.traces {
                config.layout.traces = traces;
            }
            if let Some(knowns) = layout.knowns {
                config.layout.knowns = knowns;
            }
            if let Some(archives) = layout.archives {
                config.layout.archives = archives;
            }
        }
        config.layout.validate(&config.root)?;

        for test in &toml_config.tests {
            validate_test_name(&test.name)?;
        }
        config.tests = toml_config.tests;

        Ok(config)
    }

    /// Override the regression root (e.g. from `--root`)
    pub fn set_root(&mut self, root: PathBuf) {
        self.root = root;
    }

    /// Re-check the layout against the current root; an absolute
    /// `layout.archives` may overlap a root set after loading.
    pub fn validate_layout(&self) -> Result<()> {
        self.layout
            .validate(&self.root)
            .map_err(RegressError::InvalidLayout)
    }

    pub fn trace_dir(&self) -> PathBuf {
        resolve(&self.root, &self.layout.traces)
    }

    pub fn known_dir(&self) -> PathBuf {
        resolve(&self.root, &self.layout.knowns)
    }

    pub fn archive_dir(&self) -> PathBuf {
        resolve(&self.root, &self.layout.archives)
    }

    /// Baseline archive path for a test: `<archives>/<prefix><name>.bz2`
    pub fn archive_path(&self, test: &str) -> PathBuf {
        self.archive_dir()
            .join(format!("{}{}.bz2", self.archive_prefix, test))
    }

    /// Look up a configured test, falling back to an ad-hoc test case
    pub fn test_case(&self, name: &str) -> Result<TestCase> {
        if let Some(test) = self.tests.iter().find(|t| t.name == name) {
            return Ok(test.clone());
        }
        validate_test_name(name).map_err(|_| RegressError::UnknownTest(name.to_string()))?;
        Ok(TestCase::new(name))
    }

    /// Resolve the tests to run: the named ones, or the whole suite
    pub fn select_tests(&self, names: &[String]) -> Result<Vec<TestCase>> {
        if names.is_empty() {
            if self.tests.is_empty() {
                return Err(RegressError::NoTests);
            }
            return Ok(self.tests.clone());
        }
        names.iter().map(|name| self.test_case(name)).collect()
    }
}

impl SimulatorConfig {
    /// Expand `{test}`, `{trace_dir}` and `{root}` in the argument template.
    pub fn expand_args(
        &self,
        template: &[String],
        test: &str,
        trace_dir: &Path,
        root: &Path,
    ) -> Vec<String> {
        let trace_dir = trace_dir.display().to_string();
        let root = root.display().to_string();
        template
            .iter()
            .map(|arg| {
                arg.replace("{test}", test)
                    .replace("{trace_dir}", &trace_dir)
                    .replace("{root}", &root)
            })
            .collect()
    }
}

/// Test names become file names, so they must be plain.
fn validate_test_name(name: &str) -> std::result::Result<(), String> {
    if name.is_empty() {
        return Err("test name must not be empty".to_string());
    }
    if name == "." || name == ".." || name.contains(|c| c == '/' || c == '\\') {
        return Err(format!("invalid test name '{}'", name));
    }
    Ok(())
}
