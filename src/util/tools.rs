//! Simulator program detection
//!
//! Resolves the configured simulator program to an executable on disk,
//! either as a path relative to the simulator working directory or by
//! searching `PATH`.

use std::path::{Path, PathBuf};

/// Status of the simulator program's availability
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ToolStatus {
    /// Program is available at the given path
    Available(PathBuf),
    /// Program was not found in PATH
    #[default]
    NotFound,
    /// A path was configured but it is missing or not executable
    ConfiguredPathInvalid(PathBuf),
}

/// Detect the simulator program.
///
/// 1. If `program` contains a path separator, resolve it against `cwd` and
///    check it is an executable file
/// 2. Otherwise use `which` to find it in PATH
pub fn detect_program(program: &Path, cwd: &Path) -> ToolStatus {
    if program.components().count() > 1 || program.is_absolute() {
        let path = super::paths::resolve(cwd, program);
        if is_valid_executable(&path) {
            return ToolStatus::Available(path);
        }
        return ToolStatus::ConfiguredPathInvalid(path);
    }

    match which::which(program) {
        Ok(path) => ToolStatus::Available(path),
        Err(_) => ToolStatus::NotFound,
    }
}

/// Check if a path points to a valid executable
fn is_valid_executable(path: &Path) -> bool {
    if !path.is_file() {
        return false;
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if let Ok(metadata) = path.metadata() {
            return metadata.permissions().mode() & 0o111 != 0;
        }
        false
    }

    #[cfg(not(unix))]
    {
        true
    }
}
