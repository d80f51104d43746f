//! Path utilities for the regression layout

use std::path::{Path, PathBuf};

/// Name of the config file looked up in the current directory.
pub const CONFIG_FILENAME: &str = "regress.toml";

/// Default config file path (./regress.toml)
pub fn default_config_path() -> PathBuf {
    PathBuf::from(CONFIG_FILENAME)
}

/// Resolve `path` against `base` unless it is already absolute.
pub fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

/// Turn a possibly-relative path into an absolute one using the process CWD.
pub fn absolutize(path: &Path) -> std::io::Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}
