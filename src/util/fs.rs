//! Directory helpers for the trace and known directories

use std::fs;
use std::path::Path;

use crate::error::{RegressError, Result};

/// Remove `dir` and everything below it.
///
/// A missing directory is not an error. A path that exists but is not a
/// directory is rejected rather than deleted.
pub fn rmdir(dir: &Path) -> Result<()> {
    let metadata = match fs::symlink_metadata(dir) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e.into()),
    };

    if !metadata.is_dir() {
        return Err(RegressError::NotADirectory(dir.to_path_buf()));
    }

    fs::remove_dir_all(dir)?;
    tracing::debug!(path = %dir.display(), "Removed directory");
    Ok(())
}

/// Clear `dir` and create it again, empty.
pub fn recreate_dir(dir: &Path) -> Result<()> {
    rmdir(dir)?;
    fs::create_dir_all(dir)?;
    Ok(())
}
