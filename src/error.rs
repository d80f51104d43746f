//! Error type shared by the runner modules

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RegressError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid configuration in {path}: {message}")]
    Config { path: PathBuf, message: String },
    #[error("Invalid layout: {0}")]
    InvalidLayout(String),
    #[error("Simulator not found: {0}")]
    SimulatorNotFound(String),
    #[error("Failed to spawn simulator {program}: {source}")]
    SimulatorSpawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("No baseline archive for test '{test}' at {path}")]
    BaselineMissing { test: String, path: PathBuf },
    #[error("Archive error in {path}: {source}")]
    Archive {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Rejected archive entry {entry} in {path}")]
    ArchiveEntry { path: PathBuf, entry: String },
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),
    #[error("Unknown test: {0}")]
    UnknownTest(String),
    #[error("No tests configured and none given on the command line")]
    NoTests,
}

pub type Result<T> = std::result::Result<T, RegressError>;
