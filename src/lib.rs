pub mod baseline;
pub mod cli;
pub mod compare;
pub mod config;
pub mod error;
pub mod runner;
pub mod simulator;
pub mod util;

pub use baseline::BaselineArchive;
pub use compare::{compare_dirs, DiffEntry, DiffKind, DirDiff};
pub use config::{Config, TestCase};
pub use error::RegressError;
pub use runner::{Mode, RegressionRunner, RunOutcome, SuiteReport};
pub use simulator::{Simulator, SimulatorRun};
pub use util::rmdir;
