//! Baseline vs trace comparison

mod diff;

pub use diff::{compare_dirs, DiffEntry, DiffKind, DirDiff};
