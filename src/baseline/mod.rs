//! Baseline archives: the persisted known-good trace for each test.

pub mod archive;

pub use archive::BaselineArchive;
