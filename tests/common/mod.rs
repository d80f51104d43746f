//! Shared test utilities
//!
//! - Fake simulator project fixtures

pub mod sim_fixtures;
