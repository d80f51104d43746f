//! Integration tests for the regression runner
//!
//! These tests drive the runner end to end against a scripted simulator.

#[path = "../common/mod.rs"]
pub mod common;

pub mod cli_flow;
