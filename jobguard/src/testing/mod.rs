//! Testing utilities for guard runs.
//!
//! This module provides:
//! - A scripted execution lister
//! - Pipeline record fixtures

mod fixtures;
mod mocks;

pub use fixtures::{record, record_with_sha, scenario_records};
pub use mocks::ScriptedLister;
