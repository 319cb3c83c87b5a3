//! Core domain model types for the job guard.
//!
//! This module contains:
//! - Pipeline execution records as reported by the service
//! - Conflict sets produced by each poll
//! - Terminal outcomes and their exit codes

mod outcome;
mod record;

pub use outcome::{GuardOutcome, EXIT_CONFLICT_FAIL_FAST, EXIT_SUCCEEDED, EXIT_TIMED_OUT};
pub use record::{ConflictSet, ExecutionRecord};
