//! Cancellation and deadline utilities.
//!
//! This module provides:
//! - CancellationToken for preempting the guard loop
//! - Deadline for turning a wall-clock budget into a cancellation

mod deadline;
mod token;

pub use deadline::{timeout_reason, Deadline};
pub use token::CancellationToken;
