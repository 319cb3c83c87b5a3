//! The guard loop and its delay policies.

mod backoff;
mod runner;

pub use backoff::{collision_delay, BackoffConfig, ErrorBackoff};
pub use runner::{JobGuard, PROCEED_MESSAGE};
