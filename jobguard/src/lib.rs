//! # Jobguard
//!
//! Keeps a CI job from running while other pipelines of the same project
//! are active.
//!
//! A guard polls the GitLab pipelines API and looks for conflicting
//! executions, meaning pipelines other than its own whose ref and status
//! match the configured patterns. While any remain it either waits or exits
//! immediately, depending on configuration. It stops after a hard wall-clock
//! timeout.
//!
//! - **Conflict predicate**: unanchored ref search, prefix-anchored status match
//! - **Polite polling**: wrap-around error backoff and randomized collision delays
//! - **Bounded runtime**: a deadline that preempts any in-flight request or sleep
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use jobguard::prelude::*;
//!
//! let config = GuardConfig::builder()
//!     .with_api_url("https://gitlab.example.com/api/v4")
//!     .with_project_id("7")
//!     .with_self_execution_id(1234)
//!     .with_credential(token)
//!     .build()?;
//!
//! let lister = GitLabLister::from_config(&config)?;
//! let sink = LoggingEventSink::new(config.quiet());
//! let outcome = JobGuard::new(config, lister, &sink).run().await;
//! std::process::exit(i32::from(outcome.exit_code()));
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod cancellation;
pub mod config;
pub mod conflict;
pub mod core;
pub mod errors;
pub mod events;
pub mod guard;
pub mod lister;
pub mod observability;
pub mod testing;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::cancellation::{CancellationToken, Deadline};
    pub use crate::config::{AuthStyle, GuardConfig, GuardConfigBuilder};
    pub use crate::conflict::ConflictMatcher;
    pub use crate::core::{ConflictSet, ExecutionRecord, GuardOutcome};
    pub use crate::errors::{ApiAccessError, ConfigError, JobGuardError};
    pub use crate::events::{EventSink, GuardEvent, LoggingEventSink, NoOpEventSink};
    pub use crate::guard::{BackoffConfig, JobGuard};
    pub use crate::lister::{ExecutionLister, GitLabLister};
    pub use crate::observability::init_tracing;
}
