//! Events emitted by the guard loop.

use std::time::Duration;

use crate::core::{ConflictSet, GuardOutcome};
use crate::errors::ApiAccessError;

/// Something observable that happened during a guard run.
#[derive(Debug, Clone, PartialEq)]
pub enum GuardEvent {
    /// The guard armed its deadline and is about to poll.
    Started {
        /// Project-scoped API URL being polled.
        project_api_url: String,
        /// Ref pattern in effect.
        ref_pattern: String,
        /// Status pattern in effect.
        status_pattern: String,
        /// Wall-clock budget.
        timeout: Duration,
    },
    /// The conflict set differs from the previous poll.
    ConflictsChanged {
        /// The new conflict set.
        conflicts: ConflictSet,
        /// Status pattern, for the summary line.
        status_pattern: String,
    },
    /// The conflict set is the same as on the previous poll.
    ConflictsUnchanged {
        /// Number of conflicting executions.
        count: usize,
    },
    /// The guard is sleeping before the next poll because of conflicts.
    Blocked {
        /// Collision-avoidance delay.
        retry_in: Duration,
    },
    /// Pipeline records could not be retrieved.
    ApiError {
        /// What went wrong.
        error: ApiAccessError,
        /// Backoff delay before the next poll.
        retry_in: Duration,
    },
    /// The guard reached a terminal state.
    Finished {
        /// The terminal outcome.
        outcome: GuardOutcome,
        /// Final message for the user.
        message: String,
    },
}

impl GuardEvent {
    /// Returns the dotted event type name.
    #[must_use]
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Started { .. } => "guard.started",
            Self::ConflictsChanged { .. } => "guard.conflicts.changed",
            Self::ConflictsUnchanged { .. } => "guard.conflicts.unchanged",
            Self::Blocked { .. } => "guard.blocked",
            Self::ApiError { .. } => "guard.api_error",
            Self::Finished { .. } => "guard.finished",
        }
    }

    /// Returns true for events that only report conflict progress.
    ///
    /// Quiet mode suppresses these.
    #[must_use]
    pub fn is_progress(&self) -> bool {
        matches!(
            self,
            Self::ConflictsChanged { .. } | Self::ConflictsUnchanged { .. } | Self::Blocked { .. }
        )
    }
}
