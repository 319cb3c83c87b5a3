//! Terminal guard outcomes and their process exit codes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Exit code when no conflicts remain.
pub const EXIT_SUCCEEDED: u8 = 0;
/// Exit code when a conflict was detected and fail-fast was requested.
pub const EXIT_CONFLICT_FAIL_FAST: u8 = 7;
/// Exit code when the deadline elapsed before conflicts cleared.
pub const EXIT_TIMED_OUT: u8 = 11;

/// How a guard run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuardOutcome {
    /// No conflicting executions; the job may proceed.
    Succeeded,
    /// Conflicts were found and the guard was asked not to wait.
    ConflictFailFast,
    /// The wall-clock deadline elapsed while waiting.
    TimedOut,
}

impl GuardOutcome {
    /// Returns the process exit code for this outcome.
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Succeeded => EXIT_SUCCEEDED,
            Self::ConflictFailFast => EXIT_CONFLICT_FAIL_FAST,
            Self::TimedOut => EXIT_TIMED_OUT,
        }
    }

    /// Returns true if the job may proceed.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded)
    }
}

impl fmt::Display for GuardOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Succeeded => write!(f, "succeeded"),
            Self::ConflictFailFast => write!(f, "conflict_fail_fast"),
            Self::TimedOut => write!(f, "timed_out"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(GuardOutcome::Succeeded.exit_code(), 0);
        assert_eq!(GuardOutcome::ConflictFailFast.exit_code(), 7);
        assert_eq!(GuardOutcome::TimedOut.exit_code(), 11);
    }

    #[test]
    fn test_outcome_display() {
        assert_eq!(GuardOutcome::Succeeded.to_string(), "succeeded");
        assert_eq!(GuardOutcome::TimedOut.to_string(), "timed_out");
    }

    #[test]
    fn test_outcome_serialize() {
        let json = serde_json::to_string(&GuardOutcome::ConflictFailFast).unwrap();
        assert_eq!(json, r#""conflict_fail_fast""#);
    }

    #[test]
    fn test_only_succeeded_is_success() {
        assert!(GuardOutcome::Succeeded.is_success());
        assert!(!GuardOutcome::ConflictFailFast.is_success());
        assert!(!GuardOutcome::TimedOut.is_success());
    }
}
