//! Wall-clock deadline that cancels a token when it elapses.

use std::time::Duration;
use tokio::time::Instant;

use super::CancellationToken;

/// Stand-in for deadlines too far out to represent; about 30 years.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// A fixed point in time after which guarded work must stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline {
    at: Instant,
    budget: Duration,
}

impl Deadline {
    /// Arms a deadline `budget` from now.
    ///
    /// Budgets past the end of the clock saturate to a far-future instant.
    #[must_use]
    pub fn after(budget: Duration) -> Self {
        let now = Instant::now();
        let at = now
            .checked_add(budget)
            .unwrap_or_else(|| now + FAR_FUTURE);
        Self { at, budget }
    }

    /// Returns the instant the deadline fires.
    #[must_use]
    pub fn at(&self) -> Instant {
        self.at
    }

    /// Returns the budget the deadline was armed with.
    #[must_use]
    pub fn budget(&self) -> Duration {
        self.budget
    }

    /// Returns true once the deadline has passed.
    #[must_use]
    pub fn is_elapsed(&self) -> bool {
        Instant::now() >= self.at
    }

    /// Completes when `token` is cancelled, cancelling it with a timeout
    /// reason if the deadline is reached first.
    pub async fn enforce(&self, token: &CancellationToken) {
        tokio::select! {
            biased;
            () = tokio::time::sleep_until(self.at) => token.cancel(timeout_reason(self.budget)),
            () = token.cancelled() => {}
        }
    }
}

/// Renders the reason recorded when a deadline fires.
#[must_use]
pub fn timeout_reason(after: Duration) -> String {
    if after.subsec_nanos() == 0 {
        format!("Timeout reached after {} seconds, giving up ...", after.as_secs())
    } else {
        format!("Timeout reached after {after:?}, giving up ...")
    }
}
