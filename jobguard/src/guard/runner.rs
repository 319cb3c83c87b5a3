//! The guard loop.
//!
//! One logical thread of control walks POLLING, EVALUATING, BLOCKED and
//! RETRYING_AFTER_ERROR in sequence. The wall-clock deadline is raced against
//! the whole loop, so it preempts a pending request or sleep the moment it
//! elapses.

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::debug;

use super::backoff::{collision_delay, BackoffConfig, ErrorBackoff};
use crate::cancellation::{timeout_reason, CancellationToken, Deadline};
use crate::config::GuardConfig;
use crate::core::{ConflictSet, ExecutionRecord, GuardOutcome};
use crate::errors::{ApiAccessError, ConfigError};
use crate::events::{EventSink, GuardEvent};
use crate::lister::ExecutionLister;

/// Final message when no conflicts remain.
pub const PROCEED_MESSAGE: &str = "No other conflicting pipelines detected, proceeding ...";

#[derive(Debug)]
enum GuardState {
    Polling,
    Evaluating(Vec<ExecutionRecord>),
    Blocked { count: usize, changed: bool },
    RetryingAfterError(ApiAccessError),
    Done(GuardOutcome, String),
}

/// Blocks a CI job while conflicting pipelines are active.
pub struct JobGuard<'a, L: ExecutionLister> {
    config: GuardConfig,
    lister: L,
    sink: &'a dyn EventSink,
    backoff: BackoffConfig,
    rng: StdRng,
}

impl<'a, L: ExecutionLister> JobGuard<'a, L> {
    /// Creates a guard with the default delay policy.
    pub fn new(config: GuardConfig, lister: L, sink: &'a dyn EventSink) -> Self {
        Self {
            config,
            lister,
            sink,
            backoff: BackoffConfig::default(),
            rng: StdRng::from_entropy(),
        }
    }

    /// Replaces the delay policy.
    pub fn with_backoff(mut self, backoff: BackoffConfig) -> Result<Self, ConfigError> {
        backoff.validate()?;
        self.backoff = backoff;
        Ok(self)
    }

    /// Seeds the random source, making delays reproducible.
    #[must_use]
    pub fn with_rng_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Returns the configuration.
    pub fn config(&self) -> &GuardConfig {
        &self.config
    }

    /// Runs until the guard reaches a terminal state.
    pub async fn run(&mut self) -> GuardOutcome {
        self.run_with_token(&CancellationToken::new()).await
    }

    /// Runs until a terminal state or until `token` is cancelled.
    ///
    /// The configured timeout cancels `token` when it elapses. A cancelled
    /// token ends the run as [`GuardOutcome::TimedOut`] with the token's
    /// reason as the final message.
    pub async fn run_with_token(&mut self, token: &CancellationToken) -> GuardOutcome {
        let deadline = Deadline::after(self.config.timeout());
        let matcher = self.config.matcher();

        self.sink.emit(&GuardEvent::Started {
            project_api_url: self.config.project_api_url().to_string(),
            ref_pattern: matcher.ref_pattern().to_string(),
            status_pattern: matcher.status_pattern().to_string(),
            timeout: self.config.timeout(),
        });

        let (outcome, message) = tokio::select! {
            biased;
            () = deadline.enforce(token) => {
                let message = token
                    .reason()
                    .unwrap_or_else(|| timeout_reason(deadline.budget()));
                (GuardOutcome::TimedOut, message)
            }
            finished = self.poll_until_clear() => finished,
        };

        self.sink.emit(&GuardEvent::Finished {
            outcome,
            message,
        });
        outcome
    }

    async fn poll_until_clear(&mut self) -> (GuardOutcome, String) {
        let mut backoff = ErrorBackoff::new(&self.backoff, &mut self.rng);
        let mut previous = ConflictSet::default();
        let mut state = GuardState::Polling;

        loop {
            state = match state {
                GuardState::Polling => match self.lister.list_executions().await {
                    Ok(records) => {
                        backoff.reset();
                        GuardState::Evaluating(records)
                    }
                    Err(error) => GuardState::RetryingAfterError(error),
                },
                GuardState::Evaluating(records) => {
                    let matcher = self.config.matcher();
                    let conflicts = matcher.find_conflicts(&records);
                    debug!(
                        listed = records.len(),
                        conflicts = conflicts.len(),
                        "Evaluated pipeline records"
                    );

                    let changed = !conflicts.same_members(&previous);
                    if changed {
                        self.sink.emit(&GuardEvent::ConflictsChanged {
                            conflicts: conflicts.clone(),
                            status_pattern: matcher.status_pattern().to_string(),
                        });
                    }

                    if conflicts.is_empty() {
                        GuardState::Done(GuardOutcome::Succeeded, PROCEED_MESSAGE.to_string())
                    } else {
                        let count = conflicts.len();
                        previous = conflicts;

                        if self.config.fail_fast() {
                            GuardState::Done(
                                GuardOutcome::ConflictFailFast,
                                format!(
                                    "{count} other pipelines in ({}) state. Exiting on request.",
                                    matcher.status_pattern()
                                ),
                            )
                        } else {
                            GuardState::Blocked { count, changed }
                        }
                    }
                }
                GuardState::Blocked { count, changed } => {
                    if !changed {
                        self.sink.emit(&GuardEvent::ConflictsUnchanged { count });
                    }
                    let retry_in = collision_delay(&self.backoff, &mut self.rng);
                    self.sink.emit(&GuardEvent::Blocked { retry_in });
                    tokio::time::sleep(retry_in).await;
                    GuardState::Polling
                }
                GuardState::RetryingAfterError(error) => {
                    let retry_in = backoff.next_delay();
                    self.sink.emit(&GuardEvent::ApiError { error, retry_in });
                    tokio::time::sleep(retry_in).await;
                    GuardState::Polling
                }
                GuardState::Done(outcome, message) => return (outcome, message),
            };
        }
    }
}

impl<L: ExecutionLister> std::fmt::Debug for JobGuard<'_, L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobGuard")
            .field("config", &self.config)
            .field("backoff", &self.backoff)
            .finish_non_exhaustive()
    }
}
