//! Event sink trait and implementations.

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::RwLock;
use tracing::{debug, error, info};

use super::GuardEvent;
use crate::core::GuardOutcome;

/// Receives guard events.
///
/// The guard holds a reference to one sink for its whole run; sinks are
/// built by the caller and never installed globally.
pub trait EventSink: Send + Sync {
    /// Emits an event. Must not fail.
    fn emit(&self, event: &GuardEvent);
}

/// A no-op event sink that discards all events.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpEventSink;

impl EventSink for NoOpEventSink {
    fn emit(&self, _event: &GuardEvent) {
        // Intentionally empty - discards all events
    }
}

/// An event sink that logs through `tracing`.
///
/// Unchanged conflict sets are reported as a `.` on stderr rather than a
/// log line, so a long wait stays readable in CI job logs.
#[derive(Debug, Default)]
pub struct LoggingEventSink {
    quiet: bool,
    /// A progress marker line is open on stderr.
    dots_pending: AtomicBool,
}

impl LoggingEventSink {
    /// Creates a logging sink.
    #[must_use]
    pub fn new(quiet: bool) -> Self {
        Self {
            quiet,
            dots_pending: AtomicBool::new(false),
        }
    }

    /// Returns true if the event would be written.
    #[must_use]
    pub fn should_log(&self, event: &GuardEvent) -> bool {
        !(self.quiet && event.is_progress())
    }

    fn progress_marker(&self) {
        let mut stderr = std::io::stderr().lock();
        // Progress output is best effort.
        let _ = stderr.write_all(b".");
        let _ = stderr.flush();
        self.dots_pending.store(true, Ordering::Relaxed);
    }

    fn close_progress_line(&self) {
        if self.dots_pending.swap(false, Ordering::Relaxed) {
            let mut stderr = std::io::stderr().lock();
            let _ = stderr.write_all(b"\n");
            let _ = stderr.flush();
        }
    }
}

impl EventSink for LoggingEventSink {
    fn emit(&self, event: &GuardEvent) {
        if !self.should_log(event) {
            return;
        }

        match event {
            GuardEvent::ConflictsUnchanged { .. } => {
                self.progress_marker();
                return;
            }
            GuardEvent::Blocked { retry_in } => {
                debug!(retry_in_secs = retry_in.as_secs_f64(), "Waiting before next poll");
                return;
            }
            _ => self.close_progress_line(),
        }

        match event {
            GuardEvent::Started {
                project_api_url,
                ref_pattern,
                status_pattern,
                timeout,
            } => {
                info!(
                    url = %project_api_url,
                    ref_pattern = %ref_pattern,
                    status_pattern = %status_pattern,
                    timeout_secs = timeout.as_secs(),
                    "Guarding against conflicting pipelines"
                );
            }
            GuardEvent::ConflictsChanged {
                conflicts,
                status_pattern,
            } => {
                info!(
                    conflicts = conflicts.len(),
                    "{} other pipelines in ({}) state.",
                    conflicts.len(),
                    status_pattern
                );
                for record in conflicts {
                    info!(
                        id = record.id,
                        status = %record.status,
                        sha = %record.sha,
                        git_ref = %record.git_ref,
                        "{}",
                        record
                    );
                }
            }
            GuardEvent::ApiError { error, retry_in } => {
                error!(
                    kind = error.kind(),
                    retry_in_secs = retry_in.as_secs_f64(),
                    "{}",
                    error
                );
            }
            GuardEvent::Finished { outcome, message } => match outcome {
                GuardOutcome::Succeeded => info!(outcome = %outcome, "{}", message),
                GuardOutcome::ConflictFailFast | GuardOutcome::TimedOut => {
                    error!(outcome = %outcome, "{}", message);
                }
            },
            GuardEvent::ConflictsUnchanged { .. } | GuardEvent::Blocked { .. } => {}
        }
    }
}

/// A collecting event sink for testing purposes.
#[derive(Debug, Default)]
pub struct CollectingEventSink {
    events: RwLock<Vec<GuardEvent>>,
}

impl CollectingEventSink {
    /// Creates a new collecting sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all collected events.
    #[must_use]
    pub fn events(&self) -> Vec<GuardEvent> {
        self.events.read().clone()
    }

    /// Returns the number of collected events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    /// Returns true if no events have been collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.read().is_empty()
    }

    /// Clears all collected events.
    pub fn clear(&self) {
        self.events.write().clear();
    }

    /// Returns events whose type starts with the given prefix.
    #[must_use]
    pub fn events_of_type(&self, type_prefix: &str) -> Vec<GuardEvent> {
        self.events
            .read()
            .iter()
            .filter(|e| e.event_type().starts_with(type_prefix))
            .cloned()
            .collect()
    }
}

impl EventSink for CollectingEventSink {
    fn emit(&self, event: &GuardEvent) {
        self.events.write().push(event.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ConflictSet, ExecutionRecord};
    use crate::errors::ApiAccessError;
    use std::time::Duration;

    fn changed() -> GuardEvent {
        GuardEvent::ConflictsChanged {
            conflicts: ConflictSet::new(vec![ExecutionRecord::new(3, "3-x", "running", "abc")]),
            status_pattern: "running".to_string(),
        }
    }

    #[test]
    fn test_noop_sink() {
        NoOpEventSink.emit(&changed());
        // Should not panic
    }

    #[test]
    fn test_logging_sink_emits_every_kind() {
        let sink = LoggingEventSink::new(false);
        sink.emit(&changed());
        sink.emit(&GuardEvent::ConflictsUnchanged { count: 1 });
        sink.emit(&GuardEvent::Blocked {
            retry_in: Duration::from_secs(4),
        });
        sink.emit(&GuardEvent::ApiError {
            error: ApiAccessError::transport("http://x", "refused"),
            retry_in: Duration::from_secs(3),
        });
        sink.emit(&GuardEvent::Finished {
            outcome: GuardOutcome::Succeeded,
            message: "No other conflicting pipelines detected, proceeding ...".to_string(),
        });
        // Should not panic
    }

    #[test]
    fn test_quiet_sink_suppresses_progress_only() {
        let sink = LoggingEventSink::new(true);
        assert!(!sink.should_log(&changed()));
        assert!(!sink.should_log(&GuardEvent::ConflictsUnchanged { count: 1 }));
        assert!(sink.should_log(&GuardEvent::ApiError {
            error: ApiAccessError::status("u", 502),
            retry_in: Duration::from_secs(1),
        }));
        assert!(sink.should_log(&GuardEvent::Finished {
            outcome: GuardOutcome::TimedOut,
            message: "timeout".to_string(),
        }));

        let loud = LoggingEventSink::new(false);
        assert!(loud.should_log(&changed()));
    }

    #[test]
    fn test_collecting_sink() {
        let sink = CollectingEventSink::new();
        assert!(sink.is_empty());

        sink.emit(&changed());
        sink.emit(&GuardEvent::ConflictsUnchanged { count: 1 });
        sink.emit(&GuardEvent::ConflictsUnchanged { count: 1 });

        assert_eq!(sink.len(), 3);
        assert_eq!(sink.events_of_type("guard.conflicts.").len(), 3);
        assert_eq!(sink.events_of_type("guard.conflicts.unchanged").len(), 2);

        sink.clear();
        assert!(sink.is_empty());
    }
}
