//! Observer that captures events for assertions.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::resilience::observer::{Observer, RetryEvent, SharedObserver, WaitEvent};

/// Owned copy of a retry or wait event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedEvent {
    Attempt { description: String, attempt: u32 },
    Retrying { description: String, attempt: u32, delay: Duration, error: String },
    Succeeded { description: String, attempt: u32 },
    NonRetryable { description: String, attempt: u32, error: String },
    Exhausted { description: String, attempt: u32, error: String },
    RetryCancelled { description: String, attempts: u32 },
    WaitStarted { description: String, timeout: Duration },
    ConditionError { description: String, poll: u32, error: String },
    Satisfied { description: String, polls: u32, elapsed: Duration },
    TimedOut { description: String, polls: u32, elapsed: Duration },
    WaitCancelled { description: String, elapsed: Duration },
    SignalClosed { description: String, elapsed: Duration },
}

/// Captures every event it receives.
///
/// ```ignore
/// let recorder = RecordingObserver::new();
/// let retrier = Retrier::new(policy).with_observer(recorder.shared());
/// // ...
/// assert_eq!(recorder.retry_delays(), vec![Duration::from_millis(100)]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct RecordingObserver {
    events: Arc<Mutex<Vec<RecordedEvent>>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle to pass to `with_observer`; shares the same event log
    pub fn shared(&self) -> SharedObserver {
        Arc::new(self.clone())
    }

    /// Snapshot of all captured events, oldest first
    pub fn events(&self) -> Vec<RecordedEvent> {
        self.log().clone()
    }

    /// Delays announced by `Retrying` events
    pub fn retry_delays(&self) -> Vec<Duration> {
        self.log()
            .iter()
            .filter_map(|event| match event {
                RecordedEvent::Retrying { delay, .. } => Some(*delay),
                _ => None,
            })
            .collect()
    }

    /// Number of captured events matching `predicate`
    pub fn count(&self, predicate: impl Fn(&RecordedEvent) -> bool) -> usize {
        self.log().iter().filter(|event| predicate(event)).count()
    }

    pub fn clear(&self) {
        self.log().clear();
    }

    fn log(&self) -> MutexGuard<'_, Vec<RecordedEvent>> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn push(&self, event: RecordedEvent) {
        self.log().push(event);
    }
}

fn failure_text(outcome_failure: Option<&(dyn std::error::Error + 'static)>) -> String {
    outcome_failure.map(ToString::to_string).unwrap_or_default()
}

impl Observer for RecordingObserver {
    fn on_retry_event(&self, event: &RetryEvent<'_>) {
        let recorded = match *event {
            RetryEvent::Attempt { description, attempt, .. } => {
                RecordedEvent::Attempt { description: description.to_string(), attempt }
            }
            RetryEvent::Retrying { description, outcome, delay } => RecordedEvent::Retrying {
                description: description.to_string(),
                attempt: outcome.attempt,
                delay,
                error: failure_text(outcome.failure),
            },
            RetryEvent::Succeeded { description, outcome } => RecordedEvent::Succeeded {
                description: description.to_string(),
                attempt: outcome.attempt,
            },
            RetryEvent::NonRetryable { description, outcome } => RecordedEvent::NonRetryable {
                description: description.to_string(),
                attempt: outcome.attempt,
                error: failure_text(outcome.failure),
            },
            RetryEvent::Exhausted { description, outcome } => RecordedEvent::Exhausted {
                description: description.to_string(),
                attempt: outcome.attempt,
                error: failure_text(outcome.failure),
            },
            RetryEvent::Cancelled { description, attempts } => {
                RecordedEvent::RetryCancelled { description: description.to_string(), attempts }
            }
        };
        self.push(recorded);
    }

    fn on_wait_event(&self, event: &WaitEvent<'_>) {
        let recorded = match *event {
            WaitEvent::Started { description, timeout, .. } => {
                RecordedEvent::WaitStarted { description: description.to_string(), timeout }
            }
            WaitEvent::ConditionError { description, poll, error } => {
                RecordedEvent::ConditionError {
                    description: description.to_string(),
                    poll,
                    error: error.to_string(),
                }
            }
            WaitEvent::Satisfied { description, elapsed, polls } => {
                RecordedEvent::Satisfied { description: description.to_string(), polls, elapsed }
            }
            WaitEvent::TimedOut { description, elapsed, polls } => {
                RecordedEvent::TimedOut { description: description.to_string(), polls, elapsed }
            }
            WaitEvent::Cancelled { description, elapsed } => {
                RecordedEvent::WaitCancelled { description: description.to_string(), elapsed }
            }
            WaitEvent::SignalClosed { description, elapsed } => {
                RecordedEvent::SignalClosed { description: description.to_string(), elapsed }
            }
        };
        self.push(recorded);
    }
}
