//! Structured event sink for retry and wait loops
//!
//! The loops never write to the console directly. Every notable step is
//! described as a [`RetryEvent`] or [`WaitEvent`] and handed to an injected
//! [`Observer`]. [`TracingObserver`] turns events into `tracing` records with
//! structured fields and is used when no observer is supplied.

use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::resilience::retry::AttemptOutcome;

/// Events emitted by the retry loop.
#[derive(Debug, Clone, Copy)]
pub enum RetryEvent<'a> {
    /// An attempt is about to run.
    Attempt {
        description: &'a str,
        attempt: u32,
        /// `None` for time-bounded sequences.
        max_attempts: Option<u32>,
    },
    /// An attempt failed and the loop will sleep for `delay` before retrying.
    Retrying { description: &'a str, outcome: &'a AttemptOutcome<'a>, delay: Duration },
    /// The operation succeeded.
    Succeeded { description: &'a str, outcome: &'a AttemptOutcome<'a> },
    /// The failure was rejected by the retry condition.
    NonRetryable { description: &'a str, outcome: &'a AttemptOutcome<'a> },
    /// The attempt or time budget is spent.
    Exhausted { description: &'a str, outcome: &'a AttemptOutcome<'a> },
    /// Cancellation was observed.
    Cancelled { description: &'a str, attempts: u32 },
}

/// Events emitted by the polling loop.
#[derive(Debug, Clone, Copy)]
pub enum WaitEvent<'a> {
    /// A wait is starting.
    Started { description: &'a str, timeout: Duration, poll_interval: Duration },
    /// Evaluating the condition failed; the failure counts as "not yet".
    ConditionError { description: &'a str, poll: u32, error: &'a (dyn Error + 'static) },
    /// The condition held.
    Satisfied { description: &'a str, elapsed: Duration, polls: u32 },
    /// The deadline passed without the condition holding.
    TimedOut { description: &'a str, elapsed: Duration, polls: u32 },
    /// Cancellation was observed.
    Cancelled { description: &'a str, elapsed: Duration },
    /// The signal sender was dropped before the signal fired.
    SignalClosed { description: &'a str, elapsed: Duration },
}

/// Receiver for retry and wait events.
///
/// Both methods default to doing nothing so implementations only override
/// what they care about.
pub trait Observer: Send + Sync {
    /// Called for every retry loop event.
    fn on_retry_event(&self, event: &RetryEvent<'_>) {
        let _ = event;
    }

    /// Called for every wait loop event.
    fn on_wait_event(&self, event: &WaitEvent<'_>) {
        let _ = event;
    }
}

/// Shared observer handle used by `Retrier` and `Poller`.
pub type SharedObserver = Arc<dyn Observer>;

/// Observer that discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl Observer for NoopObserver {}

/// Observer that forwards events to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl TracingObserver {
    /// Create a new tracing observer
    pub fn new() -> Self {
        Self
    }

    /// Shared handle to a tracing observer
    pub fn shared() -> SharedObserver {
        Arc::new(Self)
    }
}

impl Observer for TracingObserver {
    fn on_retry_event(&self, event: &RetryEvent<'_>) {
        match *event {
            RetryEvent::Attempt { description, attempt, max_attempts } => {
                debug!(operation = description, attempt, max_attempts = ?max_attempts, "Retry attempt");
            }
            RetryEvent::Retrying { description, outcome, delay } => {
                warn!(
                    operation = description,
                    attempt = outcome.attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %display_failure(outcome.failure),
                    "Retry attempt failed, backing off"
                );
            }
            RetryEvent::Succeeded { description, outcome } => {
                if outcome.attempt > 1 {
                    info!(
                        operation = description,
                        attempts = outcome.attempt,
                        elapsed_ms = outcome.elapsed.as_millis() as u64,
                        "Retry operation succeeded"
                    );
                } else {
                    debug!(operation = description, "Operation succeeded on first attempt");
                }
            }
            RetryEvent::NonRetryable { description, outcome } => {
                warn!(
                    operation = description,
                    attempt = outcome.attempt,
                    error = %display_failure(outcome.failure),
                    "Non-retryable failure, aborting"
                );
            }
            RetryEvent::Exhausted { description, outcome } => {
                error!(
                    operation = description,
                    attempts = outcome.attempt,
                    elapsed_ms = outcome.elapsed.as_millis() as u64,
                    error = %display_failure(outcome.failure),
                    "All retry attempts failed"
                );
            }
            RetryEvent::Cancelled { description, attempts } => {
                warn!(operation = description, attempts, "Retry operation cancelled");
            }
        }
    }

    fn on_wait_event(&self, event: &WaitEvent<'_>) {
        match *event {
            WaitEvent::Started { description, timeout, poll_interval } => {
                debug!(
                    condition = description,
                    timeout_ms = timeout.as_millis() as u64,
                    poll_interval_ms = poll_interval.as_millis() as u64,
                    "Wait until"
                );
            }
            WaitEvent::ConditionError { description, poll, error } => {
                debug!(condition = description, poll, error = %error, "Condition check failed, treating as not met");
            }
            WaitEvent::Satisfied { description, elapsed, polls } => {
                debug!(
                    condition = description,
                    polls,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Condition met"
                );
            }
            WaitEvent::TimedOut { description, elapsed, polls } => {
                warn!(
                    condition = description,
                    polls,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Timed out waiting for condition"
                );
            }
            WaitEvent::Cancelled { description, elapsed } => {
                warn!(
                    condition = description,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Wait cancelled"
                );
            }
            WaitEvent::SignalClosed { description, elapsed } => {
                warn!(
                    condition = description,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Signal closed before firing"
                );
            }
        }
    }
}

fn display_failure(failure: Option<&(dyn Error + 'static)>) -> String {
    failure.map_or_else(|| "<none>".to_string(), ToString::to_string)
}
