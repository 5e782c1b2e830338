// Per-attempt and per-sequence retry outcomes
use std::error::Error;
use std::time::Duration;

use crate::resilience::retry::error::RetryResult;

/// Snapshot of a single attempt, handed to hooks and observers.
#[derive(Debug, Clone, Copy)]
pub struct AttemptOutcome<'a> {
    /// 1-based attempt index
    pub attempt: u32,
    /// Time since the retry sequence started
    pub elapsed: Duration,
    /// Whether the attempt succeeded
    pub succeeded: bool,
    /// The failure, if the attempt failed
    pub failure: Option<&'a (dyn Error + 'static)>,
}

impl<'a> AttemptOutcome<'a> {
    /// Outcome of a successful attempt
    pub fn succeeded(attempt: u32, elapsed: Duration) -> Self {
        Self { attempt, elapsed, succeeded: true, failure: None }
    }

    /// Outcome of a failed attempt
    pub fn failed(attempt: u32, elapsed: Duration, failure: &'a (dyn Error + 'static)) -> Self {
        Self { attempt, elapsed, succeeded: false, failure: Some(failure) }
    }
}

/// Result of a retry sequence together with summary statistics.
#[derive(Debug)]
pub struct RetryOutcome<T, E> {
    pub result: RetryResult<T, E>,
    /// Number of times the operation was invoked
    pub attempts: u32,
    /// Sum of all sleeps between attempts
    pub total_delay: Duration,
    /// Each sleep, in order
    pub delays: Vec<Duration>,
    /// Wall-clock time from the first attempt to completion
    pub elapsed: Duration,
}

impl<T, E> RetryOutcome<T, E> {
    /// Consume the outcome and return only the result.
    pub fn into_result(self) -> RetryResult<T, E> {
        self.result
    }

    /// Whether the sequence ended in success.
    pub fn succeeded(&self) -> bool {
        self.result.is_ok()
    }

    /// Average sleep between attempts.
    pub fn average_delay(&self) -> Duration {
        match u32::try_from(self.delays.len()) {
            Ok(0) | Err(_) => Duration::ZERO,
            Ok(count) => self.total_delay / count,
        }
    }
}
