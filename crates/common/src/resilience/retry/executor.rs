//! The retry loop.

use std::error::Error;
use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::instrument;

use crate::resilience::cancel::{check, is_cancellation, run_or_cancel, sleep_or_cancel};
use crate::resilience::observer::{RetryEvent, SharedObserver, TracingObserver};
use crate::resilience::retry::error::{RetryError, RetryResult};
use crate::resilience::retry::outcome::{AttemptOutcome, RetryOutcome};
use crate::resilience::retry::policy::RetryPolicy;

const DEFAULT_DESCRIPTION: &str = "operation";

/// Runs a fallible async operation under a [`RetryPolicy`].
///
/// ```ignore
/// let retrier = Retrier::new(RetryPolicy::fixed(3, Duration::from_millis(100)))
///     .describe("send message");
/// let reply = retrier.execute(|| chat.send("hello")).await?;
/// ```
///
/// The first attempt always runs. Attempt-bounded policies stop after
/// `max_attempts` invocations; time-bounded policies stop once the budget is
/// spent, never sleeping past it. There is no sleep after the final attempt.
#[derive(Clone)]
pub struct Retrier {
    policy: RetryPolicy,
    description: String,
    observer: SharedObserver,
    cancellation: Option<CancellationToken>,
}

impl std::fmt::Debug for Retrier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Retrier")
            .field("policy", &self.policy)
            .field("description", &self.description)
            .field("cancellable", &self.cancellation.is_some())
            .finish()
    }
}

impl Retrier {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            description: DEFAULT_DESCRIPTION.to_string(),
            observer: TracingObserver::shared(),
            cancellation: None,
        }
    }

    /// Label used in events and errors
    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Replace the default tracing observer
    pub fn with_observer(mut self, observer: SharedObserver) -> Self {
        self.observer = observer;
        self
    }

    /// Stop promptly once `token` is cancelled
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Execute `operation` until it succeeds or the policy gives up.
    pub async fn execute<F, Fut, T, E>(&self, operation: F) -> RetryResult<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Error + Send + Sync + 'static,
    {
        self.execute_with_outcome(operation).await.into_result()
    }

    /// [`Self::execute`] for operations that produce no value.
    pub async fn execute_void<F, Fut, E>(&self, operation: F) -> RetryResult<(), E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<(), E>>,
        E: Error + Send + Sync + 'static,
    {
        self.execute(operation).await
    }

    /// Execute `operation` and return the result with attempt statistics.
    #[instrument(skip_all, fields(operation = %self.description))]
    pub async fn execute_with_outcome<F, Fut, T, E>(&self, mut operation: F) -> RetryOutcome<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Error + Send + Sync + 'static,
    {
        let token = self.cancellation.as_ref();
        let mut tally = Tally::new();
        let max_attempts = (!self.policy.is_time_bounded()).then_some(self.policy.max_attempts);

        loop {
            if check(token).is_err() {
                return self.cancelled(tally);
            }

            tally.attempts += 1;
            let attempt = tally.attempts;
            self.emit_attempt(RetryEvent::Attempt {
                description: &self.description,
                attempt,
                max_attempts,
            });

            let result = match run_or_cancel(token, operation()).await {
                Ok(result) => result,
                Err(_) => return self.cancelled(tally),
            };
            let elapsed = tally.start.elapsed();

            let error = match result {
                Ok(value) => {
                    let outcome = AttemptOutcome::succeeded(attempt, elapsed);
                    self.observer.on_retry_event(&RetryEvent::Succeeded {
                        description: &self.description,
                        outcome: &outcome,
                    });
                    return tally.finish(Ok(value));
                }
                Err(error) => error,
            };

            if is_cancellation(&error) {
                return self.cancelled(tally);
            }

            let delay = {
                let outcome = AttemptOutcome::failed(attempt, elapsed, &error);

                if !self.policy.retry_on.allows(&error) {
                    self.observer.on_retry_event(&RetryEvent::NonRetryable {
                        description: &self.description,
                        outcome: &outcome,
                    });
                    None
                } else if let Some(delay) = self.next_delay(attempt, elapsed) {
                    if let Some(hook) = &self.policy.on_retry {
                        hook.call(&outcome);
                    }
                    self.emit_attempt(RetryEvent::Retrying {
                        description: &self.description,
                        outcome: &outcome,
                        delay,
                    });
                    Some(delay)
                } else {
                    if let Some(hook) = &self.policy.on_exhausted {
                        hook.call(&outcome);
                    }
                    self.observer.on_retry_event(&RetryEvent::Exhausted {
                        description: &self.description,
                        outcome: &outcome,
                    });
                    return tally.finish(Err(RetryError::Exhausted {
                        description: self.description.clone(),
                        attempts: attempt,
                        elapsed,
                        source: error,
                    }));
                }
            };

            let Some(delay) = delay else {
                return tally.finish(Err(RetryError::NonRetryable {
                    description: self.description.clone(),
                    attempts: attempt,
                    source: error,
                }));
            };

            if sleep_or_cancel(token, delay).await.is_err() {
                return self.cancelled(tally);
            }
            tally.record_delay(delay);
        }
    }

    /// Sleep before the next attempt, or `None` when the budget is spent.
    fn next_delay(&self, attempt: u32, elapsed: Duration) -> Option<Duration> {
        match self.policy.time_budget {
            Some(total) => {
                let remaining = total.saturating_sub(elapsed);
                if remaining.is_zero() {
                    None
                } else {
                    Some(self.policy.jittered_delay(attempt).min(remaining))
                }
            }
            None if attempt >= self.policy.max_attempts => None,
            None => Some(self.policy.jittered_delay(attempt)),
        }
    }

    fn emit_attempt(&self, event: RetryEvent<'_>) {
        if self.policy.log_attempts {
            self.observer.on_retry_event(&event);
        }
    }

    fn cancelled<T, E>(&self, tally: Tally) -> RetryOutcome<T, E> {
        self.observer.on_retry_event(&RetryEvent::Cancelled {
            description: &self.description,
            attempts: tally.attempts,
        });
        let attempts = tally.attempts;
        tally.finish(Err(RetryError::Cancelled { description: self.description.clone(), attempts }))
    }
}

/// Running statistics for one retry sequence
struct Tally {
    start: Instant,
    attempts: u32,
    delays: Vec<Duration>,
    total_delay: Duration,
}

impl Tally {
    fn new() -> Self {
        Self { start: Instant::now(), attempts: 0, delays: Vec::new(), total_delay: Duration::ZERO }
    }

    fn record_delay(&mut self, delay: Duration) {
        self.delays.push(delay);
        self.total_delay += delay;
    }

    fn finish<T, E>(self, result: RetryResult<T, E>) -> RetryOutcome<T, E> {
        RetryOutcome {
            result,
            attempts: self.attempts,
            total_delay: self.total_delay,
            delays: self.delays,
            elapsed: self.start.elapsed(),
        }
    }
}

/// Retry `operation` under `policy` with the default observer.
pub async fn retry<F, Fut, T, E>(
    policy: RetryPolicy,
    description: impl Into<String>,
    operation: F,
) -> RetryResult<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Error + Send + Sync + 'static,
{
    Retrier::new(policy).describe(description).execute(operation).await
}

/// [`retry`] for operations that produce no value.
pub async fn retry_void<F, Fut, E>(
    policy: RetryPolicy,
    description: impl Into<String>,
    operation: F,
) -> RetryResult<(), E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<(), E>>,
    E: Error + Send + Sync + 'static,
{
    Retrier::new(policy).describe(description).execute_void(operation).await
}

#[cfg(test)]
mod tests {
    //! Unit tests for resilience::retry::executor.
    //!
    //! Timing assertions run on paused tokio time, so sleeps complete
    //! instantly and `Instant::elapsed` reflects the virtual clock.

    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    use super::*;
    use crate::resilience::cancel::Cancelled;
    use crate::resilience::observer::NoopObserver;
    use crate::resilience::retry::policy::{FailureKind, RetryHook};

    #[derive(Debug, thiserror::Error)]
    enum ChatError {
        #[error("socket dropped")]
        Socket,
        #[error("invalid credentials")]
        Auth,
        #[error("cancelled by caller")]
        Stopped(#[source] Cancelled),
    }

    fn is_socket(err: &(dyn Error + 'static)) -> bool {
        matches!(err.downcast_ref::<ChatError>(), Some(ChatError::Socket))
    }

    fn quiet(policy: RetryPolicy) -> Retrier {
        Retrier::new(policy).with_observer(Arc::new(NoopObserver))
    }

    /// Validates an always-failing operation runs exactly `max_attempts` times.
    ///
    /// Assertions:
    /// - Confirms 4 invocations for `max_attempts = 4`.
    /// - Confirms the error is `Exhausted` with the last failure.
    /// - Confirms no sleep follows the final attempt.
    #[tokio::test(start_paused = true)]
    async fn test_exhausts_attempt_budget() {
        let calls = AtomicU32::new(0);
        let calls = &calls;
        let retrier = quiet(RetryPolicy::fixed(4, Duration::from_millis(100))).describe("send");

        let outcome = retrier
            .execute_with_outcome(|| async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(ChatError::Socket)
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 4);
        assert_eq!(outcome.attempts, 4);
        assert_eq!(outcome.delays.len(), 3);
        assert_eq!(outcome.elapsed, Duration::from_millis(300));
        let err = outcome.into_result().unwrap_err();
        assert!(err.is_exhausted());
        assert!(matches!(err.last_error(), Some(ChatError::Socket)));
    }

    /// Validates success on attempt `k` stops immediately.
    #[tokio::test(start_paused = true)]
    async fn test_success_on_third_attempt() {
        let calls = AtomicU32::new(0);
        let calls = &calls;
        let retrier = quiet(RetryPolicy::fixed(5, Duration::from_millis(50)));
        let start = Instant::now();

        let value = retrier
            .execute(|| async move {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                if n < 3 {
                    Err(ChatError::Socket)
                } else {
                    Ok(n)
                }
            })
            .await
            .expect("third attempt succeeds");

        assert_eq!(value, 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(start.elapsed(), Duration::from_millis(100));
    }

    /// Validates `max_attempts = 1` never retries.
    #[tokio::test(start_paused = true)]
    async fn test_single_attempt_policy() {
        let calls = AtomicU32::new(0);
        let calls = &calls;
        let err = quiet(RetryPolicy::fixed(1, Duration::from_secs(1)))
            .execute(|| async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(ChatError::Socket)
            })
            .await
            .unwrap_err();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(err, RetryError::Exhausted { attempts: 1, .. }));
    }

    /// Validates a non-retryable failure stops after one attempt.
    ///
    /// Assertions:
    /// - Confirms one invocation despite a budget of 5.
    /// - Confirms the original error comes back unwrapped.
    /// - Confirms `on_exhausted` does not fire.
    #[tokio::test(start_paused = true)]
    async fn test_non_retryable_stops_immediately() {
        let calls = AtomicU32::new(0);
        let calls = &calls;
        let exhausted = Arc::new(AtomicU32::new(0));
        let seen = exhausted.clone();
        let policy = RetryPolicy::builder()
            .max_attempts(5)
            .initial_delay(Duration::from_millis(10))
            .retry_on([FailureKind::new("socket", is_socket)])
            .on_exhausted(RetryHook::new(move |_| {
                seen.fetch_add(1, Ordering::SeqCst);
            }))
            .build()
            .expect("valid policy");

        let err = quiet(policy)
            .execute(|| async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(ChatError::Auth)
            })
            .await
            .unwrap_err();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(err.into_inner(), Some(ChatError::Auth)));
        assert_eq!(exhausted.load(Ordering::SeqCst), 0);
    }

    /// Validates hooks fire on each retry and once on exhaustion.
    #[tokio::test(start_paused = true)]
    async fn test_hooks_fire() {
        let retries = Arc::new(AtomicU32::new(0));
        let exhausted = Arc::new(AtomicU32::new(0));
        let (r, e) = (retries.clone(), exhausted.clone());
        let policy = RetryPolicy::builder()
            .max_attempts(3)
            .initial_delay(Duration::from_millis(10))
            .on_retry(RetryHook::new(move |outcome| {
                assert!(outcome.failure.is_some());
                r.fetch_add(1, Ordering::SeqCst);
            }))
            .on_exhausted(RetryHook::new(move |outcome| {
                assert_eq!(outcome.attempt, 3);
                e.fetch_add(1, Ordering::SeqCst);
            }))
            .build()
            .expect("valid policy");

        let _ = quiet(policy).execute(|| async move { Err::<(), _>(ChatError::Socket) }).await;

        assert_eq!(retries.load(Ordering::SeqCst), 2);
        assert_eq!(exhausted.load(Ordering::SeqCst), 1);
    }

    /// Validates the time-bounded mode never sleeps past the budget.
    ///
    /// Assertions:
    /// - Confirms delays of 1s, 2s then a clamped 2s for a 5s budget.
    /// - Confirms the sequence ends `Exhausted` at exactly 5s.
    #[tokio::test(start_paused = true)]
    async fn test_time_bounded_clamps_to_remaining() {
        let calls = AtomicU32::new(0);
        let calls = &calls;
        let outcome = quiet(RetryPolicy::time_bounded(Duration::from_secs(5)))
            .execute_with_outcome(|| async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(ChatError::Socket)
            })
            .await;

        assert_eq!(
            outcome.delays,
            vec![Duration::from_secs(1), Duration::from_secs(2), Duration::from_secs(2)]
        );
        assert_eq!(calls.load(Ordering::SeqCst), 4);
        assert_eq!(outcome.elapsed, Duration::from_secs(5));
        assert!(outcome.into_result().unwrap_err().is_exhausted());
    }

    /// Validates a zero time budget still runs the first attempt.
    #[tokio::test(start_paused = true)]
    async fn test_zero_time_budget_runs_once() {
        let calls = AtomicU32::new(0);
        let calls = &calls;
        let err = quiet(RetryPolicy::time_bounded(Duration::ZERO))
            .execute(|| async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(ChatError::Socket)
            })
            .await
            .unwrap_err();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(err.attempts(), 1);
    }

    /// Validates a cancellation error from the operation is not retried.
    #[tokio::test(start_paused = true)]
    async fn test_cancellation_error_stops() {
        let calls = AtomicU32::new(0);
        let calls = &calls;
        let err = quiet(RetryPolicy::fixed(5, Duration::from_millis(10)))
            .execute(|| async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(ChatError::Stopped(Cancelled))
            })
            .await
            .unwrap_err();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(err.is_cancelled());
    }

    /// Validates a token fired during the backoff sleep ends the sequence.
    #[tokio::test(start_paused = true)]
    async fn test_token_interrupts_sleep() {
        let token = CancellationToken::new();
        let trigger = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(150)).await;
            trigger.cancel();
        });

        let calls = AtomicU32::new(0);
        let calls = &calls;
        let start = Instant::now();
        let err = quiet(RetryPolicy::fixed(10, Duration::from_secs(1)))
            .with_cancellation(token)
            .execute(|| async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(ChatError::Socket)
            })
            .await
            .unwrap_err();

        assert!(err.is_cancelled());
        assert_eq!(err.attempts(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(start.elapsed(), Duration::from_millis(150));
    }

    /// Validates the free-function forms.
    #[tokio::test(start_paused = true)]
    async fn test_free_functions() {
        let value: Result<u8, RetryError<ChatError>> =
            retry(RetryPolicy::immediate(2), "fetch", || async move { Ok(7) }).await;
        assert_eq!(value.ok(), Some(7));

        let calls = AtomicU32::new(0);
        let calls = &calls;
        let unit = retry_void(RetryPolicy::immediate(3), "click", || async move {
            if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(ChatError::Socket)
            } else {
                Ok(())
            }
        })
        .await;
        assert!(unit.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
