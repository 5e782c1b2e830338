//! The polling loop and its condition forms.

use std::convert::Infallible;
use std::error::Error;
use std::fmt;
use std::future::{ready, Future};
use std::time::Duration;

use futures::FutureExt;
use tokio::sync::watch;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::resilience::cancel::{is_cancellation, run_or_cancel, sleep_or_cancel};
use crate::resilience::observer::{SharedObserver, TracingObserver, WaitEvent};
use crate::resilience::wait::activity::ActivityMonitor;
use crate::resilience::wait::constants::{
    DEFAULT_QUIET_PERIOD, DEFAULT_STABLE_CHECKS, MIN_POLL_INTERVAL,
};
use crate::resilience::wait::error::{WaitError, WaitResult};
use crate::resilience::wait::spec::WaitSpec;

/// Evaluates conditions until they hold or a [`WaitSpec`] deadline passes.
///
/// The condition is evaluated once immediately. While it does not hold and
/// the deadline is still ahead, the poller sleeps `min(poll_interval,
/// remaining)` and evaluates again, so the final evaluation lands exactly on
/// the deadline. A zero timeout evaluates once and never sleeps. An async
/// condition still pending at the deadline is dropped and the wait times out.
/// A timeout too large to represent as an instant means no deadline.
#[derive(Clone)]
pub struct Poller {
    observer: SharedObserver,
    cancellation: Option<CancellationToken>,
}

impl fmt::Debug for Poller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Poller").field("cancellable", &self.cancellation.is_some()).finish()
    }
}

impl Default for Poller {
    fn default() -> Self {
        Self::new()
    }
}

impl Poller {
    pub fn new() -> Self {
        Self { observer: TracingObserver::shared(), cancellation: None }
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

    /// Wait for a synchronous predicate to return `true`.
    pub async fn wait_until<F>(&self, spec: &WaitSpec, mut condition: F) -> WaitResult<()>
    where
        F: FnMut() -> bool,
    {
        self.poll(spec, || ready(Ok::<_, Infallible>(condition())), |held| held).await
    }

    /// Wait for an async predicate to resolve to `true`.
    pub async fn wait_until_async<F, Fut>(&self, spec: &WaitSpec, mut condition: F) -> WaitResult<()>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = bool>,
    {
        self.poll(spec, || condition().map(Ok::<_, Infallible>), |held| held).await
    }

    /// Wait for a fallible async predicate.
    ///
    /// Evaluation errors count as "not yet" and are reported to the observer.
    /// Errors carrying [`crate::resilience::Cancelled`] end the wait with
    /// [`WaitError::Cancelled`].
    pub async fn try_wait_until<F, Fut, E>(&self, spec: &WaitSpec, condition: F) -> WaitResult<()>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<bool, E>>,
        E: Error + 'static,
    {
        self.poll(spec, condition, |held| held).await
    }

    /// Wait for something to go away.
    ///
    /// `probe` reports whether the thing is present. "Not present" and any
    /// probe error both count as success.
    pub async fn wait_for_absence<F, Fut, E>(&self, spec: &WaitSpec, mut probe: F) -> WaitResult<()>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<bool, E>>,
        E: Error + 'static,
    {
        self.poll(
            spec,
            || {
                probe().map(|result| match result {
                    Ok(present) => Ok(present),
                    Err(err) if is_cancellation(&err) => Err(err),
                    Err(_) => Ok(false),
                })
            },
            |present| !present,
        )
        .await
    }

    /// Wait for a sampled value to equal `expected`.
    pub async fn wait_for_value<T, F, Fut, E>(
        &self,
        spec: &WaitSpec,
        expected: T,
        sample: F,
    ) -> WaitResult<()>
    where
        T: PartialEq,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Error + 'static,
    {
        self.poll(spec, sample, |value| value == expected).await
    }

    /// Wait for a sampled count to equal `expected`.
    pub async fn wait_for_count<F, Fut, E>(
        &self,
        spec: &WaitSpec,
        expected: usize,
        count: F,
    ) -> WaitResult<()>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<usize, E>>,
        E: Error + 'static,
    {
        self.wait_for_value(spec, expected, count).await
    }

    /// Wait for a sampled value to stop changing.
    ///
    /// Succeeds once `required_checks` consecutive samples equal the one
    /// before them. Sample errors are skipped and leave the streak intact.
    pub async fn wait_for_stable<T, F, Fut, E>(
        &self,
        spec: &WaitSpec,
        required_checks: u32,
        sample: F,
    ) -> WaitResult<()>
    where
        T: PartialEq,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Error + 'static,
    {
        let mut last: Option<T> = None;
        let mut streak = 0u32;
        self.poll(spec, sample, |value| {
            if last.as_ref() == Some(&value) {
                streak += 1;
            } else {
                streak = 0;
            }
            last = Some(value);
            streak >= required_checks
        })
        .await
    }

    /// Wait until `monitor` has had nothing in flight for `quiet_period`.
    pub async fn wait_for_quiet(
        &self,
        spec: &WaitSpec,
        monitor: &ActivityMonitor,
        quiet_period: Duration,
    ) -> WaitResult<()> {
        self.wait_until(spec, || monitor.is_quiet(quiet_period)).await
    }

    /// [`Self::wait_for_stable`] with the default of 3 unchanged samples.
    pub async fn wait_for_settled<T, F, Fut, E>(&self, spec: &WaitSpec, sample: F) -> WaitResult<()>
    where
        T: PartialEq,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Error + 'static,
    {
        self.wait_for_stable(spec, DEFAULT_STABLE_CHECKS, sample).await
    }

    /// [`Self::wait_for_quiet`] with the default 1s quiet period.
    pub async fn wait_for_idle(&self, spec: &WaitSpec, monitor: &ActivityMonitor) -> WaitResult<()> {
        self.wait_for_quiet(spec, monitor, DEFAULT_QUIET_PERIOD).await
    }

    /// Wait for an event signal to become `true` without polling.
    ///
    /// Fails with [`WaitError::SignalClosed`] when the sender is dropped
    /// while the value is still `false`.
    pub async fn wait_for_signal(
        &self,
        spec: &WaitSpec,
        mut signal: watch::Receiver<bool>,
    ) -> WaitResult<()> {
        let start = Instant::now();
        self.started(spec);

        if *signal.borrow_and_update() {
            return self.satisfied(spec, start, 0);
        }

        let token = self.cancellation.as_ref();
        let waited =
            tokio::time::timeout(spec.timeout, run_or_cancel(token, signal.wait_for(|fired| *fired)))
                .await;

        match waited {
            Ok(Ok(Ok(_))) => self.satisfied(spec, start, 0),
            Ok(Ok(Err(_))) => Err(self.signal_closed(spec, start)),
            Ok(Err(_)) => Err(self.cancelled(spec, start)),
            Err(_) => Err(self.timed_out(spec, start, 0)),
        }
    }

    /// [`Self::wait_until`], relabelling a timeout with `error_message`.
    pub async fn wait_with_message<F>(
        &self,
        spec: &WaitSpec,
        error_message: impl Into<String>,
        condition: F,
    ) -> WaitResult<()>
    where
        F: FnMut() -> bool,
    {
        match self.wait_until(spec, condition).await {
            Err(err) if err.is_timeout() => {
                Err(WaitError::Failed { message: error_message.into(), source: Box::new(err) })
            }
            other => other,
        }
    }

    /// Shared loop: sample, judge, sleep.
    async fn poll<F, Fut, T, E, P>(
        &self,
        spec: &WaitSpec,
        mut sample: F,
        mut judge: P,
    ) -> WaitResult<()>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Error + 'static,
        P: FnMut(T) -> bool,
    {
        let token = self.cancellation.as_ref();
        let start = Instant::now();
        let deadline = start.checked_add(spec.timeout);
        let interval = spec.poll_interval.max(MIN_POLL_INTERVAL);
        let mut polls = 0u32;
        self.started(spec);

        loop {
            polls += 1;
            let Some(sampled) = within(deadline, run_or_cancel(token, sample())).await else {
                return Err(self.timed_out(spec, start, polls));
            };
            let held = match sampled {
                Err(_) => return Err(self.cancelled(spec, start)),
                Ok(Ok(value)) => judge(value),
                Ok(Err(err)) if is_cancellation(&err) => return Err(self.cancelled(spec, start)),
                Ok(Err(err)) => {
                    self.observer.on_wait_event(&WaitEvent::ConditionError {
                        description: &spec.description,
                        poll: polls,
                        error: &err,
                    });
                    false
                }
            };

            if held {
                return self.satisfied(spec, start, polls);
            }

            let pause = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return Err(self.timed_out(spec, start, polls));
                    }
                    interval.min(deadline - now)
                }
                None => interval,
            };

            if sleep_or_cancel(token, pause).await.is_err() {
                return Err(self.cancelled(spec, start));
            }
        }
    }

    fn started(&self, spec: &WaitSpec) {
        self.observer.on_wait_event(&WaitEvent::Started {
            description: &spec.description,
            timeout: spec.timeout,
            poll_interval: spec.poll_interval,
        });
    }

    fn satisfied(&self, spec: &WaitSpec, start: Instant, polls: u32) -> WaitResult<()> {
        self.observer.on_wait_event(&WaitEvent::Satisfied {
            description: &spec.description,
            elapsed: start.elapsed(),
            polls,
        });
        Ok(())
    }

    fn timed_out(&self, spec: &WaitSpec, start: Instant, polls: u32) -> WaitError {
        let elapsed = start.elapsed();
        self.observer.on_wait_event(&WaitEvent::TimedOut {
            description: &spec.description,
            elapsed,
            polls,
        });
        WaitError::Timeout { description: spec.description.clone(), timeout: spec.timeout, elapsed, polls }
    }

    fn signal_closed(&self, spec: &WaitSpec, start: Instant) -> WaitError {
        self.observer.on_wait_event(&WaitEvent::SignalClosed {
            description: &spec.description,
            elapsed: start.elapsed(),
        });
        WaitError::SignalClosed { description: spec.description.clone() }
    }

    fn cancelled(&self, spec: &WaitSpec, start: Instant) -> WaitError {
        let elapsed = start.elapsed();
        self.observer.on_wait_event(&WaitEvent::Cancelled { description: &spec.description, elapsed });
        WaitError::Cancelled { description: spec.description.clone(), elapsed }
    }
}

/// Drive `fut` until `deadline`; `None` once the deadline passes first.
///
/// The future is polled before the deadline is checked, so a ready
/// condition still counts on a zero timeout.
async fn within<F: Future>(deadline: Option<Instant>, fut: F) -> Option<F::Output> {
    match deadline {
        Some(deadline) => tokio::time::timeout_at(deadline, fut).await.ok(),
        None => Some(fut.await),
    }
}

/// Wait for `condition` with the default observer.
pub async fn wait_until<F>(spec: &WaitSpec, condition: F) -> WaitResult<()>
where
    F: FnMut() -> bool,
{
    Poller::new().wait_until(spec, condition).await
}
