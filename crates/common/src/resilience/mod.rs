//! Wait and retry primitives for end-to-end tests.
//!
//! Two loops live here, both consuming closures and futures only:
//! - [`retry`]: re-run a fallible operation under a [`RetryPolicy`] with
//!   exponential or linear backoff, a retryable-failure filter, and an
//!   attempt or time budget.
//! - [`wait`]: poll a condition under a [`WaitSpec`] until it holds or the
//!   deadline passes.
//!
//! Both report progress through an injected [`Observer`] and honour an
//! optional [`tokio_util::sync::CancellationToken`].

pub mod cancel;
pub mod observer;
pub mod retry;
pub mod wait;

use thiserror::Error;

/// Configuration validation error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {message}")]
    Invalid { message: String },
}

pub type ConfigResult<T> = Result<T, ConfigError>;

pub use cancel::{is_cancellation, Cancelled};
pub use observer::{NoopObserver, Observer, RetryEvent, SharedObserver, TracingObserver, WaitEvent};
pub use retry::{
    retry, retry_void, AttemptOutcome, BackoffStrategy, FailureKind, Jitter, Retrier,
    RetryCondition, RetryError, RetryHook, RetryOutcome, RetryPolicy, RetryPolicyBuilder,
    RetryResult,
};
pub use wait::{
    wait_until, ActivityGuard, ActivityMonitor, Poller, WaitError, WaitResult, WaitSpec,
    WaitSpecBuilder,
};
