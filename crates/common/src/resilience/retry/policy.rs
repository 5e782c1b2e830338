//! Retry policy configuration.
//!
//! A [`RetryPolicy`] is an immutable value describing how many times an
//! operation is attempted, how the delay between attempts grows, which
//! failures are worth retrying, and which hooks fire along the way. Policies
//! are built per call with [`RetryPolicyBuilder`] or one of the presets in
//! [`super::presets`].

use std::error::Error;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;

use crate::resilience::retry::constants::{
    DEFAULT_BACKOFF_MULTIPLIER, DEFAULT_INITIAL_DELAY, DEFAULT_MAX_ATTEMPTS, DEFAULT_MAX_DELAY,
};
use crate::resilience::retry::outcome::AttemptOutcome;
use crate::resilience::{ConfigError, ConfigResult};

/// How the delay between attempts grows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BackoffStrategy {
    /// `initial_delay * multiplier^(retry - 1)`; a multiplier of 1.0 keeps
    /// the delay fixed
    Exponential { multiplier: f64 },
    /// `initial_delay + increment * (retry - 1)`
    Linear { increment: Duration },
}

impl Default for BackoffStrategy {
    fn default() -> Self {
        Self::Exponential { multiplier: DEFAULT_BACKOFF_MULTIPLIER }
    }
}

/// Randomisation added on top of the computed delay.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Jitter {
    /// Sleep exactly the computed delay
    #[default]
    None,
    /// Add a uniformly random `0..=max` to each delay
    Additive { max: Duration },
}

impl Jitter {
    /// Apply jitter to a computed delay
    pub fn apply(&self, delay: Duration) -> Duration {
        match self {
            Jitter::None => delay,
            Jitter::Additive { max } if max.is_zero() => delay,
            Jitter::Additive { max } => {
                let extra_ms = rand::thread_rng().gen_range(0..=max.as_millis() as u64);
                delay.saturating_add(Duration::from_millis(extra_ms))
            }
        }
    }
}

/// Classification function used by [`FailureKind`].
pub type FailureMatcher = fn(&(dyn Error + 'static)) -> bool;

/// A named matcher over failures.
///
/// Kinds compare by name.
#[derive(Clone, Copy)]
pub struct FailureKind {
    name: &'static str,
    matcher: FailureMatcher,
}

impl FailureKind {
    /// Wrap an arbitrary classification function
    pub const fn new(name: &'static str, matcher: FailureMatcher) -> Self {
        Self { name, matcher }
    }

    /// Matches when the failure, or any error in its `source()` chain, is a `T`
    pub fn of<T: Error + 'static>() -> Self {
        Self { name: std::any::type_name::<T>(), matcher: chain_contains::<T> }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Whether `error` belongs to this kind
    pub fn matches(&self, error: &(dyn Error + 'static)) -> bool {
        (self.matcher)(error)
    }
}

impl fmt::Debug for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("FailureKind").field(&self.name).finish()
    }
}

impl PartialEq for FailureKind {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

fn chain_contains<T: Error + 'static>(error: &(dyn Error + 'static)) -> bool {
    let mut current = Some(error);
    while let Some(err) = current {
        if err.is::<T>() {
            return true;
        }
        current = err.source();
    }
    false
}

/// Predicate deciding whether a failure should be retried.
pub type RetryPredicate = Arc<dyn Fn(&(dyn Error + 'static)) -> bool + Send + Sync>;

/// Which failures are retryable.
///
/// `Always` is the absent set and retries every failure. `Kinds` with an
/// empty list retries nothing.
#[derive(Clone, Default)]
pub enum RetryCondition {
    #[default]
    Always,
    Kinds(Vec<FailureKind>),
    Custom(RetryPredicate),
}

impl RetryCondition {
    /// Build a condition from an arbitrary predicate
    pub fn custom<F>(predicate: F) -> Self
    where
        F: Fn(&(dyn Error + 'static)) -> bool + Send + Sync + 'static,
    {
        Self::Custom(Arc::new(predicate))
    }

    /// Whether `error` should be retried
    pub fn allows(&self, error: &(dyn Error + 'static)) -> bool {
        match self {
            Self::Always => true,
            Self::Kinds(kinds) => kinds.iter().any(|kind| kind.matches(error)),
            Self::Custom(predicate) => predicate(error),
        }
    }
}

impl fmt::Debug for RetryCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Always => f.write_str("Always"),
            Self::Kinds(kinds) => f.debug_tuple("Kinds").field(kinds).finish(),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl PartialEq for RetryCondition {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Always, Self::Always) => true,
            (Self::Kinds(a), Self::Kinds(b)) => a == b,
            (Self::Custom(a), Self::Custom(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// Callback invoked with the outcome that triggered it.
#[derive(Clone)]
pub struct RetryHook(Arc<dyn Fn(&AttemptOutcome<'_>) + Send + Sync>);

impl RetryHook {
    pub fn new<F>(hook: F) -> Self
    where
        F: Fn(&AttemptOutcome<'_>) + Send + Sync + 'static,
    {
        Self(Arc::new(hook))
    }

    pub fn call(&self, outcome: &AttemptOutcome<'_>) {
        (self.0)(outcome)
    }
}

impl fmt::Debug for RetryHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RetryHook(..)")
    }
}

impl PartialEq for RetryHook {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// Immutable retry configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Attempt budget, ignored when `time_budget` is set
    pub max_attempts: u32,
    /// Delay before the first retry
    pub initial_delay: Duration,
    pub backoff: BackoffStrategy,
    /// Cap applied to every computed delay
    pub max_delay: Duration,
    pub jitter: Jitter,
    /// Total time budget; switches the loop to time-bounded mode
    pub time_budget: Option<Duration>,
    pub retry_on: RetryCondition,
    /// Invoked after a retryable failure, before sleeping
    pub on_retry: Option<RetryHook>,
    /// Invoked once when the attempt or time budget is spent
    pub on_exhausted: Option<RetryHook>,
    /// Emit per-attempt observer events
    pub log_attempts: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            initial_delay: DEFAULT_INITIAL_DELAY,
            backoff: BackoffStrategy::default(),
            max_delay: DEFAULT_MAX_DELAY,
            jitter: Jitter::None,
            time_budget: None,
            retry_on: RetryCondition::Always,
            on_retry: None,
            on_exhausted: None,
            log_attempts: true,
        }
    }
}

impl RetryPolicy {
    /// Create a policy builder starting from the defaults
    pub fn builder() -> RetryPolicyBuilder {
        RetryPolicyBuilder::new()
    }

    /// Validate the policy invariants
    pub fn validate(&self) -> ConfigResult<()> {
        if self.max_attempts == 0 {
            return Err(ConfigError::Invalid {
                message: "max_attempts must be greater than 0".to_string(),
            });
        }

        if let BackoffStrategy::Exponential { multiplier } = self.backoff {
            if !multiplier.is_finite() || multiplier < 1.0 {
                return Err(ConfigError::Invalid {
                    message: format!("backoff multiplier must be finite and >= 1.0, got {multiplier}"),
                });
            }
        }

        if self.max_delay < self.initial_delay {
            return Err(ConfigError::Invalid {
                message: format!(
                    "max_delay ({:?}) must be >= initial_delay ({:?})",
                    self.max_delay, self.initial_delay
                ),
            });
        }

        Ok(())
    }

    /// Delay before attempt `retry + 1`, without jitter.
    ///
    /// `retry` is 1-based: `delay_for_retry(1)` is the sleep after the first
    /// failure.
    pub fn delay_for_retry(&self, retry: u32) -> Duration {
        let step = retry.saturating_sub(1);
        let delay = match self.backoff {
            BackoffStrategy::Exponential { multiplier } => {
                let exponent = i32::try_from(step).unwrap_or(i32::MAX);
                let nanos = self.initial_delay.as_nanos() as f64 * multiplier.powi(exponent);
                if !nanos.is_finite() || nanos >= self.max_delay.as_nanos() as f64 {
                    return self.max_delay;
                }
                duration_from_nanos(nanos as u128).unwrap_or(self.max_delay)
            }
            BackoffStrategy::Linear { increment } => {
                self.initial_delay.saturating_add(increment.saturating_mul(step))
            }
        };
        delay.min(self.max_delay)
    }

    /// Delay before attempt `retry + 1`, with jitter applied.
    pub fn jittered_delay(&self, retry: u32) -> Duration {
        self.jitter.apply(self.delay_for_retry(retry))
    }

    /// Whether the loop is bounded by time rather than attempts
    pub fn is_time_bounded(&self) -> bool {
        self.time_budget.is_some()
    }
}

/// Whole-nanosecond count as a `Duration`, `None` past `Duration::MAX`
fn duration_from_nanos(nanos: u128) -> Option<Duration> {
    const NANOS_PER_SEC: u128 = 1_000_000_000;
    let secs = u64::try_from(nanos / NANOS_PER_SEC).ok()?;
    let subsec = u32::try_from(nanos % NANOS_PER_SEC).ok()?;
    Some(Duration::new(secs, subsec))
}

/// Fluent builder for [`RetryPolicy`]. Setters may be called in any order.
#[derive(Debug, Default)]
pub struct RetryPolicyBuilder {
    policy: RetryPolicy,
}

impl RetryPolicyBuilder {
    pub fn new() -> Self {
        Self { policy: RetryPolicy::default() }
    }

    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.policy.max_attempts = attempts;
        self
    }

    pub fn initial_delay(mut self, delay: Duration) -> Self {
        self.policy.initial_delay = delay;
        self
    }

    /// Use exponential growth with the given multiplier
    pub fn backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.policy.backoff = BackoffStrategy::Exponential { multiplier };
        self
    }

    /// Use linear growth with the given increment
    pub fn linear_increment(mut self, increment: Duration) -> Self {
        self.policy.backoff = BackoffStrategy::Linear { increment };
        self
    }

    pub fn backoff(mut self, backoff: BackoffStrategy) -> Self {
        self.policy.backoff = backoff;
        self
    }

    pub fn max_delay(mut self, delay: Duration) -> Self {
        self.policy.max_delay = delay;
        self
    }

    pub fn jitter(mut self, jitter: Jitter) -> Self {
        self.policy.jitter = jitter;
        self
    }

    /// Bound the sequence by total time instead of attempts
    pub fn time_budget(mut self, total: Duration) -> Self {
        self.policy.time_budget = Some(total);
        self
    }

    /// Retry only failures matching one of `kinds`; an empty list retries
    /// nothing
    pub fn retry_on(mut self, kinds: impl IntoIterator<Item = FailureKind>) -> Self {
        self.policy.retry_on = RetryCondition::Kinds(kinds.into_iter().collect());
        self
    }

    pub fn retry_if<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&(dyn Error + 'static)) -> bool + Send + Sync + 'static,
    {
        self.policy.retry_on = RetryCondition::custom(predicate);
        self
    }

    pub fn retry_condition(mut self, condition: RetryCondition) -> Self {
        self.policy.retry_on = condition;
        self
    }

    pub fn on_retry(mut self, hook: RetryHook) -> Self {
        self.policy.on_retry = Some(hook);
        self
    }

    pub fn on_exhausted(mut self, hook: RetryHook) -> Self {
        self.policy.on_exhausted = Some(hook);
        self
    }

    pub fn log_attempts(mut self, enabled: bool) -> Self {
        self.policy.log_attempts = enabled;
        self
    }

    pub fn build(self) -> ConfigResult<RetryPolicy> {
        self.policy.validate()?;
        Ok(self.policy)
    }
}
