//! Retry with configurable backoff.
//!
//! [`Retrier`] repeatedly invokes a fallible async operation until it
//! succeeds, a failure is rejected by the policy's [`RetryCondition`], or the
//! attempt or time budget is spent. Delays grow exponentially or linearly,
//! are capped at `max_delay`, and may carry additive jitter.

pub mod constants;
pub mod error;
pub mod executor;
pub mod outcome;
pub mod policy;
pub mod presets;

pub use error::{RetryError, RetryResult};
pub use executor::{retry, retry_void, Retrier};
pub use outcome::{AttemptOutcome, RetryOutcome};
pub use policy::{
    BackoffStrategy, FailureKind, FailureMatcher, Jitter, RetryCondition, RetryHook,
    RetryPolicy, RetryPolicyBuilder, RetryPredicate,
};
