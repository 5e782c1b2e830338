//! Wait and retry foundation for the EliteA end-to-end test suite.
//!
//! The browser layer hands closures and futures to the loops in
//! [`resilience`]; nothing here knows about pages or selectors.
//!
//! # Feature Tiers
//!
//! Enable cargo features to opt into the tiers you need:
//! - `foundation`: sequence counters and shared error types
//! - `observability`: `tracing` support (pulled in by `runtime`)
//! - `runtime`: the async retry and polling loops (tokio)
//! - `test-utils`: recording observer, scripted operations, assertion macros

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

// Foundation tier
// -----------------------------------------------------------------
#[cfg(feature = "foundation")]
pub mod sequence;

// Runtime tier
// --------------------------------------------------------------------
#[cfg(feature = "runtime")]
pub mod resilience;

// Testing utilities
// ---------------------------------------------------------------
#[cfg(all(feature = "runtime", any(feature = "test-utils", test)))]
pub mod testing;

// Re-export commonly used types for convenience
// ------------------------
#[cfg(feature = "runtime")]
pub use resilience::{
    retry, retry_void, wait_until, ActivityMonitor, BackoffStrategy, Cancelled, ConfigError,
    ConfigResult, FailureKind, Jitter, Observer, Poller, Retrier, RetryCondition, RetryError,
    RetryHook, RetryPolicy, RetryResult, SharedObserver, TracingObserver, WaitError, WaitResult,
    WaitSpec,
};
#[cfg(feature = "foundation")]
pub use sequence::{next_conversation_id, next_message_id, SequenceGenerator};
