//! Testing utilities for code built on the wait and retry loops
//!
//! - **[`assertions`]**: assertion macros (`assert_error_contains!`,
//!   `assert_elapsed!`)
//! - **[`flaky`]**: scripted operations and time-flipping conditions
//! - **[`recorder`]**: an [`Observer`](crate::resilience::Observer) that
//!   captures events
//!
//! Timing helpers use `tokio::time::Instant`, so they pair with
//! `#[tokio::test(start_paused = true)]`.

pub mod assertions;
pub mod flaky;
pub mod recorder;

pub use flaky::{FlakyError, FlakyOperation, FlipAfter};
pub use recorder::{RecordedEvent, RecordingObserver};
