//! Polling waits.
//!
//! [`Poller`] evaluates a caller-supplied condition on a fixed interval until
//! it holds or the [`WaitSpec`] timeout passes. Condition forms cover plain
//! and async predicates, fallible probes, absence, value and count equality,
//! stability, quiet periods on an [`ActivityMonitor`], and event signals.

pub mod activity;
pub mod constants;
pub mod error;
pub mod poller;
pub mod spec;

pub use activity::{ActivityGuard, ActivityMonitor};
pub use error::{WaitError, WaitResult};
pub use poller::{wait_until, Poller};
pub use spec::{WaitSpec, WaitSpecBuilder};
