//! # EliteA Infrastructure
//!
//! The impure edge of the harness: reading config files and the
//! environment, installing the global `tracing` subscriber, and turning
//! loaded settings into `elitea-common` retry policies and wait specs.
//!
//! ## Architecture
//! - Depends on `elitea-domain` for the settings types
//! - Depends on `elitea-common` for `RetryPolicy` and `WaitSpec`
//! - Test code calls [`config::load`] and [`logging::init`] once per run

pub mod config;
pub mod defaults;
pub mod logging;

// Re-export commonly used items
pub use config::load;
pub use defaults::{retry_policy, stability_spec, wait_spec};
