//! # EliteA Domain
//!
//! Harness configuration types for the EliteA end-to-end suite.
//!
//! This crate contains:
//! - Configuration structures (`Config`, `WaitSettings`, `RetrySettings`)
//! - Domain error types and Result definitions
//! - Default values shared by the loader and the settings structs
//!
//! ## Architecture
//! - No dependencies on other EliteA crates
//! - Only external dependencies allowed
//! - Plain data; turning settings into retry policies happens in
//!   `elitea-infra`

pub mod config;
pub mod constants;
pub mod errors;
pub mod serde_helpers;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
