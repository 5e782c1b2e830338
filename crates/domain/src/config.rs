//! Configuration management
//!
//! Every section and field is optional in a config file; anything missing
//! takes the value from [`Default`].

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_BACKOFF_MULTIPLIER, DEFAULT_INITIAL_DELAY_MS, DEFAULT_JITTER_MAX_MS,
    DEFAULT_LOG_LEVEL, DEFAULT_MAX_ATTEMPTS, DEFAULT_MAX_DELAY_MS, DEFAULT_POLL_INTERVAL_MS,
    DEFAULT_QUIET_PERIOD_MS, DEFAULT_STABLE_CHECKS, DEFAULT_STABLE_INTERVAL_MS,
    DEFAULT_WAIT_TIMEOUT_MS,
};
use crate::errors::{HarnessError, Result};
use crate::serde_helpers::duration_millis;

/// Harness configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub wait: WaitSettings,
    pub retry: RetrySettings,
    pub logging: LoggingConfig,
}

/// Defaults for condition waits
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaitSettings {
    #[serde(with = "duration_millis")]
    pub timeout: Duration,
    #[serde(with = "duration_millis")]
    pub poll_interval: Duration,
    /// Consecutive identical samples a stability wait needs
    pub stable_checks: u32,
    #[serde(with = "duration_millis")]
    pub stable_interval: Duration,
    #[serde(with = "duration_millis")]
    pub quiet_period: Duration,
}

impl Default for WaitSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(DEFAULT_WAIT_TIMEOUT_MS),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            stable_checks: DEFAULT_STABLE_CHECKS,
            stable_interval: Duration::from_millis(DEFAULT_STABLE_INTERVAL_MS),
            quiet_period: Duration::from_millis(DEFAULT_QUIET_PERIOD_MS),
        }
    }
}

/// Defaults for retried operations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub max_attempts: u32,
    #[serde(with = "duration_millis")]
    pub initial_delay: Duration,
    pub backoff_multiplier: f64,
    #[serde(with = "duration_millis")]
    pub max_delay: Duration,
    /// Upper bound of the random delay added to each wait; zero disables it
    #[serde(with = "duration_millis")]
    pub jitter_max: Duration,
    /// Stop retrying once this much time has passed since the first attempt
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_budget_ms: Option<u64>,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            initial_delay: Duration::from_millis(DEFAULT_INITIAL_DELAY_MS),
            backoff_multiplier: DEFAULT_BACKOFF_MULTIPLIER,
            max_delay: Duration::from_millis(DEFAULT_MAX_DELAY_MS),
            jitter_max: Duration::from_millis(DEFAULT_JITTER_MAX_MS),
            time_budget_ms: None,
        }
    }
}

impl RetrySettings {
    pub fn time_budget(&self) -> Option<Duration> {
        self.time_budget_ms.map(Duration::from_millis)
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, e.g. `info` or `elitea_common=debug`
    pub level: String,
    /// Emit JSON lines instead of the compact text format
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: DEFAULT_LOG_LEVEL.to_string(), json: false }
    }
}

impl Config {
    /// Reject settings the retry and wait loops cannot honor.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::InvalidInput`] naming the first offending
    /// field.
    pub fn validate(&self) -> Result<()> {
        let invalid = |message: &str| Err(HarnessError::InvalidInput(message.to_string()));

        if self.retry.max_attempts == 0 {
            return invalid("retry.max_attempts must be at least 1");
        }
        if !self.retry.backoff_multiplier.is_finite() || self.retry.backoff_multiplier < 1.0 {
            return invalid("retry.backoff_multiplier must be a finite value >= 1.0");
        }
        if self.retry.max_delay < self.retry.initial_delay {
            return invalid("retry.max_delay must not be less than retry.initial_delay");
        }
        if self.wait.poll_interval.is_zero() {
            return invalid("wait.poll_interval must be greater than zero");
        }
        if self.wait.stable_checks == 0 {
            return invalid("wait.stable_checks must be at least 1");
        }
        if self.wait.stable_interval.is_zero() {
            return invalid("wait.stable_interval must be greater than zero");
        }
        if self.logging.level.trim().is_empty() {
            return invalid("logging.level must not be empty");
        }
        Ok(())
    }
}
