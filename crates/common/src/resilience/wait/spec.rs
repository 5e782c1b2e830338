//! Polling configuration.

use std::time::Duration;

use crate::resilience::wait::constants::{
    DEFAULT_DESCRIPTION, DEFAULT_POLL_INTERVAL, DEFAULT_STABLE_INTERVAL, DEFAULT_TIMEOUT,
};
use crate::resilience::{ConfigError, ConfigResult};

/// Immutable description of a single wait.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaitSpec {
    /// Deadline measured from the first evaluation
    pub timeout: Duration,
    /// Sleep between evaluations
    pub poll_interval: Duration,
    /// Label used in events and errors
    pub description: String,
}

impl Default for WaitSpec {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
            description: DEFAULT_DESCRIPTION.to_string(),
        }
    }
}

impl WaitSpec {
    /// Default timeout and interval with the given label
    pub fn new(description: impl Into<String>) -> Self {
        Self { description: description.into(), ..Self::default() }
    }

    pub fn builder() -> WaitSpecBuilder {
        WaitSpecBuilder::new()
    }

    /// Spec sampling every 100ms, as used for position and animation checks
    pub fn stability(description: impl Into<String>, timeout: Duration) -> Self {
        Self { timeout, poll_interval: DEFAULT_STABLE_INTERVAL, description: description.into() }
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.poll_interval.is_zero() {
            return Err(ConfigError::Invalid {
                message: "poll_interval must be greater than 0".to_string(),
            });
        }
        Ok(())
    }
}

/// Fluent builder for [`WaitSpec`]. Setters may be called in any order.
#[derive(Debug, Default)]
pub struct WaitSpecBuilder {
    spec: WaitSpec,
}

impl WaitSpecBuilder {
    pub fn new() -> Self {
        Self { spec: WaitSpec::default() }
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.spec.timeout = timeout;
        self
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.spec.poll_interval = interval;
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.spec.description = description.into();
        self
    }

    pub fn build(self) -> ConfigResult<WaitSpec> {
        self.spec.validate()?;
        Ok(self.spec)
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for resilience::wait::spec.
    use super::*;

    /// Validates defaults and builder validation.
    ///
    /// Assertions:
    /// - Confirms 30s timeout and 500ms poll interval by default.
    /// - Rejects a zero poll interval.
    /// - Accepts a zero timeout.
    #[test]
    fn test_defaults_and_validation() {
        let spec = WaitSpec::new("reply visible");
        assert_eq!(spec.timeout, Duration::from_secs(30));
        assert_eq!(spec.poll_interval, Duration::from_millis(500));
        assert_eq!(spec.description, "reply visible");

        assert!(WaitSpec::builder().poll_interval(Duration::ZERO).build().is_err());
        assert!(WaitSpec::builder().timeout(Duration::ZERO).build().is_ok());
    }

    /// Validates builder setters are order-independent.
    #[test]
    fn test_builder_order_independent() {
        let a = WaitSpec::builder()
            .timeout(Duration::from_secs(2))
            .poll_interval(Duration::from_millis(50))
            .description("count")
            .build()
            .expect("valid spec");
        let b = WaitSpec::builder()
            .description("count")
            .poll_interval(Duration::from_millis(50))
            .timeout(Duration::from_secs(2))
            .build()
            .expect("valid spec");
        assert_eq!(a, b);
    }

    /// Validates the stability preset samples every 100ms.
    #[test]
    fn test_stability_spec() {
        let spec = WaitSpec::stability("bubble settled", Duration::from_secs(2));
        assert_eq!(spec.poll_interval, Duration::from_millis(100));
        assert_eq!(spec.timeout, Duration::from_secs(2));
    }
}
