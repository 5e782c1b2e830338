//! Loaded settings to retry policies and wait specs

use std::time::Duration;

use elitea_common::resilience::{ConfigError, Jitter, RetryPolicy, WaitSpec};
use elitea_domain::{HarnessError, Result, RetrySettings, WaitSettings};

fn invalid(err: ConfigError) -> HarnessError {
    HarnessError::InvalidInput(err.to_string())
}

/// Base retry policy for the run
///
/// The policy retries every failure; narrow it per call site with
/// [`RetryPolicy::builder`] style overrides or the presets.
///
/// # Errors
/// Returns `HarnessError::InvalidInput` if the settings violate the policy
/// invariants.
pub fn retry_policy(settings: &RetrySettings) -> Result<RetryPolicy> {
    let mut builder = RetryPolicy::builder()
        .max_attempts(settings.max_attempts)
        .initial_delay(settings.initial_delay)
        .backoff_multiplier(settings.backoff_multiplier)
        .max_delay(settings.max_delay);

    if !settings.jitter_max.is_zero() {
        builder = builder.jitter(Jitter::Additive { max: settings.jitter_max });
    }
    if let Some(budget) = settings.time_budget() {
        builder = builder.time_budget(budget);
    }

    builder.build().map_err(invalid)
}

/// Wait spec with the run's timeout and poll interval
///
/// # Errors
/// Returns `HarnessError::InvalidInput` for a zero poll interval.
pub fn wait_spec(settings: &WaitSettings, description: impl Into<String>) -> Result<WaitSpec> {
    WaitSpec::builder()
        .timeout(settings.timeout)
        .poll_interval(settings.poll_interval)
        .description(description)
        .build()
        .map_err(invalid)
}

/// Wait spec for stability checks, sampling at the stable interval
///
/// Pair with `settings.stable_checks` when calling
/// `Poller::wait_for_stable`.
///
/// # Errors
/// Returns `HarnessError::InvalidInput` for a zero stable interval.
pub fn stability_spec(settings: &WaitSettings, description: impl Into<String>) -> Result<WaitSpec> {
    WaitSpec::builder()
        .timeout(settings.timeout)
        .poll_interval(settings.stable_interval)
        .description(description)
        .build()
        .map_err(invalid)
}

/// Quiet period for `Poller::wait_for_quiet`
pub fn quiet_period(settings: &WaitSettings) -> Duration {
    settings.quiet_period
}
