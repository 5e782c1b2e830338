//! Ready-made retry policies for common test-suite situations.

use std::time::Duration;

use crate::resilience::retry::constants::{DEFAULT_JITTER_MAX, DEFAULT_MAX_DELAY};
use crate::resilience::retry::policy::{
    BackoffStrategy, FailureKind, Jitter, RetryCondition, RetryPolicy,
};

impl RetryPolicy {
    /// Same delay between every attempt
    pub fn fixed(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            initial_delay: delay,
            backoff: BackoffStrategy::Exponential { multiplier: 1.0 },
            max_delay: delay.max(DEFAULT_MAX_DELAY),
            ..Self::default()
        }
    }

    /// Delay starts at `increment` and grows by `increment` per retry
    pub fn linear(max_attempts: u32, increment: Duration) -> Self {
        Self {
            max_attempts,
            initial_delay: increment,
            backoff: BackoffStrategy::Linear { increment },
            max_delay: increment.max(DEFAULT_MAX_DELAY),
            ..Self::default()
        }
    }

    /// Default exponential schedule plus 0..=500ms of additive jitter
    pub fn jittered(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            jitter: Jitter::Additive { max: DEFAULT_JITTER_MAX },
            ..Self::default()
        }
    }

    /// Default schedule, retrying only failures of the listed kinds
    pub fn retry_on(kinds: impl IntoIterator<Item = FailureKind>) -> Self {
        Self { retry_on: RetryCondition::Kinds(kinds.into_iter().collect()), ..Self::default() }
    }

    /// Retry back-to-back without sleeping
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            initial_delay: Duration::ZERO,
            backoff: BackoffStrategy::Exponential { multiplier: 1.0 },
            ..Self::default()
        }
    }

    /// Keep retrying with the default schedule until `total` has elapsed
    pub fn time_bounded(total: Duration) -> Self {
        Self { time_budget: Some(total), ..Self::default() }
    }

    /// 1s doubling schedule with the given attempt budget
    pub fn exponential(max_attempts: u32) -> Self {
        Self { max_attempts, ..Self::default() }
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for resilience::retry::presets.
    use super::*;

    /// Validates every preset passes validation.
    #[test]
    fn test_presets_are_valid() {
        let presets = [
            RetryPolicy::fixed(3, Duration::from_millis(100)),
            RetryPolicy::fixed(3, Duration::from_secs(60)),
            RetryPolicy::linear(4, Duration::from_millis(200)),
            RetryPolicy::jittered(3),
            RetryPolicy::retry_on([FailureKind::of::<std::io::Error>()]),
            RetryPolicy::immediate(5),
            RetryPolicy::time_bounded(Duration::from_secs(10)),
            RetryPolicy::exponential(4),
        ];
        for policy in &presets {
            assert!(policy.validate().is_ok(), "{policy:?}");
        }
    }

    /// Validates preset delay schedules.
    ///
    /// Assertions:
    /// - Fixed keeps the same delay.
    /// - Linear starts at the increment and grows by it.
    /// - Immediate never sleeps.
    /// - Exponential doubles from 1s.
    #[test]
    fn test_preset_schedules() {
        let fixed = RetryPolicy::fixed(3, Duration::from_millis(100));
        assert_eq!(fixed.delay_for_retry(1), Duration::from_millis(100));
        assert_eq!(fixed.delay_for_retry(2), Duration::from_millis(100));

        let linear = RetryPolicy::linear(4, Duration::from_millis(200));
        assert_eq!(linear.delay_for_retry(1), Duration::from_millis(200));
        assert_eq!(linear.delay_for_retry(2), Duration::from_millis(400));
        assert_eq!(linear.delay_for_retry(3), Duration::from_millis(600));

        let immediate = RetryPolicy::immediate(5);
        assert_eq!(immediate.delay_for_retry(4), Duration::ZERO);

        let exponential = RetryPolicy::exponential(4);
        assert_eq!(exponential.delay_for_retry(1), Duration::from_secs(1));
        assert_eq!(exponential.delay_for_retry(3), Duration::from_secs(4));
    }

    /// Validates preset-specific fields.
    #[test]
    fn test_preset_fields() {
        assert_eq!(
            RetryPolicy::jittered(3).jitter,
            Jitter::Additive { max: Duration::from_millis(500) }
        );
        assert!(RetryPolicy::time_bounded(Duration::from_secs(5)).is_time_bounded());
        assert_eq!(
            RetryPolicy::retry_on(Vec::new()).retry_on,
            RetryCondition::Kinds(Vec::new())
        );
    }
}
