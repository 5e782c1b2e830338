//! Default values for retry policies.

use std::time::Duration;

/// Attempts made when no budget is configured
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Delay before the first retry
pub const DEFAULT_INITIAL_DELAY: Duration = Duration::from_millis(1000);

/// Exponential growth factor (1.0 keeps the delay fixed)
pub const DEFAULT_BACKOFF_MULTIPLIER: f64 = 2.0;

/// Upper bound for any computed delay
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_millis(30_000);

/// Upper bound of the additive jitter used by the jittered preset
pub const DEFAULT_JITTER_MAX: Duration = Duration::from_millis(500);
