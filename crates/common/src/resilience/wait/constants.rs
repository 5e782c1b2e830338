//! Default values for polling waits.

use std::time::Duration;

/// Deadline used when no timeout is configured
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(30_000);

/// Interval between condition checks
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Floor applied to the poll interval so a zero interval cannot spin
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Consecutive unchanged samples required by stability waits
pub const DEFAULT_STABLE_CHECKS: u32 = 3;

/// Sampling interval used by stability waits
pub const DEFAULT_STABLE_INTERVAL: Duration = Duration::from_millis(100);

/// Idle time required by quiet-period waits
pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_millis(1000);

pub(crate) const DEFAULT_DESCRIPTION: &str = "condition";
