//! Harness constants
//!
//! Defaults for the settings structs. They mirror the values built into
//! `elitea-common` so a config file that omits a section behaves exactly
//! like code that never touched the config.

// Wait defaults
pub const DEFAULT_WAIT_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 500;
pub const DEFAULT_STABLE_CHECKS: u32 = 3;
pub const DEFAULT_STABLE_INTERVAL_MS: u64 = 100;
pub const DEFAULT_QUIET_PERIOD_MS: u64 = 1_000;

// Retry defaults
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_INITIAL_DELAY_MS: u64 = 1_000;
pub const DEFAULT_BACKOFF_MULTIPLIER: f64 = 2.0;
pub const DEFAULT_MAX_DELAY_MS: u64 = 30_000;
/// Zero disables jitter
pub const DEFAULT_JITTER_MAX_MS: u64 = 0;

// Logging defaults
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Config file names probed by the loader, in priority order
pub const CONFIG_FILE_NAMES: [&str; 4] =
    ["elitea.toml", "elitea.json", "config.toml", "config.json"];

/// Prefix for environment overrides
pub const ENV_PREFIX: &str = "ELITEA_";
