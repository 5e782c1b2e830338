//! Configuration loader
//!
//! Loads harness configuration from a file and the environment.
//!
//! ## Loading Strategy
//! 1. Reads a `.env` file if one exists (existing variables win)
//! 2. Uses `ELITEA_CONFIG` as the config file path when set
//! 3. Otherwise probes the standard locations; no file means defaults
//! 4. Applies `ELITEA_*` overrides on top of whatever was loaded
//! 5. Validates the result
//!
//! ## Environment Variables
//! - `ELITEA_CONFIG`: Explicit config file path
//! - `ELITEA_WAIT_TIMEOUT_MS`: Default wait timeout
//! - `ELITEA_WAIT_POLL_INTERVAL_MS`: Default poll interval
//! - `ELITEA_WAIT_STABLE_CHECKS`: Identical samples a stability wait needs
//! - `ELITEA_WAIT_STABLE_INTERVAL_MS`: Sampling interval for stability waits
//! - `ELITEA_WAIT_QUIET_PERIOD_MS`: Idle period for network quiet waits
//! - `ELITEA_RETRY_MAX_ATTEMPTS`: Attempts per retried operation
//! - `ELITEA_RETRY_INITIAL_DELAY_MS`: Delay after the first failure
//! - `ELITEA_RETRY_BACKOFF_MULTIPLIER`: Exponential growth factor
//! - `ELITEA_RETRY_MAX_DELAY_MS`: Cap on a single delay
//! - `ELITEA_RETRY_JITTER_MAX_MS`: Random extra delay bound (0 disables)
//! - `ELITEA_RETRY_TIME_BUDGET_MS`: Total time budget per operation
//! - `ELITEA_LOG_LEVEL`: `EnvFilter` directive
//! - `ELITEA_LOG_JSON`: JSON log lines (true/false)
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `elitea.toml`, `elitea.json`, `config.toml`, `config.json` in the
//!    current working directory
//! 2. The same names in the parent and grandparent directories
//! 3. The same names next to the executable

use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use elitea_domain::constants::{CONFIG_FILE_NAMES, ENV_PREFIX};
use elitea_domain::{Config, HarnessError, Result};

/// Parent directory levels searched above the starting directory
const PARENT_LEVELS: usize = 2;

/// Load configuration from file and environment
///
/// # Errors
/// Returns `HarnessError::Config` if an explicit or probed file cannot be
/// parsed or an override is malformed, and `HarnessError::InvalidInput` if
/// the final configuration fails validation.
pub fn load() -> Result<Config> {
    if let Ok(path) = dotenvy::dotenv() {
        tracing::debug!(path = %path.display(), "Loaded .env file");
    }

    let explicit = std::env::var(format!("{ENV_PREFIX}CONFIG")).ok().map(PathBuf::from);
    let mut config = match explicit {
        Some(path) => load_from_file(Some(path))?,
        None => match probe_config_paths() {
            Some(path) => load_from_file(Some(path))?,
            None => {
                tracing::debug!("No config file found, using defaults");
                Config::default()
            }
        },
    };

    apply_env_overrides(&mut config)?;
    config.validate()?;

    tracing::info!(
        wait_timeout_ms = duration_ms(config.wait.timeout),
        poll_interval_ms = duration_ms(config.wait.poll_interval),
        max_attempts = config.retry.max_attempts,
        "Harness configuration loaded"
    );
    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes the standard locations. Supports JSON and
/// TOML (detected by file extension). Missing fields take their defaults.
/// The result is not validated; [`load`] does that after overrides.
///
/// # Errors
/// Returns `HarnessError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(HarnessError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            HarnessError::Config("No config file found in any of the standard locations".into())
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| HarnessError::Io(format!("Failed to read config file: {e}")))?;

    parse_config(&contents, &config_path)
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| HarnessError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| HarnessError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(HarnessError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// Probe the standard locations for a config file
///
/// Searches the working directory and its parents first, then the
/// directory holding the executable.
pub fn probe_config_paths() -> Option<PathBuf> {
    let from_cwd = std::env::current_dir().ok().and_then(|cwd| probe_from(&cwd));
    from_cwd.or_else(|| {
        let exe_path = std::env::current_exe().ok()?;
        probe_from(exe_path.parent()?)
    })
}

/// Probe `start` and up to two parent directories
///
/// Within one directory the names are tried in [`CONFIG_FILE_NAMES`] order;
/// a nearer directory always wins over a farther one.
pub fn probe_from(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .take(PARENT_LEVELS + 1)
        .flat_map(|dir| CONFIG_FILE_NAMES.iter().map(move |name| dir.join(name)))
        .find(|path| path.is_file())
}

/// Apply `ELITEA_*` overrides from the process environment
///
/// # Errors
/// Returns `HarnessError::Config` naming the variable if a value does not
/// parse.
pub fn apply_env_overrides(config: &mut Config) -> Result<()> {
    apply_overrides(config, |key| std::env::var(key).ok())
}

/// Apply overrides from an arbitrary key lookup
///
/// `lookup` receives full variable names (`ELITEA_RETRY_MAX_ATTEMPTS`).
/// Unset keys leave the field untouched.
///
/// # Errors
/// Returns `HarnessError::Config` naming the variable if a value does not
/// parse.
pub fn apply_overrides<F>(config: &mut Config, lookup: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |name: &str| {
        let key = format!("{ENV_PREFIX}{name}");
        lookup(&key).map(|raw| (key, raw))
    };

    if let Some((key, raw)) = get("WAIT_TIMEOUT_MS") {
        config.wait.timeout = parse_millis(&key, &raw)?;
    }
    if let Some((key, raw)) = get("WAIT_POLL_INTERVAL_MS") {
        config.wait.poll_interval = parse_millis(&key, &raw)?;
    }
    if let Some((key, raw)) = get("WAIT_STABLE_CHECKS") {
        config.wait.stable_checks = parse_value(&key, &raw)?;
    }
    if let Some((key, raw)) = get("WAIT_STABLE_INTERVAL_MS") {
        config.wait.stable_interval = parse_millis(&key, &raw)?;
    }
    if let Some((key, raw)) = get("WAIT_QUIET_PERIOD_MS") {
        config.wait.quiet_period = parse_millis(&key, &raw)?;
    }

    if let Some((key, raw)) = get("RETRY_MAX_ATTEMPTS") {
        config.retry.max_attempts = parse_value(&key, &raw)?;
    }
    if let Some((key, raw)) = get("RETRY_INITIAL_DELAY_MS") {
        config.retry.initial_delay = parse_millis(&key, &raw)?;
    }
    if let Some((key, raw)) = get("RETRY_BACKOFF_MULTIPLIER") {
        config.retry.backoff_multiplier = parse_value(&key, &raw)?;
    }
    if let Some((key, raw)) = get("RETRY_MAX_DELAY_MS") {
        config.retry.max_delay = parse_millis(&key, &raw)?;
    }
    if let Some((key, raw)) = get("RETRY_JITTER_MAX_MS") {
        config.retry.jitter_max = parse_millis(&key, &raw)?;
    }
    if let Some((key, raw)) = get("RETRY_TIME_BUDGET_MS") {
        config.retry.time_budget_ms = Some(parse_value(&key, &raw)?);
    }

    if let Some((_, raw)) = get("LOG_LEVEL") {
        config.logging.level = raw;
    }
    if let Some((key, raw)) = get("LOG_JSON") {
        config.logging.json = parse_bool(&key, &raw)?;
    }

    Ok(())
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    raw.trim().parse::<T>().map_err(|e| HarnessError::Config(format!("Invalid {key} ({raw:?}): {e}")))
}

fn parse_millis(key: &str, raw: &str) -> Result<Duration> {
    parse_value::<u64>(key, raw).map(Duration::from_millis)
}

/// Accepts `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
fn parse_bool(key: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(HarnessError::Config(format!("Invalid {key} ({raw:?}): expected a boolean"))),
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
