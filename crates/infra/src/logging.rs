//! Logging setup for test runs
//!
//! Library code only emits `tracing` events. Test binaries call [`init`]
//! once with the loaded [`LoggingConfig`] to see retry and wait activity.

use std::sync::{Mutex, Once, PoisonError};

use elitea_domain::{HarnessError, LoggingConfig, Result};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static INIT: Once = Once::new();
static INIT_ERROR: Mutex<Option<HarnessError>> = Mutex::new(None);

/// Install the global subscriber
///
/// `RUST_LOG` takes precedence over `config.level` when set. Safe to call
/// from every test; only the first call installs anything, later calls
/// report the first call's outcome.
///
/// # Errors
/// Returns `HarnessError::Config` if the filter directive does not parse or
/// another global subscriber is already installed.
pub fn init(config: &LoggingConfig) -> Result<()> {
    INIT.call_once(|| {
        if let Err(err) = install(config) {
            *INIT_ERROR.lock().unwrap_or_else(PoisonError::into_inner) = Some(err);
        }
    });

    match INIT_ERROR.lock().unwrap_or_else(PoisonError::into_inner).as_ref() {
        Some(err) => Err(err.clone()),
        None => Ok(()),
    }
}

fn install(config: &LoggingConfig) -> Result<()> {
    let filter = build_filter(&config.level)?;
    let registry = tracing_subscriber::registry().with(filter);

    let installed = if config.json {
        registry.with(fmt::layer().json().with_current_span(true)).try_init()
    } else {
        registry.with(fmt::layer().compact().with_target(true)).try_init()
    };

    installed.map_err(|e| HarnessError::Config(format!("Failed to install subscriber: {e}")))
}

/// Filter from `RUST_LOG` if set and non-empty, otherwise from `level`
pub fn build_filter(level: &str) -> Result<EnvFilter> {
    match std::env::var(EnvFilter::DEFAULT_ENV) {
        Ok(directives) if !directives.trim().is_empty() => EnvFilter::try_new(&directives)
            .map_err(|e| HarnessError::Config(format!("Invalid RUST_LOG {directives:?}: {e}"))),
        _ => EnvFilter::try_new(level)
            .map_err(|e| HarnessError::Config(format!("Invalid log level {level:?}: {e}"))),
    }
}
