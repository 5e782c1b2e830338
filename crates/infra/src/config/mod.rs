//! Configuration loading
//!
//! Loads harness settings from an optional config file and `ELITEA_*`
//! environment variables.

pub mod loader;

// Re-export commonly used items
pub use loader::{
    apply_env_overrides, apply_overrides, load, load_from_file, probe_config_paths, probe_from,
};
