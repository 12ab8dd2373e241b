//! Configuration loading
//!
//! Layers a config file (or the built-in defaults) under environment
//! overrides and validates the result.

pub mod loader;

pub use loader::{apply_env_overrides, load, load_from_file, probe_config_paths};
