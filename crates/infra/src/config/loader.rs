//! Configuration loader
//!
//! ## Loading Strategy
//! 1. `STELLAR_CONFIG` names a file explicitly, otherwise the standard
//!    locations are probed; without any file the defaults are used
//! 2. Environment variables override individual fields
//! 3. The merged configuration is validated
//!
//! ## Environment Variables
//! - `STELLAR_API_BASE_URL`: Memory server base URL
//! - `STELLAR_REQUEST_TIMEOUT_MS`: Timeout for API calls
//! - `STELLAR_HEALTH_TIMEOUT_MS`: Timeout for the health probe
//! - `STELLAR_BACKOFF_BASE_MS`: First delay after a 429
//! - `STELLAR_HEALTH_INTERVAL_SECS`: Connectivity probe period
//! - `STELLAR_DATA_DIR`: Directory holding the queue and connectivity files
//! - `STELLAR_MAX_STORE_PER_SEC`: Store requests admitted per window
//! - `STELLAR_MAX_QUEUE_RETRIES`: Failed replays before an entry is dropped
//!
//! ## File Locations
//! The loader probes `stellar.toml` then `stellar.json`, first in the
//! current working directory, then next to the executable.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use stellar_domain::{Config, Result, StellarError};

/// Explicit config file path
pub const CONFIG_PATH_ENV: &str = "STELLAR_CONFIG";

const CONFIG_FILE_NAMES: [&str; 2] = ["stellar.toml", "stellar.json"];

/// Load configuration: file or defaults, then env overrides, then validation
///
/// # Errors
/// Returns `StellarError::Config` if the file named by `STELLAR_CONFIG` is
/// missing, any source is malformed, or the merged values are invalid.
pub fn load() -> Result<Config> {
    let explicit = std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from);
    let mut config = match explicit.or_else(probe_config_paths) {
        Some(path) => load_from_file(Some(path))?,
        None => {
            tracing::debug!("No config file found, using defaults");
            Config::default()
        }
    };

    apply_env_overrides(&mut config)?;
    config.validate()?;

    tracing::info!(
        base_url = %config.api.base_url,
        data_dir = %config.storage.data_dir.display(),
        "Configuration loaded"
    );
    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes the standard locations. Fields absent from
/// the file keep their defaults.
///
/// # Errors
/// Returns `StellarError::Config` if the file does not exist, no file is
/// found while probing, or the contents do not parse.
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(StellarError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            StellarError::Config("No config file found in any of the standard locations".into())
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| StellarError::Config(format!("Failed to read config file: {e}")))?;

    parse_config(&contents, &config_path)
}

/// Format is detected by file extension (`.json` or `.toml`).
fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| StellarError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| StellarError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(StellarError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// First existing config file in the standard locations
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut dirs = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        dirs.push(cwd);
    }
    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            dirs.push(exe_dir.to_path_buf());
        }
    }

    dirs.iter()
        .flat_map(|dir| CONFIG_FILE_NAMES.iter().map(move |name| dir.join(name)))
        .find(|path| path.exists())
}

/// Overwrite fields for every `STELLAR_*` variable that is set
///
/// # Errors
/// Returns `StellarError::Config` when a numeric variable does not parse.
pub fn apply_env_overrides(config: &mut Config) -> Result<()> {
    if let Some(url) = env_string("STELLAR_API_BASE_URL") {
        config.api.base_url = url;
    }
    if let Some(ms) = env_parse("STELLAR_REQUEST_TIMEOUT_MS")? {
        config.api.request_timeout_ms = ms;
    }
    if let Some(ms) = env_parse("STELLAR_HEALTH_TIMEOUT_MS")? {
        config.api.health_timeout_ms = ms;
    }
    if let Some(ms) = env_parse("STELLAR_BACKOFF_BASE_MS")? {
        config.api.backoff_base_ms = ms;
    }
    if let Some(secs) = env_parse("STELLAR_HEALTH_INTERVAL_SECS")? {
        config.sync.health_interval_secs = secs;
    }
    if let Some(dir) = env_string("STELLAR_DATA_DIR") {
        config.storage.data_dir = PathBuf::from(dir);
    }
    if let Some(max) = env_parse("STELLAR_MAX_STORE_PER_SEC")? {
        config.rate_limit.max_store_per_window = max;
    }
    if let Some(retries) = env_parse("STELLAR_MAX_QUEUE_RETRIES")? {
        config.sync.max_queue_retries = retries;
    }
    Ok(())
}

/// Non-empty value of an environment variable
fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

fn env_parse<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    env_string(key)
        .map(|raw| {
            raw.parse::<T>()
                .map_err(|e| StellarError::Config(format!("Invalid value for {key}: {e}")))
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::Mutex;

    use once_cell::sync::Lazy;
    use tempfile::TempDir;

    use super::*;

    static ENV_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

    const ALL_VARS: [&str; 9] = [
        CONFIG_PATH_ENV,
        "STELLAR_API_BASE_URL",
        "STELLAR_REQUEST_TIMEOUT_MS",
        "STELLAR_HEALTH_TIMEOUT_MS",
        "STELLAR_BACKOFF_BASE_MS",
        "STELLAR_HEALTH_INTERVAL_SECS",
        "STELLAR_DATA_DIR",
        "STELLAR_MAX_STORE_PER_SEC",
        "STELLAR_MAX_QUEUE_RETRIES",
    ];

    fn clear_env() {
        for key in ALL_VARS {
            std::env::remove_var(key);
        }
    }

    fn write_file(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_env_overrides_every_field() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();

        std::env::set_var("STELLAR_API_BASE_URL", "http://10.0.0.5:9000");
        std::env::set_var("STELLAR_REQUEST_TIMEOUT_MS", "2500");
        std::env::set_var("STELLAR_HEALTH_TIMEOUT_MS", "700");
        std::env::set_var("STELLAR_BACKOFF_BASE_MS", "50");
        std::env::set_var("STELLAR_HEALTH_INTERVAL_SECS", "5");
        std::env::set_var("STELLAR_DATA_DIR", "/tmp/stellar-test");
        std::env::set_var("STELLAR_MAX_STORE_PER_SEC", "10");
        std::env::set_var("STELLAR_MAX_QUEUE_RETRIES", "0");

        let mut config = Config::default();
        apply_env_overrides(&mut config).unwrap();

        assert_eq!(config.api.base_url, "http://10.0.0.5:9000");
        assert_eq!(config.api.request_timeout_ms, 2500);
        assert_eq!(config.api.health_timeout_ms, 700);
        assert_eq!(config.api.backoff_base_ms, 50);
        assert_eq!(config.sync.health_interval_secs, 5);
        assert_eq!(config.storage.data_dir, PathBuf::from("/tmp/stellar-test"));
        assert_eq!(config.rate_limit.max_store_per_window, 10);
        assert_eq!(config.sync.max_queue_retries, 0);

        clear_env();
    }

    #[test]
    fn test_invalid_number_is_config_error() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();
        std::env::set_var("STELLAR_REQUEST_TIMEOUT_MS", "soon");

        let err = apply_env_overrides(&mut Config::default()).unwrap_err();
        assert!(matches!(err, StellarError::Config(ref msg) if msg.contains("STELLAR_REQUEST_TIMEOUT_MS")));

        clear_env();
    }

    #[test]
    fn test_blank_values_are_ignored() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();
        std::env::set_var("STELLAR_API_BASE_URL", "   ");

        let mut config = Config::default();
        apply_env_overrides(&mut config).unwrap();
        assert_eq!(config, Config::default());

        clear_env();
    }

    #[test]
    fn test_env_wins_over_file() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();

        let dir = TempDir::new().unwrap();
        let path = write_file(
            &dir,
            "stellar.toml",
            r#"
[api]
base_url = "http://file-host:8080"
request_timeout_ms = 4000

[sync]
health_interval_secs = 60
"#,
        );
        std::env::set_var(CONFIG_PATH_ENV, &path);
        std::env::set_var("STELLAR_API_BASE_URL", "http://env-host:8080");

        let config = load().unwrap();
        assert_eq!(config.api.base_url, "http://env-host:8080");
        assert_eq!(config.api.request_timeout_ms, 4000);
        assert_eq!(config.sync.health_interval_secs, 60);
        assert_eq!(config.api.health_timeout_ms, 3000);

        clear_env();
    }

    #[test]
    fn test_load_rejects_invalid_merge() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();
        std::env::set_var("STELLAR_HEALTH_INTERVAL_SECS", "0");

        assert!(matches!(load(), Err(StellarError::Config(_))));

        clear_env();
    }

    #[test]
    fn test_load_missing_explicit_file() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();
        std::env::set_var(CONFIG_PATH_ENV, "/nonexistent/stellar.toml");

        assert!(matches!(load(), Err(StellarError::Config(_))));

        clear_env();
    }

    #[test]
    fn test_load_from_file_json_partial() {
        let dir = TempDir::new().unwrap();
        let path = write_file(
            &dir,
            "stellar.json",
            r#"{ "rate_limit": { "max_store_per_window": 5 }, "storage": { "data_dir": "/var/lib/stellar" } }"#,
        );

        let config = load_from_file(Some(path)).unwrap();
        assert_eq!(config.rate_limit.max_store_per_window, 5);
        assert_eq!(config.rate_limit.window_ms, 1000);
        assert_eq!(config.storage.data_dir, PathBuf::from("/var/lib/stellar"));
        assert_eq!(config.api, Config::default().api);
    }

    #[test]
    fn test_load_from_file_not_found() {
        let result = load_from_file(Some(PathBuf::from("/nonexistent/stellar.json")));
        assert!(matches!(result, Err(StellarError::Config(_))));
    }

    #[test]
    fn test_load_from_file_invalid_json() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "stellar.json", r#"{ "api": "#);
        assert!(load_from_file(Some(path)).is_err());
    }

    #[test]
    fn test_parse_config_unsupported_format() {
        let result = parse_config("api: {}", Path::new("stellar.yaml"));
        assert!(matches!(result, Err(StellarError::Config(ref msg)) if msg.contains("yaml")));
    }

    #[test]
    fn test_parse_config_toml_wrong_type() {
        let result = parse_config("[api]\nrequest_timeout_ms = \"fast\"\n", Path::new("x.toml"));
        assert!(result.is_err());
    }
}
