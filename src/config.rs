//! Application-level configuration loading for runtime storage and import limits.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "QUIZ_BANK_CONFIG_PATH";
/// Timeout applied to every storage access when the config omits one.
const DEFAULT_STORAGE_TIMEOUT_MS: u64 = 5_000;
/// Largest accepted import batch when the config omits a limit.
const DEFAULT_MAX_IMPORT_ROWS: usize = 2_000;

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    storage_timeout: Duration,
    max_import_rows: usize,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to baked-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let app_config: Self = raw.into();
                    info!(
                        path = %path.display(),
                        storage_timeout_ms = app_config.storage_timeout.as_millis() as u64,
                        max_import_rows = app_config.max_import_rows,
                        "loaded configuration"
                    );
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Upper bound applied to every storage access issued by the services.
    pub fn storage_timeout(&self) -> Duration {
        self.storage_timeout
    }

    /// Largest import batch the reconciler accepts in one call.
    pub fn max_import_rows(&self) -> usize {
        self.max_import_rows
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            storage_timeout: Duration::from_millis(DEFAULT_STORAGE_TIMEOUT_MS),
            max_import_rows: DEFAULT_MAX_IMPORT_ROWS,
        }
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    storage_timeout_ms: Option<u64>,
    max_import_rows: Option<usize>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let defaults = Self::default();
        Self {
            storage_timeout: value
                .storage_timeout_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.storage_timeout),
            max_import_rows: value.max_import_rows.unwrap_or(defaults.max_import_rows),
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}
