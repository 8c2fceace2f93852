//! Configuration management for jsrelay

pub mod schema;

pub use schema::Config;

use crate::error::{RelayError, RelayResult};
use schema::ServerConfig;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, warn};
use url::Url;

/// Configuration manager
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a new config manager with default path
    pub fn new() -> Self {
        Self {
            config_path: Self::default_config_path(),
        }
    }

    /// Create a config manager with a custom path
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("jsrelay")
            .join("config.toml")
    }

    /// Load configuration, falling back to defaults if the file is missing
    pub async fn load(&self) -> RelayResult<Config> {
        if !self.config_path.exists() {
            debug!("Config file not found, using defaults");
            return Ok(Config::default());
        }

        self.load_from_file(&self.config_path).await
    }

    /// Load and validate configuration from a specific file
    pub async fn load_from_file(&self, path: &Path) -> RelayResult<Config> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| RelayError::io(format!("reading config from {}", path.display()), e))?;

        let config: Config = toml::from_str(&content).map_err(|e| RelayError::ConfigInvalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        validate(&config)?;
        Ok(config)
    }

    /// Save configuration to file
    pub async fn save(&self, config: &Config) -> RelayResult<()> {
        self.ensure_config_dir().await?;

        let content = toml::to_string_pretty(config)?;
        fs::write(&self.config_path, content).await.map_err(|e| {
            RelayError::io(
                format!("writing config to {}", self.config_path.display()),
                e,
            )
        })?;

        info!("Configuration saved to {}", self.config_path.display());
        Ok(())
    }

    /// Ensure the config directory exists
    async fn ensure_config_dir(&self) -> RelayResult<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| RelayError::ConfigDirCreate {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
        }
        Ok(())
    }

    /// Get the config file path
    pub fn path(&self) -> &Path {
        &self.config_path
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Check values that deserialize fine but cannot drive the relay
pub fn validate(config: &Config) -> RelayResult<()> {
    require_http_url("upstream.origin", &config.upstream.origin)?;
    require_http_url("compiler.endpoint", &config.compiler.endpoint)?;

    if !config.upstream.extension.starts_with('.') {
        return Err(RelayError::ConfigValue {
            key: "upstream.extension".to_string(),
            reason: format!("'{}' must start with '.'", config.upstream.extension),
        });
    }

    if config.cache.refresh_interval_secs == 0 {
        return Err(RelayError::ConfigValue {
            key: "cache.refresh_interval_secs".to_string(),
            reason: "must be greater than 0".to_string(),
        });
    }

    if !matches!(config.general.log_format.as_str(), "text" | "json") {
        return Err(RelayError::ConfigValue {
            key: "general.log_format".to_string(),
            reason: format!("'{}' is not one of: text, json", config.general.log_format),
        });
    }

    Ok(())
}

fn require_http_url(key: &str, value: &str) -> RelayResult<()> {
    let url = Url::parse(value).map_err(|e| RelayError::ConfigValue {
        key: key.to_string(),
        reason: format!("'{}': {}", value, e),
    })?;

    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(RelayError::ConfigValue {
            key: key.to_string(),
            reason: format!("unsupported scheme '{}'", other),
        }),
    }
}

/// Resolve the listening port from the configured environment variables.
///
/// Variables are tried in order; unset or empty ones are skipped, unparsable
/// ones are skipped with a warning. Falls back to `default_port`.
pub fn resolve_port<F>(server: &ServerConfig, lookup: F) -> u16
where
    F: Fn(&str) -> Option<String>,
{
    for name in &server.port_env {
        let Some(raw) = lookup(name) else {
            continue;
        };
        let raw = raw.trim();
        if raw.is_empty() {
            continue;
        }
        match raw.parse::<u16>() {
            Ok(port) => {
                debug!("Using port {} from {}", port, name);
                return port;
            }
            Err(_) => warn!("Ignoring {}={}: not a valid port", name, raw),
        }
    }

    server.default_port
}
