//! Configuration schema for jsrelay
//!
//! Configuration is stored at `~/.config/jsrelay/config.toml`

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Listener settings
    pub server: ServerConfig,

    /// Where script sources live
    pub upstream: UpstreamConfig,

    /// Compile service settings
    pub compiler: CompilerConfig,

    /// Cache settings
    pub cache: CacheConfig,

    /// Webhook sources allowed to flush the cache
    pub webhooks: WebhookConfig,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log format: "text" or "json"
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_format: "text".to_string(),
        }
    }
}

/// HTTP listener configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind
    pub bind: String,

    /// Environment variables consulted for the port, first match wins
    pub port_env: Vec<String>,

    /// Port used when none of `port_env` holds a valid port
    pub default_port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port_env: vec![
                "C9_PORT".to_string(),
                "PORT".to_string(),
                "VCAP_APP_PORT".to_string(),
                "VMC_APP_PORT".to_string(),
            ],
            default_port: 1337,
        }
    }
}

/// Upstream script host
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Origin prefixed to every requested path
    pub origin: String,

    /// Extension appended to the requested path
    pub extension: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            origin: "http://js-raw.abhishekmunie.com".to_string(),
            extension: ".js".to_string(),
        }
    }
}

/// Compile service request settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    /// Full URL of the compile endpoint
    pub endpoint: String,

    /// `compilation_level` form field
    pub compilation_level: String,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://closure-compiler.appspot.com/compile".to_string(),
            compilation_level: "SIMPLE_OPTIMIZATIONS".to_string(),
        }
    }
}

/// Cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Seconds between unconditional cache flushes
    pub refresh_interval_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            refresh_interval_secs: 3600,
        }
    }
}

/// Webhook configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebhookConfig {
    /// Value of `x-github-event` that triggers a flush
    pub event: String,

    /// Source id (URL path segment) to expected repository URL
    pub sources: BTreeMap<String, String>,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        let mut sources = BTreeMap::new();
        sources.insert(
            "mySite-js".to_string(),
            "https://github.com/mySite/mySite-js".to_string(),
        );
        Self {
            event: "push".to_string(),
            sources,
        }
    }
}
