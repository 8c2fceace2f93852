//! Error types for jsrelay
//!
//! All modules use `RelayResult<T>` as their return type.

use axum::http::StatusCode;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for relay operations
pub type RelayResult<T> = Result<T, RelayError>;

/// All errors that can occur in the relay
#[derive(Error, Debug)]
pub enum RelayError {
    // Stream and decoding errors
    #[error("Stream error while reading response body: {source}")]
    Stream {
        #[source]
        source: std::io::Error,
    },

    #[error("Unsupported text encoding: {0}")]
    UnsupportedEncoding(String),

    #[error("JSON error: {0}")]
    Parse(#[from] serde_json::Error),

    // Compile service errors
    #[error("Could not reach compile service at {endpoint}: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Unexpected HTTP response: {0}")]
    UnexpectedStatus(u16),

    #[error("Failed to compile: {field}: {detail}")]
    Compilation { field: String, detail: String },

    #[error("Malformed compile service response: {0}")]
    MalformedResponse(String),

    // Request errors
    #[error("Not a script path: {0}")]
    ScriptPath(String),

    #[error("Malformed webhook payload: {0}")]
    WebhookPayload(String),

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Invalid configuration value for {key}: {reason}")]
    ConfigValue { key: String, reason: String },

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    User(String),
}

impl RelayError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a transport error for the given endpoint
    pub fn transport(
        endpoint: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::Transport {
            endpoint: endpoint.into(),
            source: source.into(),
        }
    }

    /// Whether the error came from the compile round-trip rather than local setup
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            Self::Stream { .. }
                | Self::UnsupportedEncoding(_)
                | Self::Parse(_)
                | Self::Transport { .. }
                | Self::UnexpectedStatus(_)
                | Self::Compilation { .. }
                | Self::MalformedResponse(_)
        )
    }

    /// HTTP status the relay answers with when this error ends a request
    pub fn response_status(&self) -> StatusCode {
        match self {
            Self::WebhookPayload(_) => StatusCode::BAD_REQUEST,
            Self::ScriptPath(_) => StatusCode::NOT_FOUND,
            e if e.is_upstream() => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::Transport { .. } => Some("Check network access to the compile service"),
            Self::ConfigInvalid { .. } | Self::ConfigValue { .. } => {
                Some("Run: jsrelay config show")
            }
            Self::Compilation { .. } => Some("Fix the reported problems in the upstream source"),
            Self::ScriptPath(_) => Some("Script paths end in .js, e.g. foo/bar.js"),
            _ => None,
        }
    }
}
