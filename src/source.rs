//! Canonical source URLs
//!
//! A request for `/<path>.js` maps to `<origin>/<path><extension>` on the
//! upstream host. The same string is the compile input and the cache key.

use crate::config::schema::UpstreamConfig;

/// Path suffix the relay serves
pub const SCRIPT_SUFFIX: &str = ".js";

/// Maps request paths onto the upstream origin
#[derive(Debug, Clone)]
pub struct SourceLocator {
    origin: String,
    extension: String,
}

impl SourceLocator {
    pub fn new(origin: impl Into<String>, extension: impl Into<String>) -> Self {
        let origin = origin.into();
        Self {
            origin: origin.trim_end_matches('/').to_string(),
            extension: extension.into(),
        }
    }

    pub fn from_config(config: &UpstreamConfig) -> Self {
        Self::new(config.origin.clone(), config.extension.clone())
    }

    /// Canonical URL for a request path, or `None` if it is not a script path
    pub fn resolve(&self, request_path: &str) -> Option<String> {
        let stem = request_path
            .trim_start_matches('/')
            .strip_suffix(SCRIPT_SUFFIX)?;

        if stem.is_empty() || stem.ends_with('/') {
            return None;
        }

        Some(format!("{}/{}{}", self.origin, stem, self.extension))
    }
}
