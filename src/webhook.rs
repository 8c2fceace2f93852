//! GitHub push webhook validation
//!
//! A push from a known source whose repository URL matches the configured
//! one flushes the script cache. Validation only compares the event's
//! declared fields against static configuration.

use crate::config::schema::WebhookConfig;
use crate::decode::decode;
use crate::error::{RelayError, RelayResult};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use url::form_urlencoded;

/// Why an event was turned away
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    UnknownSource,
    NotPushEvent,
    RepositoryMismatch,
}

impl Rejection {
    /// Short reason suitable for logs and response bodies
    pub fn reason(&self) -> &'static str {
        match self {
            Self::UnknownSource => "unknown source",
            Self::NotPushEvent => "not a push event",
            Self::RepositoryMismatch => "repository URL mismatch",
        }
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.reason())
    }
}

/// Outcome of validating a webhook event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Accepted,
    Rejected(Rejection),
}

/// Checks events against the configured sources
#[derive(Debug, Clone)]
pub struct WebhookValidator {
    event: String,
    sources: BTreeMap<String, String>,
}

impl WebhookValidator {
    /// Build a validator from configuration
    pub fn new(config: &WebhookConfig) -> Self {
        Self {
            event: config.event.clone(),
            sources: config.sources.clone(),
        }
    }

    /// Source ids this validator accepts
    pub fn sources(&self) -> impl Iterator<Item = &str> {
        self.sources.keys().map(String::as_str)
    }

    /// Check the source and event type, before the payload is read.
    ///
    /// Returns the expected repository URL for the source.
    pub fn screen(&self, source_id: &str, event_type: &str) -> Result<&str, Rejection> {
        let expected = self
            .sources
            .get(source_id)
            .map(String::as_str)
            .ok_or(Rejection::UnknownSource)?;

        if event_type != self.event {
            return Err(Rejection::NotPushEvent);
        }

        Ok(expected)
    }

    /// Decide whether an event is authentic and applicable
    pub fn validate(&self, source_id: &str, event_type: &str, claimed_repo_url: &str) -> Verdict {
        match self.screen(source_id, event_type) {
            Ok(expected) if expected == claimed_repo_url => Verdict::Accepted,
            Ok(_) => Verdict::Rejected(Rejection::RepositoryMismatch),
            Err(rejection) => Verdict::Rejected(rejection),
        }
    }
}

/// Extract `payload.repository.url` from a webhook request body.
///
/// Form bodies carry `payload` as a JSON string. JSON bodies carry `payload`
/// either as an object or as a JSON string.
pub fn repository_url(content_type: Option<&str>, body: &[u8]) -> RelayResult<String> {
    let payload = if is_form(content_type) {
        let raw = form_urlencoded::parse(body)
            .find(|(key, _)| key == "payload")
            .map(|(_, value)| value.into_owned())
            .ok_or_else(|| RelayError::WebhookPayload("missing payload field".to_string()))?;
        decode(&raw)?
    } else {
        let text = std::str::from_utf8(body)
            .map_err(|e| RelayError::WebhookPayload(format!("body is not UTF-8: {}", e)))?;
        let mut envelope = decode(text)?;
        match envelope.get_mut("payload").map(Value::take) {
            Some(Value::String(raw)) => decode(&raw)?,
            Some(value @ Value::Object(_)) => value,
            Some(_) => {
                return Err(RelayError::WebhookPayload(
                    "payload is neither an object nor a string".to_string(),
                ))
            }
            None => return Err(RelayError::WebhookPayload("missing payload field".to_string())),
        }
    };

    payload
        .pointer("/repository/url")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| RelayError::WebhookPayload("missing repository.url".to_string()))
}

fn is_form(content_type: Option<&str>) -> bool {
    content_type
        .and_then(|ct| ct.split(';').next())
        .map(|mime| mime.trim().eq_ignore_ascii_case("application/x-www-form-urlencoded"))
        .unwrap_or(false)
}
