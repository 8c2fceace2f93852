//! Blocking HTTP transport for the compile service

use crate::error::{RelayError, RelayResult};
use std::io::Read;
use ureq::Agent;

/// Status and unread body of a compile service response
pub struct TransportResponse {
    pub status: u16,
    /// `charset` parameter of the `Content-Type` header, if any
    pub charset: Option<String>,
    pub body: Box<dyn Read + Send>,
}

impl std::fmt::Debug for TransportResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransportResponse")
            .field("status", &self.status)
            .field("charset", &self.charset)
            .finish_non_exhaustive()
    }
}

/// Sends a form-encoded POST and hands back the raw response.
///
/// Implementations block; callers run them off the async reactor.
pub trait Transport: Send + Sync {
    /// POST `body` as `application/x-www-form-urlencoded` to `endpoint`.
    ///
    /// Any HTTP status counts as a response; only connection-level failures
    /// are errors.
    fn post_form(&self, endpoint: &str, body: &str) -> RelayResult<TransportResponse>;
}

/// Transport backed by a shared `ureq` agent
pub struct UreqTransport {
    agent: Agent,
}

impl UreqTransport {
    /// Create a transport that reports non-2xx statuses as responses
    pub fn new() -> Self {
        let config = Agent::config_builder()
            .http_status_as_error(false)
            .build();
        Self {
            agent: Agent::new_with_config(config),
        }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for UreqTransport {
    fn post_form(&self, endpoint: &str, body: &str) -> RelayResult<TransportResponse> {
        // ureq sets Content-Length from the sized body.
        let response = self
            .agent
            .post(endpoint)
            .header("Content-Type", "application/x-www-form-urlencoded")
            .send(body)
            .map_err(|e| RelayError::transport(endpoint, e))?;

        let status = response.status().as_u16();
        let charset = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .and_then(charset_param);
        let body = response.into_body().into_reader();

        Ok(TransportResponse {
            status,
            charset,
            body: Box::new(body),
        })
    }
}

/// `charset` parameter of a `Content-Type` value
fn charset_param(content_type: &str) -> Option<String> {
    content_type.split(';').skip(1).find_map(|param| {
        let (name, value) = param.split_once('=')?;
        name.trim()
            .eq_ignore_ascii_case("charset")
            .then(|| value.trim().trim_matches('"').to_string())
    })
}
