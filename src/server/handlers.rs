//! Request handlers
//!
//! `GET` serves minified scripts (or flushes the cache for `?clear`),
//! `POST` receives webhooks. Every request ends with a response.

use super::AppState;
use crate::webhook::{repository_url, Verdict};
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use tracing::{debug, error, info, warn};

/// Content type of every served script
pub const JAVASCRIPT: &str = "application/javascript";

/// Header GitHub uses to name the event
pub const EVENT_HEADER: &str = "x-github-event";

/// GET handler: serve `/<path>.js`, or clear on `?clear`
pub async fn serve_script(State(state): State<AppState>, uri: Uri) -> Response {
    if uri.query() == Some("clear") {
        let removed = state.cache.clear();
        info!("Cache cleared on request, {} entries removed", removed);
        return StatusCode::NO_CONTENT.into_response();
    }

    let Some(source_url) = state.locator.resolve(uri.path()) else {
        return (StatusCode::NOT_FOUND, "not found").into_response();
    };
    debug!("url: {}", source_url);

    if let Some(code) = state.cache.lookup(&source_url) {
        debug!("Cache hit for {}", source_url);
        return javascript(code);
    }

    let generation = state.cache.generation();
    match state.compiler.compile(&source_url).await {
        Ok(code) => {
            if !state
                .cache
                .insert_if_current(source_url.as_str(), code.as_str(), generation)
            {
                debug!("Cache cleared while compiling {}, not storing", source_url);
            }
            javascript(code)
        }
        Err(e) => {
            error!("Compiling {} failed: {}", source_url, e);
            (e.response_status(), e.to_string()).into_response()
        }
    }
}

/// POST handler: validate a webhook and flush the cache on acceptance.
///
/// The source id is the percent-decoded path; `POST /` has an empty id.
pub async fn receive_webhook(
    State(state): State<AppState>,
    path: Option<Path<String>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let source_id = path.map(|Path(id)| id).unwrap_or_default();
    let source_id = source_id.as_str();
    let event_type = headers
        .get(EVENT_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    if let Err(rejection) = state.validator.screen(source_id, event_type) {
        warn!("Webhook for '{}' rejected: {}", source_id, rejection);
        return (StatusCode::BAD_REQUEST, rejection.reason()).into_response();
    }

    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok());

    let claimed = match repository_url(content_type, &body) {
        Ok(url) => url,
        Err(e) => {
            warn!("Webhook for '{}' has an unusable payload: {}", source_id, e);
            return (StatusCode::BAD_REQUEST, e.to_string()).into_response();
        }
    };

    match state.validator.validate(source_id, event_type, &claimed) {
        Verdict::Accepted => {
            let removed = state.cache.clear();
            info!(
                "Push from {} accepted, cache cleared ({} entries)",
                claimed, removed
            );
            StatusCode::NO_CONTENT.into_response()
        }
        Verdict::Rejected(rejection) => {
            warn!(
                "Webhook for '{}' rejected: {} (claimed {})",
                source_id, rejection, claimed
            );
            (StatusCode::BAD_REQUEST, rejection.reason()).into_response()
        }
    }
}

fn javascript(code: String) -> Response {
    ([(header::CONTENT_TYPE, JAVASCRIPT)], code).into_response()
}
