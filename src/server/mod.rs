//! HTTP surface of the relay
//!
//! Wires the cache, compiler and webhook validator into an axum router and
//! owns the process lifecycle: the refresh task starts with the listener and
//! is stopped after the server drains.

pub mod handlers;

use crate::cache::{CodeCache, RefreshTask};
use crate::compiler::{ClosureCompiler, Compile};
use crate::config::Config;
use crate::error::{RelayError, RelayResult};
use crate::source::SourceLocator;
use crate::webhook::WebhookValidator;
use axum::routing::get;
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub cache: Arc<CodeCache>,
    pub compiler: Arc<dyn Compile>,
    pub validator: Arc<WebhookValidator>,
    pub locator: Arc<SourceLocator>,
}

impl AppState {
    /// Build state from configuration around an existing cache and compiler
    pub fn new(config: &Config, cache: Arc<CodeCache>, compiler: Arc<dyn Compile>) -> Self {
        Self {
            cache,
            compiler,
            validator: Arc::new(WebhookValidator::new(&config.webhooks)),
            locator: Arc::new(SourceLocator::from_config(&config.upstream)),
        }
    }
}

/// Build the router. Every path answers GET (scripts) and POST (webhooks).
pub fn build_router(state: AppState) -> Router {
    let methods = get(handlers::serve_script).post(handlers::receive_webhook);

    Router::new()
        .route("/", methods.clone())
        .route("/*path", methods)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Run the relay on `addr` until Ctrl-C or SIGTERM
pub async fn run(config: &Config, addr: SocketAddr) -> RelayResult<()> {
    let cache = Arc::new(CodeCache::new());
    let compiler: Arc<dyn Compile> = Arc::new(ClosureCompiler::new(config.compiler.clone()));
    let state = AppState::new(config, Arc::clone(&cache), compiler);

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| RelayError::io(format!("binding {}", addr), e))?;

    let refresh = RefreshTask::spawn(
        cache,
        Duration::from_secs(config.cache.refresh_interval_secs),
    );

    info!(
        "jsrelay listening on {} (upstream {}, sources: {})",
        addr,
        config.upstream.origin,
        state.validator.sources().collect::<Vec<_>>().join(", ")
    );

    let served = axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| RelayError::io("serving HTTP", e));

    refresh.shutdown().await;
    info!("jsrelay stopped");
    served
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl-C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}
