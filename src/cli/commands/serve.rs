//! Serve command - run the relay

use crate::cli::args::ServeArgs;
use crate::config::{resolve_port, Config};
use crate::error::{RelayError, RelayResult};
use crate::server;
use std::net::{IpAddr, SocketAddr};

/// Execute the serve command
pub async fn execute(args: ServeArgs, config: &Config) -> RelayResult<()> {
    let addr = listen_addr(&args, config, |name| std::env::var(name).ok())?;
    server::run(config, addr).await
}

/// Resolve the socket address from flags, environment and config
fn listen_addr<F>(args: &ServeArgs, config: &Config, lookup: F) -> RelayResult<SocketAddr>
where
    F: Fn(&str) -> Option<String>,
{
    let ip = match args.bind {
        Some(ip) => ip,
        None => config
            .server
            .bind
            .parse::<IpAddr>()
            .map_err(|e| RelayError::ConfigValue {
                key: "server.bind".to_string(),
                reason: format!("'{}': {}", config.server.bind, e),
            })?,
    };

    let port = args
        .port
        .unwrap_or_else(|| resolve_port(&config.server, lookup));

    Ok(SocketAddr::new(ip, port))
}
