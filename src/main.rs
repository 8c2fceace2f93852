//! jsrelay - Minifying JavaScript relay
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use jsrelay::cli::args::{ConfigAction, ConfigArgs};
use jsrelay::cli::{Cli, Commands};
use jsrelay::config::{Config, ConfigManager};
use jsrelay::error::RelayResult;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> RelayResult<()> {
    let cli = Cli::parse();

    let config_manager = if let Some(ref path) = cli.config {
        ConfigManager::with_path(path.clone())
    } else {
        ConfigManager::new()
    };

    // Path and init must work even when the existing file is broken
    if let Commands::Config(ConfigArgs {
        action: action @ Some(ConfigAction::Path | ConfigAction::Init { .. }),
    }) = cli.command
    {
        let defaults = Config::default();
        init_logging(cli.verbose, &defaults);
        return jsrelay::cli::commands::config(ConfigArgs { action }, &defaults, &config_manager)
            .await;
    }

    let config = config_manager.load().await?;
    init_logging(cli.verbose, &config);

    match cli.command {
        Commands::Serve(args) => jsrelay::cli::commands::serve(args, &config).await,
        Commands::Compile(args) => jsrelay::cli::commands::compile(args, &config).await,
        Commands::Config(args) => {
            jsrelay::cli::commands::config(args, &config, &config_manager).await
        }
    }
}

/// Initialize logging: 0 = info, 1 = debug, 2+ = trace; RUST_LOG wins
fn init_logging(verbose: u8, config: &Config) {
    let default = match verbose {
        0 => "jsrelay=info",
        1 => "jsrelay=debug,tower_http=debug",
        _ => "jsrelay=trace,tower_http=trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    if config.general.log_format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
}
