//! CLI argument definitions using clap derive

use clap::{ArgAction, Parser, Subcommand};
use std::net::IpAddr;
use std::path::PathBuf;

/// jsrelay - Minifying JavaScript relay
///
/// Serves scripts from an upstream host minified by the Closure Compiler
/// service, cached in memory and flushed by GitHub push webhooks.
#[derive(Parser, Debug)]
#[command(name = "jsrelay")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "JSRELAY_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the relay server
    Serve(ServeArgs),

    /// Minify one upstream script and print it
    Compile(CompileArgs),

    /// Show or edit configuration
    Config(ConfigArgs),
}

/// Arguments for the serve command
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Port to listen on (overrides port environment variables)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Address to bind (defaults to server.bind from config)
    #[arg(short, long)]
    pub bind: Option<IpAddr>,
}

/// Arguments for the compile command
#[derive(Parser, Debug)]
pub struct CompileArgs {
    /// Script path as it would be requested, e.g. foo/bar.js
    pub path: String,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Subcommand for config
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Initialize default configuration
    Init {
        /// Overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., upstream.origin, webhooks.sources.my-site)
        key: String,
        /// Value to set
        value: String,
    },
}
