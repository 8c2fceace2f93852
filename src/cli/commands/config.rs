//! Config command - show or edit configuration

use crate::cli::args::{ConfigAction, ConfigArgs};
use crate::config::{validate, Config, ConfigManager};
use crate::error::{RelayError, RelayResult};

/// Execute the config command
pub async fn execute(args: ConfigArgs, config: &Config, manager: &ConfigManager) -> RelayResult<()> {
    match args.action {
        None | Some(ConfigAction::Show) => show_config(config)?,
        Some(ConfigAction::Path) => show_path(manager),
        Some(ConfigAction::Init { force }) => init_config(manager, force).await?,
        Some(ConfigAction::Set { key, value }) => {
            let mut config = config.clone();
            set_value(&mut config, &key, &value)?;
            validate(&config)?;
            manager.save(&config).await?;
            println!("Set {} = {}", key, value);
        }
    }

    Ok(())
}

fn show_config(config: &Config) -> RelayResult<()> {
    let toml = toml::to_string_pretty(config)?;
    println!("{}", toml);
    Ok(())
}

fn show_path(manager: &ConfigManager) {
    println!("{}", manager.path().display());
}

async fn init_config(manager: &ConfigManager, force: bool) -> RelayResult<()> {
    let path = manager.path();

    if path.exists() && !force {
        eprintln!("Config already exists at {}", path.display());
        eprintln!("Use --force to overwrite");
        return Ok(());
    }

    manager.save(&Config::default()).await?;
    println!("Configuration initialized at {}", path.display());

    Ok(())
}

/// Apply a dot-separated key to `config`
fn set_value(config: &mut Config, key: &str, value: &str) -> RelayResult<()> {
    let parts: Vec<&str> = key.split('.').collect();

    match parts.as_slice() {
        ["general", "log_format"] => config.general.log_format = value.to_string(),

        ["server", "bind"] => config.server.bind = value.to_string(),
        ["server", "default_port"] => config.server.default_port = parse_number(key, value)?,
        ["server", "port_env"] => {
            config.server.port_env = value
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        ["upstream", "origin"] => config.upstream.origin = value.to_string(),
        ["upstream", "extension"] => config.upstream.extension = value.to_string(),

        ["compiler", "endpoint"] => config.compiler.endpoint = value.to_string(),
        ["compiler", "compilation_level"] => {
            config.compiler.compilation_level = value.to_string()
        }

        ["cache", "refresh_interval_secs"] => {
            config.cache.refresh_interval_secs = parse_number(key, value)?
        }

        ["webhooks", "event"] => config.webhooks.event = value.to_string(),
        ["webhooks", "sources", source_id] if !source_id.is_empty() => {
            if value.is_empty() {
                config.webhooks.sources.remove(*source_id);
            } else {
                config
                    .webhooks
                    .sources
                    .insert((*source_id).to_string(), value.to_string());
            }
        }

        _ => {
            return Err(RelayError::User(format!(
                "Unknown config key: {}\nValid keys:\n{}",
                key,
                VALID_KEYS.join("\n")
            )))
        }
    }

    Ok(())
}

const VALID_KEYS: [&str; 10] = [
    "  general.log_format",
    "  server.bind",
    "  server.default_port",
    "  server.port_env",
    "  upstream.origin",
    "  upstream.extension",
    "  compiler.endpoint",
    "  compiler.compilation_level",
    "  cache.refresh_interval_secs",
    "  webhooks.event, webhooks.sources.<id>",
];

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> RelayResult<T> {
    value.parse().map_err(|_| RelayError::ConfigValue {
        key: key.to_string(),
        reason: format!("invalid number: {}", value),
    })
}
