mod types;

pub use types::*;

use crate::{Error, Result};
use std::env;

/// Where the active configuration came from. Loading happens before the
/// subscriber is installed, so the caller reports this once logging is up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    File(String),
    Defaults { missing: String },
}

/// Reads `CONFIG_PATH` (default `config.yaml`) and applies environment
/// overrides on top.
pub async fn load() -> Result<(Config, ConfigSource)> {
    let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.yaml".to_string());

    let (mut config, source) = load_from(&config_path).await?;
    apply_env_overrides(&mut config)?;
    Ok((config, source))
}

/// Reads one config file. A missing file yields the defaults; any other
/// read or parse failure is an error.
pub async fn load_from(config_path: &str) -> Result<(Config, ConfigSource)> {
    match tokio::fs::read_to_string(config_path).await {
        Ok(config_str) => Ok((
            parse(&config_str)?,
            ConfigSource::File(config_path.to_string()),
        )),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok((
            Config::default(),
            ConfigSource::Defaults {
                missing: config_path.to_string(),
            },
        )),
        Err(e) => Err(e.into()),
    }
}

pub fn parse(config_str: &str) -> Result<Config> {
    // An empty file deserializes to `null`, which should mean "all defaults".
    if config_str.trim().is_empty() {
        return Ok(Config::default());
    }
    Ok(serde_yaml::from_str(config_str)?)
}

fn apply_env_overrides(config: &mut Config) -> Result<()> {
    if let Ok(robot) = env::var("ROBOT_NAME") {
        config.robot.name = robot;
    }
    if let Ok(dir) = env::var("ACTIONS_DIR") {
        config.actions.dir = dir;
    }
    if let Ok(host) = env::var("HOST") {
        config.server.host = host;
    }
    if let Ok(port) = env::var("PORT") {
        config.server.port = port
            .parse()
            .map_err(|_| Error::config(format!("Invalid PORT value: '{}'", port)))?;
    }
    Ok(())
}
