//! Config inspection commands: show, path.

use crate::{
    cmd::ConfigCommand,
    config::{TutorConfig, resolve_config_path},
};
use anyhow::{Context, Result};
use std::path::Path;

/// Dispatch config subcommands.
pub fn run(action: &ConfigCommand, config: &TutorConfig, flag: Option<&Path>) -> Result<()> {
    match action {
        ConfigCommand::Show => show(config),
        ConfigCommand::Path => {
            let path = flag.map_or_else(resolve_config_path, Path::to_path_buf);
            println!("{}", path.display());
            Ok(())
        }
    }
}

fn show(config: &TutorConfig) -> Result<()> {
    print!("{}", render(config)?);
    Ok(())
}

/// The effective config as TOML, with API keys masked.
pub fn render(config: &TutorConfig) -> Result<String> {
    let mut config = config.clone();
    config.remote.api_key = mask(&config.remote.api_key);
    config.search.api_key = mask(&config.search.api_key);
    toml::to_string_pretty(&config).context("serializing config")
}

fn mask(key: &str) -> String {
    let key = key.trim();
    if key.is_empty() {
        return String::new();
    }
    let tail: String = key
        .chars()
        .rev()
        .take(4)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    if key.chars().count() <= 8 {
        "****".to_owned()
    } else {
        format!("****{tail}")
    }
}
