//! Config command handlers.

use anyhow::{Context, Result};
use roost_core::config;

pub fn path() {
    println!("{}", config::paths::config_path().display());
}

pub fn show(config: &config::Config) -> Result<()> {
    // Keys are printed, values of secrets are not.
    let mut sanitized = config.clone();
    if sanitized.providers.openai.api_key.is_some() {
        sanitized.providers.openai.api_key = Some("<set>".to_string());
    }
    if sanitized.composio.api_key.is_some() {
        sanitized.composio.api_key = Some("<set>".to_string());
    }
    if sanitized.web_search.api_key.is_some() {
        sanitized.web_search.api_key = Some("<set>".to_string());
    }

    let toml = toml::to_string_pretty(&sanitized).context("serialize config")?;
    print!("{toml}");
    Ok(())
}
