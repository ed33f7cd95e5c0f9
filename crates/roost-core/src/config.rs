//! Configuration management for roost.
//!
//! Loads configuration from ${ROOST_HOME}/config.toml with sensible defaults.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub mod paths {
    //! Path resolution for roost configuration.
    //!
    //! ROOST_HOME resolution order:
    //! 1. ROOST_HOME environment variable (if set)
    //! 2. ~/.roost (default)

    use std::path::PathBuf;

    /// Returns the roost home directory.
    pub fn roost_home() -> PathBuf {
        if let Ok(home) = std::env::var("ROOST_HOME") {
            return PathBuf::from(home);
        }

        dirs::home_dir()
            .map(|h| h.join(".roost"))
            .unwrap_or_else(|| PathBuf::from(".roost"))
    }

    /// Returns the path to the config.toml file.
    pub fn config_path() -> PathBuf {
        roost_home().join("config.toml")
    }
}

/// OpenAI provider configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAiProviderConfig {
    /// API key; falls back to `OPENAI_API_KEY` when unset.
    pub api_key: Option<String>,
    /// Base URL; `OPENAI_BASE_URL` takes precedence when set.
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvidersConfig {
    pub openai: OpenAiProviderConfig,
}

/// Composio action backend configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ComposioConfig {
    /// API key; falls back to `COMPOSIO_API_KEY` when unset.
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    /// Composio entity whose connected accounts execute the actions.
    pub entity_id: Option<String>,
}

/// Web search backend configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WebSearchConfig {
    /// API key; falls back to `PARALLEL_API_KEY` when unset.
    pub api_key: Option<String>,
}

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Model to use for the agent loop.
    pub model: String,

    /// Maximum tokens per response (optional).
    pub max_tokens: Option<u32>,

    /// Maximum model turns per prompt before the agent gives up.
    pub max_steps: u32,

    /// Retries per model request for transient failures.
    pub max_retries: u32,

    /// Provider configuration (API keys, base URLs).
    #[serde(default)]
    pub providers: ProvidersConfig,

    /// Composio action backend configuration.
    #[serde(default)]
    pub composio: ComposioConfig,

    /// Web search backend configuration.
    #[serde(default)]
    pub web_search: WebSearchConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model: Self::DEFAULT_MODEL.to_string(),
            max_tokens: None,
            max_steps: Self::DEFAULT_MAX_STEPS,
            max_retries: Self::DEFAULT_MAX_RETRIES,
            providers: ProvidersConfig::default(),
            composio: ComposioConfig::default(),
            web_search: WebSearchConfig::default(),
        }
    }
}

impl Config {
    const DEFAULT_MODEL: &str = "gpt-4o";
    const DEFAULT_MAX_STEPS: u32 = 20;
    const DEFAULT_MAX_RETRIES: u32 = 3;

    /// Loads configuration from the default config path.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        Self::load_from(&paths::config_path())
    }

    /// Loads configuration from a specific path.
    /// Returns defaults if the file doesn't exist.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config from {}", path.display()))
        } else {
            Ok(Config::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_file_is_missing() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config.model, "gpt-4o");
        assert_eq!(config.max_steps, 20);
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.max_tokens, None);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "model = \"gpt-4o-mini\"\n\n[composio]\nentity_id = \"team\"\n",
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.max_steps, 20);
        assert_eq!(config.composio.entity_id.as_deref(), Some("team"));
        assert_eq!(config.composio.api_key, None);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "model = [broken").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config"));
    }
}
