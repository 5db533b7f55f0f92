use std::path::PathBuf;

use eyre::Result;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::summarize::{DEFAULT_API_BASE, DEFAULT_MODEL, ModelConfig};
use crate::transcript::FetchStrategy;

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub model: Option<String>,
    pub languages: Option<Vec<String>>,
    pub api_base: Option<String>,
}

impl Config {
    /// Load config from ~/.config/ytsum/config.toml if it exists
    pub fn load() -> Result<Self> {
        let path = config_path();
        if path.exists() {
            debug!("Loading config from {}", path.display());
            let content = std::fs::read_to_string(&path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            debug!("No config file found at {}", path.display());
            Ok(Config::default())
        }
    }
}

pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from(".config"))
        .join("ytsum")
        .join("config.toml")
}

/// Everything a submission needs, resolved once at startup
#[derive(Debug, Clone)]
pub struct Settings {
    pub model: ModelConfig,
    pub strategies: Vec<FetchStrategy>,
}

impl Settings {
    /// Merge CLI overrides, the config file and the API key; CLI wins
    pub fn resolve(
        config: &Config,
        cli_model: Option<&str>,
        cli_languages: &[String],
        api_key: Option<String>,
    ) -> Self {
        let model = cli_model
            .map(str::to_string)
            .or_else(|| config.model.clone())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let api_base = config
            .api_base
            .clone()
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());

        let languages = if cli_languages.is_empty() {
            config.languages.clone().unwrap_or_else(|| vec!["en".to_string()])
        } else {
            cli_languages.to_vec()
        };

        Self {
            model: ModelConfig {
                api_key,
                model,
                api_base,
            },
            strategies: FetchStrategy::chain(&languages),
        }
    }
}
