use crate::error::{Result, SplitterError};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const API_URL_ENV: &str = "TILE_SPLITTER_API_URL";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub api_url: String,
}

impl Config {
    /// Reads the endpoint once at startup. The environment wins over the
    /// config file.
    pub fn load() -> Result<Self> {
        let from_env = std::env::var(API_URL_ENV).ok();
        let config_path = Self::config_path();
        Self::resolve(from_env, config_path.as_deref())
    }

    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("tile-splitter").join("config.json"))
    }

    fn resolve(from_env: Option<String>, config_path: Option<&Path>) -> Result<Self> {
        if let Some(url) = from_env.filter(|u| !u.trim().is_empty()) {
            info!("Using processing endpoint from {}", API_URL_ENV);
            return Self::validated(url.trim().to_string());
        }

        if let Some(path) = config_path {
            if path.exists() {
                debug!("Reading config from {:?}", path);
                let content = std::fs::read_to_string(path)?;
                let config: Config = serde_json::from_str(&content).map_err(|e| {
                    SplitterError::Config(format!("invalid {}: {}", path.display(), e))
                })?;
                if !config.api_url.trim().is_empty() {
                    info!("Using processing endpoint from {}", path.display());
                    return Self::validated(config.api_url.trim().to_string());
                }
            }
        }

        Err(SplitterError::Config(format!(
            "no processing endpoint configured, set {} or add \"api_url\" to the config file",
            API_URL_ENV
        )))
    }

    fn validated(api_url: String) -> Result<Self> {
        let url = Url::parse(&api_url)
            .map_err(|e| SplitterError::Config(format!("invalid endpoint '{}': {}", api_url, e)))?;
        match url.scheme() {
            "http" | "https" => Ok(Self { api_url }),
            other => Err(SplitterError::Config(format!(
                "unsupported endpoint scheme '{}'",
                other
            ))),
        }
    }
}
