use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::extractor::{Endpoints, ResolverConfig, DEFAULT_USER_AGENT};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write config {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] serde_yaml::Error),

    #[error("invalid value for {name}: {value}")]
    Env { name: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    pub timeout_secs: u64,
    pub user_agent: String,
    pub twitter_api: String,
    pub oembed_api: String,
    pub youtube_api: String,
    pub proxy: Option<String>,
    pub system_proxy: bool,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        let endpoints = Endpoints::default();
        Self {
            timeout_secs: 10,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            twitter_api: endpoints.twitter_api,
            oembed_api: endpoints.oembed_api,
            youtube_api: endpoints.youtube_api,
            proxy: None,
            system_proxy: true,
        }
    }
}

impl UpstreamConfig {
    pub fn resolver_config(&self) -> ResolverConfig {
        ResolverConfig {
            user_agent: self.user_agent.clone(),
            timeout: Duration::from_secs(self.timeout_secs.max(1)),
            endpoints: Endpoints {
                twitter_api: self.twitter_api.clone(),
                oembed_api: self.oembed_api.clone(),
                youtube_api: self.youtube_api.clone(),
            },
            proxy: self.proxy.clone(),
            system_proxy: self.system_proxy,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub data_dir: PathBuf,
    /// Defaults to `<data_dir>/themes`.
    pub themes_dir: Option<PathBuf>,
    /// Defaults to `<data_dir>/locales`.
    pub locales_dir: Option<PathBuf>,
    /// Used for YouTube lookups when the request does not carry its own key.
    pub youtube_api_key: Option<String>,
    pub ollama_url: String,
    pub upstream: UpstreamConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3001,
            data_dir: PathBuf::from("./data"),
            themes_dir: None,
            locales_dir: None,
            youtube_api_key: None,
            ollama_url: "http://localhost:11434".to_string(),
            upstream: UpstreamConfig::default(),
        }
    }
}

impl Config {
    pub fn cards_path(&self) -> PathBuf {
        self.data_dir.join("cards.json")
    }

    pub fn themes_path(&self) -> PathBuf {
        self.themes_dir
            .clone()
            .unwrap_or_else(|| self.data_dir.join("themes"))
    }

    pub fn locales_path(&self) -> PathBuf {
        self.locales_dir
            .clone()
            .unwrap_or_else(|| self.data_dir.join("locales"))
    }

    /// Apply `COSMICMIND_PORT`, `COSMICMIND_DATA_DIR`, `YOUTUBE_API_KEY` and `OLLAMA_URL`.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|name| std::env::var(name).ok())
    }

    fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(port) = lookup("COSMICMIND_PORT") {
            self.port = port.trim().parse().map_err(|_| ConfigError::Env {
                name: "COSMICMIND_PORT",
                value: port.clone(),
            })?;
        }
        if let Some(dir) = lookup("COSMICMIND_DATA_DIR") {
            self.data_dir = PathBuf::from(dir);
        }
        if let Some(key) = lookup("YOUTUBE_API_KEY").filter(|k| !k.trim().is_empty()) {
            self.youtube_api_key = Some(key);
        }
        if let Some(url) = lookup("OLLAMA_URL") {
            self.ollama_url = url;
        }
        Ok(())
    }
}

pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .or_else(|| dirs::home_dir().map(|h| h.join(".config")))
        .unwrap_or_else(|| PathBuf::from("."))
        .join("cosmicmind")
}

pub fn config_path() -> PathBuf {
    config_dir().join("config.yml")
}

/// Load the config at `path`. A missing or empty file yields defaults.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Ok(Config::default());
    }

    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    if content.trim().is_empty() {
        return Ok(Config::default());
    }

    serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

pub fn write_config(path: &Path, config: &Config) -> Result<(), ConfigError> {
    let write_err = |source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(write_err)?;
    }

    let content = serde_yaml::to_string(config)?;
    fs::write(path, content).map_err(write_err)
}
