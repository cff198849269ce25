use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::llm::{ModelId, ProviderConfig};

pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_HISTORY_WINDOW: u8 = 6;
pub const MAX_HISTORY_WINDOW: u8 = 20;

/// Clamp any requested history window into `0..=MAX_HISTORY_WINDOW`
pub fn clamp_history_window(value: i64) -> u8 {
    value.clamp(0, MAX_HISTORY_WINDOW as i64) as u8
}

/// Application configuration
#[derive(Clone, Debug, Serialize)]
pub struct Config {
    /// Chat-completion endpoint URL
    pub endpoint: String,

    /// Bearer credential, empty when unset
    #[serde(skip_serializing)]
    pub api_key: String,

    /// Model to request
    pub model: ModelId,

    /// Number of trailing turns folded into each prompt
    pub history_window: u8,

    /// Directory for the interactive-mode log file
    pub data_dir: PathBuf,
}

/// Shape of a configuration file. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub model: Option<ModelId>,
    pub history_window: Option<i64>,
    pub data_dir: Option<PathBuf>,
}

/// An environment value that could not be used
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IgnoredSetting {
    pub key: &'static str,
    pub reason: String,
}

/// Where configuration came from and what was rejected while loading it
#[derive(Debug, Default)]
pub struct LoadReport {
    pub env_file: Option<PathBuf>,
    pub config_file: Option<PathBuf>,
    pub ignored: Vec<IgnoredSetting>,
}

impl LoadReport {
    /// Emit the report once a subscriber is installed
    pub fn log(&self) {
        match &self.env_file {
            Some(path) => debug!("Loaded environment from {}", path.display()),
            None => debug!("No .env file found"),
        }
        match &self.config_file {
            Some(path) => debug!("Loaded configuration from {}", path.display()),
            None => debug!("No configuration file found, using defaults"),
        }
        for setting in &self.ignored {
            warn!("Ignoring {}: {}", setting.key, setting.reason);
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key: String::new(),
            model: ModelId::default(),
            history_window: DEFAULT_HISTORY_WINDOW,
            data_dir: dirs::data_local_dir()
                .map(|dir| dir.join("mdchat"))
                .unwrap_or_else(|| PathBuf::from("./data")),
        }
    }
}

impl Config {
    /// Initialize configuration from defaults, a `.env` file, config files
    /// and the environment.
    ///
    /// This runs before logging is set up, so what happened is returned as a
    /// [`LoadReport`] for the caller to log.
    pub async fn init() -> Result<(Self, LoadReport)> {
        let mut config = Self::default();
        let mut report = LoadReport {
            env_file: dotenvy::dotenv().ok(),
            ..LoadReport::default()
        };

        if let Some((path, file_config)) = Self::load_from_file().await? {
            config.merge_with(file_config);
            report.config_file = Some(path);
        }

        report.ignored = config.load_from_env();

        Ok((config, report))
    }

    /// Candidate configuration files, highest priority first
    pub fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("./.mdchat.json"), PathBuf::from("./mdchat.json")];

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("mdchat").join("mdchat.json"));
        }

        paths
    }

    /// Load the first configuration file that exists
    pub async fn load_from_file() -> Result<Option<(PathBuf, FileConfig)>> {
        for path in Self::config_paths() {
            if path.exists() {
                let file_config = Self::load_from_path(&path).await?;
                return Ok(Some((path, file_config)));
            }
        }

        Ok(None)
    }

    /// Load a configuration file from an explicit path
    pub async fn load_from_path(path: &Path) -> Result<FileConfig> {
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let file_config: FileConfig = serde_json::from_str(&content)
            .with_context(|| format!("Invalid configuration in {}", path.display()))?;
        Ok(file_config)
    }

    /// Merge values from a configuration file into this one
    pub fn merge_with(&mut self, other: FileConfig) {
        if let Some(endpoint) = other.endpoint {
            self.endpoint = endpoint;
        }
        if let Some(api_key) = other.api_key {
            self.api_key = api_key;
        }
        if let Some(model) = other.model {
            self.model = model;
        }
        if let Some(window) = other.history_window {
            self.history_window = clamp_history_window(window);
        }
        if let Some(data_dir) = other.data_dir {
            self.data_dir = data_dir;
        }
    }

    /// Load configuration from environment variables
    pub fn load_from_env(&mut self) -> Vec<IgnoredSetting> {
        self.apply_env(|key| std::env::var(key).ok())
    }

    /// Apply environment-style overrides from `lookup`, returning the values
    /// that were rejected
    pub fn apply_env<F>(&mut self, lookup: F) -> Vec<IgnoredSetting>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut ignored = Vec::new();

        if let Some(endpoint) = lookup("MDCHAT_ENDPOINT") {
            self.endpoint = endpoint;
        }

        if let Some(key) = lookup("MDCHAT_API_KEY").or_else(|| lookup("OPENAI_API_KEY")) {
            self.api_key = key;
        }

        if let Some(model) = lookup("MDCHAT_MODEL") {
            match model.parse() {
                Ok(model) => self.model = model,
                Err(reason) => ignored.push(IgnoredSetting {
                    key: "MDCHAT_MODEL",
                    reason,
                }),
            }
        }

        if let Some(window) = lookup("MDCHAT_HISTORY_WINDOW") {
            match window.trim().parse::<i64>() {
                Ok(window) => self.history_window = clamp_history_window(window),
                Err(_) => ignored.push(IgnoredSetting {
                    key: "MDCHAT_HISTORY_WINDOW",
                    reason: format!("'{}' is not an integer", window.trim()),
                }),
            }
        }

        if let Some(data_dir) = lookup("MDCHAT_DATA_DIR") {
            self.data_dir = PathBuf::from(data_dir);
        }

        ignored
    }

    /// Check if the configuration has a credential
    pub fn has_api_key(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    /// Provider settings derived from this configuration
    pub fn provider_config(&self) -> ProviderConfig {
        ProviderConfig {
            endpoint: self.endpoint.trim().to_string(),
            api_key: self.api_key.clone(),
            model: self.model,
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        let endpoint = self.endpoint.trim();
        if endpoint.is_empty() {
            return Err(anyhow::anyhow!("Endpoint is required"));
        }

        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(anyhow::anyhow!("Endpoint must be an http(s) URL: {}", endpoint));
        }

        if !self.has_api_key() {
            warn!("No API key configured; requests will carry an empty bearer token");
        }

        Ok(())
    }
}
