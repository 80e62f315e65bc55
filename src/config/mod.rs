use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;
use tracing::{debug, info, warn};
use url::Url;

use crate::browser::SessionSettings;
use crate::error::{Result, ServiceError};
use crate::generator::DEFAULT_MODEL;
use crate::llm::client::OPENAI_API_URL;
use crate::sources::{builtin_sources, template_for, DataSource};

pub const DEFAULT_SELECTION_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_CALLBACK_URL: &str = "http://localhost:3001/api/markets/ingest";

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Config {
    pub server: ServerConfig,
    pub ai: AiConfig,
    pub crawl: CrawlSettings,
    pub browser: SessionSettings,
    pub oracle: OracleConfig,
    #[serde(default = "builtin_sources")]
    pub sources: Vec<DataSource>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_origin: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AiConfig {
    /// Model used for market generation; also picks the chunk budget.
    pub generation_model: String,
    /// Model used to rank seed-page links.
    pub selection_model: String,
    /// Forces the per-call token budget instead of the model profile.
    pub max_tokens_override: Option<u64>,
    pub base_url: String,
    /// Only ever read from `OPENAI_API_KEY`.
    #[serde(skip)]
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CrawlSettings {
    pub request_delay_ms: u64,
    pub max_links_for_selection: usize,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct OracleConfig {
    pub callback_url: String,
    pub timeout_seconds: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8000,
                cors_origin: "http://localhost:3001".to_string(),
            },
            ai: AiConfig {
                generation_model: DEFAULT_MODEL.to_string(),
                selection_model: DEFAULT_SELECTION_MODEL.to_string(),
                max_tokens_override: None,
                base_url: OPENAI_API_URL.to_string(),
                api_key: None,
            },
            crawl: CrawlSettings {
                request_delay_ms: 500,
                max_links_for_selection: 100,
            },
            browser: SessionSettings::default(),
            oracle: OracleConfig {
                callback_url: DEFAULT_CALLBACK_URL.to_string(),
                timeout_seconds: 30,
            },
            sources: builtin_sources(),
        }
    }
}

impl Config {
    /// Applies `OPENAI_API_KEY`, `AI_MODEL`, `AI_MAX_TOKENS_OVERRIDE`,
    /// `OPENAI_BASE_URL` and `ORACLE_CALLBACK_URL` from `lookup`.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(key) = non_empty("OPENAI_API_KEY") {
            self.ai.api_key = Some(key);
        }
        if let Some(model) = non_empty("AI_MODEL") {
            self.ai.generation_model = model.clone();
            self.ai.selection_model = model;
        }
        if let Some(raw) = non_empty("AI_MAX_TOKENS_OVERRIDE") {
            match raw.trim().parse::<u64>() {
                Ok(tokens) => self.ai.max_tokens_override = Some(tokens),
                Err(_) => warn!("Ignoring invalid AI_MAX_TOKENS_OVERRIDE '{}'", raw),
            }
        }
        if let Some(base_url) = non_empty("OPENAI_BASE_URL") {
            self.ai.base_url = base_url;
        }
        if let Some(callback_url) = non_empty("ORACLE_CALLBACK_URL") {
            self.oracle.callback_url = callback_url;
        }
    }

    pub fn apply_process_env(&mut self) {
        self.apply_env_overrides(|key| std::env::var(key).ok());
    }

    pub fn openai_configured(&self) -> bool {
        self.ai.api_key.is_some()
    }
}

#[async_trait::async_trait]
pub trait ConfigManager {
    async fn load_config(&self) -> Result<Config>;
    async fn save_config(&self, config: &Config) -> Result<()>;
    fn validate_config(&self, config: &Config) -> Result<()>;
}

pub struct FileConfigManager {
    config_path: PathBuf,
}

impl FileConfigManager {
    pub fn new(config_path: PathBuf) -> Self {
        Self { config_path }
    }

    pub fn path(&self) -> &PathBuf {
        &self.config_path
    }
}

fn config_error(message: impl Into<String>) -> Box<dyn std::error::Error + Send + Sync> {
    ServiceError::Config(message.into()).into()
}

fn is_http_url(value: &str) -> bool {
    Url::parse(value)
        .map(|url| matches!(url.scheme(), "http" | "https") && url.host_str().is_some())
        .unwrap_or(false)
}

#[async_trait::async_trait]
impl ConfigManager for FileConfigManager {
    async fn load_config(&self) -> Result<Config> {
        info!("Loading configuration from {:?}", self.config_path);

        if !self.config_path.exists() {
            warn!("Configuration file not found, creating default config at {:?}", self.config_path);
            self.create_default_config().await?;
        }

        let config_content = fs::read_to_string(&self.config_path)
            .map_err(|e| config_error(format!("Failed to read config file: {}", e)))?;

        let config: Config = toml::from_str(&config_content)
            .map_err(|e| config_error(format!("Failed to parse TOML config: {}", e)))?;

        self.validate_config(&config)?;

        info!("Configuration loaded successfully");
        Ok(config)
    }

    fn validate_config(&self, config: &Config) -> Result<()> {
        debug!("Validating configuration");

        if config.server.port < 1024 {
            return Err(config_error("server.port must be between 1024 and 65535"));
        }
        if config.server.host.trim().is_empty() {
            return Err(config_error("server.host cannot be empty"));
        }

        if config.crawl.max_links_for_selection == 0 {
            return Err(config_error("crawl.max_links_for_selection must be greater than 0"));
        }
        if config.crawl.request_delay_ms > 60_000 {
            return Err(config_error("crawl.request_delay_ms cannot exceed 60 seconds"));
        }

        if config.browser.launch_attempts == 0 {
            return Err(config_error("browser.launch_attempts must be greater than 0"));
        }

        if config.ai.max_tokens_override == Some(0) {
            return Err(config_error("ai.max_tokens_override must be greater than 0"));
        }
        if !is_http_url(&config.ai.base_url) {
            return Err(config_error("ai.base_url must start with http:// or https://"));
        }

        if !is_http_url(&config.oracle.callback_url) {
            return Err(config_error("oracle.callback_url must start with http:// or https://"));
        }
        if config.oracle.timeout_seconds == 0 {
            return Err(config_error("oracle.timeout_seconds must be greater than 0"));
        }

        let mut seen_ids = HashSet::new();
        for source in &config.sources {
            if source.id.trim().is_empty() {
                return Err(config_error("Source id cannot be empty"));
            }
            if !seen_ids.insert(source.id.as_str()) {
                return Err(config_error(format!("Duplicate source id '{}'", source.id)));
            }
            if !is_http_url(&source.seed_url) {
                return Err(config_error(format!(
                    "Source '{}' has invalid seed_url '{}'",
                    source.id, source.seed_url
                )));
            }
            if source.max_links_to_scrape == 0 {
                return Err(config_error(format!(
                    "Source '{}': max_links_to_scrape must be greater than 0",
                    source.id
                )));
            }
            if source.timeout_seconds == 0 {
                return Err(config_error(format!(
                    "Source '{}': timeout_seconds must be greater than 0",
                    source.id
                )));
            }
            if template_for(source.prompt_id()).is_none() {
                return Err(config_error(format!(
                    "Source '{}' uses unknown prompt '{}'",
                    source.id,
                    source.prompt_id()
                )));
            }
        }

        debug!("Configuration validation passed");
        Ok(())
    }

    async fn save_config(&self, config: &Config) -> Result<()> {
        info!("Saving configuration to {:?}", self.config_path);

        let toml_content = toml::to_string_pretty(config)
            .map_err(|e| config_error(format!("Failed to serialize config: {}", e)))?;

        fs::write(&self.config_path, toml_content)
            .map_err(|e| config_error(format!("Failed to write config file: {}", e)))?;

        info!("Configuration saved successfully");
        Ok(())
    }
}

impl FileConfigManager {
    async fn create_default_config(&self) -> Result<()> {
        let toml_content = toml::to_string_pretty(&Config::default())
            .map_err(|e| config_error(format!("Failed to serialize default config: {}", e)))?;

        if let Some(parent) = self.config_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .map_err(|e| config_error(format!("Failed to create config directory: {}", e)))?;
            }
        }

        fs::write(&self.config_path, toml_content)
            .map_err(|e| config_error(format!("Failed to write default config: {}", e)))?;

        info!("Default configuration file created at {:?}", self.config_path);
        Ok(())
    }
}
