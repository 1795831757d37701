/*
[INPUT]:  YAML configuration file and command-line overrides
[OUTPUT]: Resolved client settings and token location
[POS]:    Configuration layer - CLI setup
[UPDATE]: When adding new configuration options
*/

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use motomarket_adapter::{ClientConfig, DEFAULT_BASE_URL};

const APP_DIR: &str = "motomarket";

/// Top-level configuration for the marketplace CLI
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CliConfig {
    /// Server root; `/api/v1/` is appended per request
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Where the session token is kept between runs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_path: Option<PathBuf>,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            token_path: None,
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl CliConfig {
    /// Load configuration from YAML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        let config: Self = serde_yaml::from_str(&content)
            .with_context(|| format!("parse config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Explicit path must exist; the default location is optional
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => match default_config_path() {
                Some(path) if path.exists() => Self::from_file(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    pub fn validate(&self) -> Result<()> {
        let host = strip_http_scheme(&self.base_url)
            .ok_or_else(|| anyhow!("base_url must start with http:// or https://"))?;
        if host.is_empty() {
            return Err(anyhow!("base_url has no host"));
        }
        if self.timeout_secs == 0 {
            return Err(anyhow!("timeout_secs must be greater than zero"));
        }
        Ok(())
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            base_url: self.base_url.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
            ..ClientConfig::default()
        }
    }

    pub fn resolved_token_path(&self) -> Result<PathBuf> {
        match &self.token_path {
            Some(path) => Ok(path.clone()),
            None => Ok(dirs::data_dir()
                .ok_or_else(|| anyhow!("Could not determine data directory"))?
                .join(APP_DIR)
                .join("token")),
        }
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join("config.yaml"))
}

/// Host part after the scheme, if the scheme is http(s)
fn strip_http_scheme(url: &str) -> Option<&str> {
    url.trim()
        .strip_prefix("https://")
        .or_else(|| url.trim().strip_prefix("http://"))
}
