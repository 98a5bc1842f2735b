//! Configuration loading for the MedDrug client.
//! Reads meddrug.toml from the current directory or the path in the
//! MEDDRUG_CONFIG env var. A missing file yields the defaults.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

use crate::error::ConfigError;
use crate::models::ModelVariant;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MedDrugConfig {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub path_style: PathStyle,
    #[serde(default)]
    pub descriptor_field: DescriptorField,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            path_style: PathStyle::default(),
            descriptor_field: DescriptorField::default(),
        }
    }
}

fn default_base_url()     -> String { "http://localhost:8000".to_string() }
fn default_timeout_secs() -> u64    { 30 }

/// Endpoint path spelling. The two backend API generations differ only in
/// the trailing slash.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathStyle {
    #[default]
    Bare,
    TrailingSlash,
}

/// Name of the request field carrying the SMILES string.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DescriptorField {
    #[default]
    Smiles,
    Drug,
}

impl DescriptorField {
    pub fn as_str(&self) -> &'static str {
        match self {
            DescriptorField::Smiles => "smiles",
            DescriptorField::Drug => "drug",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default)]
    pub concurrency: ConcurrencyPolicy,
    #[serde(default)]
    pub default_model: ModelVariant,
}

/// What a session does with a submit that arrives while another submit is
/// still in flight.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConcurrencyPolicy {
    /// Fail fast with a concurrency error.
    #[default]
    Reject,
    /// The new submit becomes authoritative; the older response is dropped
    /// on arrival.
    Supersede,
}

impl MedDrugConfig {
    /// Load configuration from meddrug.toml.
    /// Checks MEDDRUG_CONFIG first, then the current directory, then applies
    /// the MEDDRUG_BASE_URL override.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("MEDDRUG_CONFIG")
            .unwrap_or_else(|_| "meddrug.toml".to_string());

        let mut config = if Path::new(&path).exists() {
            Self::from_file(&path)?
        } else {
            debug!(path = %path, "No config file found, using defaults");
            Self::default()
        };

        if let Ok(base_url) = std::env::var("MEDDRUG_BASE_URL") {
            config.backend.base_url = base_url;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Io { path: path.to_string(), source })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: MedDrugConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// The base URL must be an absolute http(s) URL.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = &self.backend.base_url;
        let parsed = url::Url::parse(url).map_err(|e| ConfigError::BaseUrl {
            url: url.clone(),
            reason: e.to_string(),
        })?;
        match parsed.scheme() {
            "http" | "https" => Ok(()),
            other => Err(ConfigError::BaseUrl {
                url: url.clone(),
                reason: format!("unsupported scheme `{other}`"),
            }),
        }
    }
}
