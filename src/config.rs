//! Engine configuration: file loading, environment overrides and validation

use crate::error::SearchError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

/// Semantic enrichment settings (model + ingest pipeline)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SemanticConfig {
    /// Trained model used both by the ingest pipeline and by query-time expansion
    pub model_id: String,
    /// Name of the ingest pipeline that populates `<field>.semantic`
    pub pipeline: String,
}

/// An index to register at startup together with its ordered search fields
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndexConfig {
    pub name: String,
    pub search_fields: Vec<String>,
}

/// Connection and behavior settings for the external search engine
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    pub enabled: bool,
    pub url: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub request_timeout_secs: u64,
    pub connect_timeout_secs: u64,
    /// Prepended to every registered index name
    pub index_prefix: String,
    /// Drives the text analyzer chosen for search fields at index creation
    pub default_language: String,
    pub existence_poll_attempts: u32,
    pub existence_poll_delay_ms: u64,
    pub semantic: Option<SemanticConfig>,
    /// JSON thesaurus used by the linguistic expander
    pub thesaurus: Option<PathBuf>,
    pub indexes: Vec<IndexConfig>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            url: "http://localhost:9200".to_string(),
            username: None,
            password: None,
            request_timeout_secs: 30,
            connect_timeout_secs: 10,
            index_prefix: String::new(),
            default_language: "en".to_string(),
            existence_poll_attempts: 3,
            existence_poll_delay_ms: 500,
            semantic: None,
            thesaurus: None,
            indexes: Vec::new(),
        }
    }
}

impl EngineConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn poll_delay(&self) -> Duration {
        Duration::from_millis(self.existence_poll_delay_ms)
    }

    /// Full index name including the configured prefix
    pub fn qualified_index(&self, name: &str) -> String {
        if self.index_prefix.is_empty() {
            name.to_string()
        } else {
            format!("{}{}", self.index_prefix, name)
        }
    }

    /// Parsed base URL of the engine
    pub fn base_url(&self) -> Result<Url, SearchError> {
        let url = Url::parse(&self.url)?;
        if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
            return Err(SearchError::Config(format!(
                "engine URL must be http(s): {}",
                self.url
            )));
        }
        Ok(url)
    }

    /// Check invariants that would otherwise surface as confusing engine errors
    pub fn validate(&self) -> Result<(), SearchError> {
        if self.enabled {
            self.base_url()?;
        }
        if self.username.is_some() != self.password.is_some() {
            return Err(SearchError::Config(
                "username and password must be set together".to_string(),
            ));
        }
        if let Some(semantic) = &self.semantic {
            if semantic.model_id.trim().is_empty() || semantic.pipeline.trim().is_empty() {
                return Err(SearchError::Config(
                    "semantic.model_id and semantic.pipeline cannot be empty".to_string(),
                ));
            }
        }
        for index in &self.indexes {
            crate::error::validate_index_name(&self.qualified_index(&index.name))
                .map_err(|e| SearchError::Config(e.to_string()))?;
            if index.search_fields.is_empty() {
                return Err(SearchError::Config(format!(
                    "index '{}' has no search fields",
                    index.name
                )));
            }
        }
        Ok(())
    }

    /// Apply `SEARCHFORGE_*` environment overrides
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = get("SEARCHFORGE_URL") {
            self.url = url;
        }
        if let Some(enabled) = get("SEARCHFORGE_ENABLED") {
            self.enabled = matches!(enabled.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on");
        }
        if let Some(username) = get("SEARCHFORGE_USERNAME") {
            self.username = Some(username);
        }
        if let Some(password) = get("SEARCHFORGE_PASSWORD") {
            self.password = Some(password);
        }
    }
}

/// Default location of the configuration file
pub fn config_path() -> Result<PathBuf> {
    let config_dir = dirs::config_dir().context("Cannot determine config directory")?;
    Ok(config_dir.join("searchforge").join("config.json"))
}

/// Load configuration from `path` (or the default location), then apply env overrides.
///
/// A missing default file yields the default configuration; a missing explicit path is an error.
pub fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    let (path, explicit) = match path {
        Some(p) => (p.to_path_buf(), true),
        None => (config_path()?, false),
    };

    let mut config = if path.exists() {
        let data = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        serde_json::from_str::<EngineConfig>(&data)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?
    } else if explicit {
        anyhow::bail!("Config file not found: {}", path.display());
    } else {
        EngineConfig::default()
    };

    config.apply_env_overrides();
    config.validate()?;
    Ok(config)
}
