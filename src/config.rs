//! Application configuration.
//!
//! One file (TOML, or JSON by extension) holds the settings of every layer.
//! Without a file the fetch settings come from `GRIDWIRE_*` variables.
//! `GRIDWIRE_TENANT` and `GRIDWIRE_TOKEN` always override the file.

use std::path::Path;

use anyhow::{Context, Result};
use gridwire_fetch::FetchConfig;
use gridwire_query::{BuilderConfig, CacheConfig};
use gridwire_viewport::ViewportConfig;
use serde::{Deserialize, Serialize};

/// Settings of every gridwire layer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Tenant code sent with every request
    #[serde(default)]
    pub tenant: Option<String>,

    /// Access token obtained by an external login. Never written back.
    #[serde(default, skip_serializing)]
    pub token: Option<String>,

    #[serde(default)]
    pub fetch: FetchConfig,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub builder: BuilderConfig,

    #[serde(default)]
    pub viewport: ViewportConfig,
}

impl AppConfig {
    /// Load from `path` if given, then apply environment overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self {
                fetch: FetchConfig::from_env(),
                ..Self::default()
            },
        };
        Ok(config.with_overrides(|name| std::env::var(name).ok()))
    }

    /// Parse a configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        if path.extension().is_some_and(|e| e == "json") {
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse JSON config {}", path.display()))
        } else {
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse TOML config {}", path.display()))
        }
    }

    /// Apply tenant and token overrides from `lookup`.
    #[must_use]
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(tenant) = lookup("GRIDWIRE_TENANT").filter(|t| !t.is_empty()) {
            self.tenant = Some(tenant);
        }
        if let Some(token) = lookup("GRIDWIRE_TOKEN").filter(|t| !t.is_empty()) {
            self.token = Some(token);
        }
        self
    }

    /// Tenant code, or `default` when none is configured.
    #[must_use]
    pub fn tenant_or_default(&self) -> &str {
        self.tenant.as_deref().unwrap_or("default")
    }
}
