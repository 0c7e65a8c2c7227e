//! Configuration for the fetch client.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Error, Result};

/// Configuration for the [`FetchClient`](crate::FetchClient).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Base URL that relative request targets are resolved against.
    #[serde(default)]
    pub base_url: Option<Url>,

    /// Path of the token renewal endpoint.
    #[serde(default = "default_renewal_path")]
    pub renewal_path: String,

    /// Header carrying the tenant code.
    #[serde(default = "default_tenant_header")]
    pub tenant_header: String,

    /// Timeout for requests.
    #[serde(with = "duration_secs", default = "default_timeout")]
    pub timeout: Duration,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            renewal_path: default_renewal_path(),
            tenant_header: default_tenant_header(),
            timeout: default_timeout(),
        }
    }
}

impl FetchConfig {
    /// Create a new config for the given API base URL.
    pub fn with_base_url(base_url: Url) -> Self {
        Self {
            base_url: Some(base_url),
            ..Default::default()
        }
    }

    /// Set the renewal endpoint path.
    #[must_use]
    pub fn renewal_path(mut self, path: impl Into<String>) -> Self {
        self.renewal_path = path.into();
        self
    }

    /// Set the tenant header name.
    #[must_use]
    pub fn tenant_header(mut self, header: impl Into<String>) -> Self {
        self.tenant_header = header.into();
        self
    }

    /// Set the timeout.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(url) = std::env::var("GRIDWIRE_BASE_URL") {
            if let Ok(parsed) = url.parse() {
                config.base_url = Some(parsed);
            }
        }

        if let Ok(path) = std::env::var("GRIDWIRE_RENEWAL_PATH") {
            config.renewal_path = path;
        }

        if let Ok(header) = std::env::var("GRIDWIRE_TENANT_HEADER") {
            config.tenant_header = header;
        }

        if let Some(secs) = std::env::var("GRIDWIRE_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
        {
            config.timeout = Duration::from_secs(secs);
        }

        config
    }

    /// Load configuration from a file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;

        // Try JSON first, then TOML
        if path.extension().is_some_and(|e| e == "json") {
            Ok(serde_json::from_str(&content)?)
        } else {
            toml::from_str(&content)
                .map_err(|e| Error::config_error(format!("Failed to parse config: {e}")))
        }
    }

    /// Resolve a request target: absolute URLs pass through, anything else
    /// is joined onto the base URL.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] for a relative target without a base
    /// URL, or [`Error::UrlParse`] if the target cannot be joined.
    pub fn resolve(&self, target: &str) -> Result<Url> {
        match Url::parse(target) {
            Ok(url) => Ok(url),
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                let base = self
                    .base_url
                    .as_ref()
                    .ok_or_else(|| Error::config_error("No base URL configured"))?;
                Ok(base.join(target)?)
            }
            Err(e) => Err(e.into()),
        }
    }
}

fn default_renewal_path() -> String {
    "/auth/refresh".to_string()
}

fn default_tenant_header() -> String {
    "x-tenant-code".to_string()
}

const fn default_timeout() -> Duration {
    Duration::from_secs(30)
}

/// Serialization helper for Duration as seconds.
mod duration_secs {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs().serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
