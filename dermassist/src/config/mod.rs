//! Configuration management
//!
//! Configuration is layered with figment, lowest to highest precedence:
//!
//! 1. Hardcoded defaults
//! 2. `/etc/dermassist/config.toml` (system config)
//! 3. `~/.config/dermassist/config.toml` (user config, XDG)
//! 4. `./dermassist.toml` (working directory)
//! 5. Environment variables (`DERMASSIST_` prefix, `__` for nesting)
//!
//! Command-line flags are applied by the binary on top of the loaded value.
//!
//! # Example Configuration
//!
//! ```toml
//! # dermassist.toml
//! backend_url = "https://derm.example.com"
//! request_timeout_ms = 15000
//! preview_dir = "/tmp/dermassist-previews"
//! ```
//!
//! # Usage
//!
//! ```rust
//! use dermassist::config::DermAssistConfig;
//!
//! let config = DermAssistConfig::default();
//! assert_eq!(config.backend_url, "http://localhost:8000");
//! assert_eq!(config.request_timeout().as_secs(), 30);
//! ```

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Environment variable prefix
const ENV_PREFIX: &str = "DERMASSIST_";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A source could not be read or did not match the expected shape
    #[error("failed to load configuration: {0}")]
    Load(#[source] Box<figment::Error>),

    /// The backend URL is not an absolute http(s) URL
    #[error("invalid backend URL '{url}': {reason}")]
    InvalidBackendUrl {
        /// The configured value
        url: String,
        /// Why it was rejected
        reason: String,
    },

    /// The request timeout is zero
    #[error("request_timeout_ms must be greater than zero")]
    ZeroTimeout,
}

impl From<figment::Error> for ConfigError {
    fn from(error: figment::Error) -> Self {
        Self::Load(Box::new(error))
    }
}

/// Client configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DermAssistConfig {
    /// Base URL of the analysis service; `/analyze` is appended
    pub backend_url: String,

    /// Per-request timeout in milliseconds
    pub request_timeout_ms: u64,

    /// Directory for file previews; a per-process temp dir when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview_dir: Option<PathBuf>,
}

impl Default for DermAssistConfig {
    fn default() -> Self {
        Self {
            backend_url: "http://localhost:8000".to_string(),
            request_timeout_ms: 30_000,
            preview_dir: None,
        }
    }
}

impl DermAssistConfig {
    /// Loads configuration from every standard location
    ///
    /// Missing files are skipped. See the module docs for precedence.
    ///
    /// # Errors
    ///
    /// Returns an error if a file cannot be parsed, an environment variable
    /// has the wrong type, or the result fails [`DermAssistConfig::validate`].
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Self::defaults();

        let candidates = [
            Some(PathBuf::from("/etc/dermassist/config.toml")),
            dirs::config_dir().map(|dir| dir.join("dermassist").join("config.toml")),
            Some(PathBuf::from("./dermassist.toml")),
        ];
        for path in candidates.into_iter().flatten() {
            if path.exists() {
                tracing::debug!(path = %path.display(), "Merging config file");
                figment = figment.merge(Toml::file(path));
            }
        }

        Self::finish(figment.merge(Self::env()))
    }

    /// Loads configuration from one explicit file plus the environment
    ///
    /// # Errors
    ///
    /// Returns an error if the file does not exist or cannot be parsed, or
    /// the result fails [`DermAssistConfig::validate`].
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let figment = Self::defaults()
            .merge(Toml::file_exact(path.as_ref()))
            .merge(Self::env());
        Self::finish(figment)
    }

    /// Where the user config file lives on this platform
    ///
    /// # Example
    ///
    /// ```rust
    /// use dermassist::config::DermAssistConfig;
    ///
    /// let path = DermAssistConfig::recommended_path();
    /// assert!(path.ends_with("config.toml") || path.ends_with("dermassist.toml"));
    /// ```
    #[must_use]
    pub fn recommended_path() -> PathBuf {
        dirs::config_dir().map_or_else(
            || PathBuf::from("./dermassist.toml"),
            |config_dir| config_dir.join("dermassist").join("config.toml"),
        )
    }

    /// Checks values serde cannot
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidBackendUrl`] or
    /// [`ConfigError::ZeroTimeout`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.backend_url()?;
        if self.request_timeout_ms == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        Ok(())
    }

    /// The backend base URL, parsed
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidBackendUrl`] unless the value is an
    /// absolute `http` or `https` URL.
    pub fn backend_url(&self) -> Result<Url, ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidBackendUrl {
            url: self.backend_url.clone(),
            reason,
        };

        let url = Url::parse(self.backend_url.trim()).map_err(|e| invalid(e.to_string()))?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(invalid(format!("unsupported scheme '{other}'"))),
        }
    }

    /// Per-request timeout
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    fn defaults() -> Figment {
        Figment::from(Serialized::defaults(Self::default()))
    }

    fn env() -> Env {
        Env::prefixed(ENV_PREFIX).split("__").lowercase(true)
    }

    fn finish(figment: Figment) -> Result<Self, ConfigError> {
        let config: Self = figment.extract()?;
        config.validate()?;
        Ok(config)
    }
}
