// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Configuration for the search engine.
//!
//! Loaded from an optional TOML file overlaid with `SEARCH_`-prefixed
//! environment variables (`SEARCH_REDIS_URL`, `SEARCH_BATCH_SIZE`, ...).
//!
//! # Example
//!
//! ```
//! use search_engine::SearchEngineConfig;
//!
//! // Minimal config (uses defaults)
//! let config = SearchEngineConfig::default();
//! assert_eq!(config.redis_url, "redis://localhost:6379");
//! assert_eq!(config.batch_size, 1000);
//!
//! // Override what you need
//! let config = SearchEngineConfig {
//!     page_limit: 100,
//!     escape_terms: true,
//!     ..Default::default()
//! };
//! # let _ = config;
//! ```

use std::path::Path;

use figment::providers::{Env, Format, Toml};
use figment::Figment;
use serde::Deserialize;
use thiserror::Error;

use crate::batching::pipeline_batcher::BatchConfig;
use crate::search::TermEscaping;

/// Default config file, looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "search-engine.toml";
/// Environment variable prefix
pub const ENV_PREFIX: &str = "SEARCH_";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] figment::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Configuration for the search engine.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SearchEngineConfig {
    /// Redis connection string (e.g., "redis://localhost:6379")
    #[serde(default = "default_redis_url")]
    pub redis_url: String,

    /// Records per pipelined write batch
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Also flush a batch once its commands reach this many bytes
    #[serde(default)]
    pub batch_bytes: Option<usize>,

    /// Maximum records returned by a search
    #[serde(default = "default_page_limit")]
    pub page_limit: usize,

    /// Backslash-escape query syntax in user terms and tag values
    #[serde(default)]
    pub escape_terms: bool,
}

fn default_redis_url() -> String { "redis://localhost:6379".to_string() }
fn default_batch_size() -> usize { 1000 }
fn default_page_limit() -> usize { 40 }

impl Default for SearchEngineConfig {
    fn default() -> Self {
        Self {
            redis_url: default_redis_url(),
            batch_size: default_batch_size(),
            batch_bytes: None,
            page_limit: default_page_limit(),
            escape_terms: false,
        }
    }
}

impl SearchEngineConfig {
    /// Load from [`DEFAULT_CONFIG_FILE`] (if present) and the environment
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_file(DEFAULT_CONFIG_FILE)
    }

    /// Load from a TOML file (missing file is fine) and the environment
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let config: Self = Figment::new()
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed(ENV_PREFIX))
            .extract()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.redis_url.trim().is_empty() {
            return Err(ConfigError::Invalid("redis_url must not be empty".into()));
        }
        if self.batch_size == 0 {
            return Err(ConfigError::Invalid("batch_size must be at least 1".into()));
        }
        if self.batch_bytes == Some(0) {
            return Err(ConfigError::Invalid("batch_bytes must be at least 1".into()));
        }
        if self.page_limit == 0 {
            return Err(ConfigError::Invalid("page_limit must be at least 1".into()));
        }
        Ok(())
    }

    pub fn batch_config(&self) -> BatchConfig {
        BatchConfig::with_count(self.batch_size).with_bytes(self.batch_bytes)
    }

    pub fn term_escaping(&self) -> TermEscaping {
        if self.escape_terms {
            TermEscaping::Escape
        } else {
            TermEscaping::Verbatim
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn test_defaults() {
        let config = SearchEngineConfig::default();
        assert_eq!(config.page_limit, 40);
        assert!(!config.escape_terms);
        assert_eq!(config.term_escaping(), TermEscaping::Verbatim);
        assert_eq!(config.batch_config().flush_bytes, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        Jail::expect_with(|_jail| {
            let config = SearchEngineConfig::from_file("absent.toml").unwrap();
            assert_eq!(config, SearchEngineConfig::default());
            Ok(())
        });
    }

    #[test]
    fn test_file_and_env_overlay() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "search.toml",
                r#"
                redis_url = "redis://cache:6380"
                batch_size = 250
                "#,
            )?;
            jail.set_env("SEARCH_BATCH_SIZE", "500");
            jail.set_env("SEARCH_ESCAPE_TERMS", "true");
            jail.set_env("SEARCH_BATCH_BYTES", "65536");

            let config = SearchEngineConfig::from_file("search.toml").unwrap();
            assert_eq!(config.redis_url, "redis://cache:6380");
            assert_eq!(config.batch_size, 500);
            assert_eq!(config.page_limit, 40);
            assert_eq!(config.term_escaping(), TermEscaping::Escape);
            assert_eq!(config.batch_config().flush_count, 500);
            assert_eq!(config.batch_config().flush_bytes, Some(65536));
            Ok(())
        });
    }

    #[test]
    fn test_invalid_values_rejected() {
        Jail::expect_with(|jail| {
            jail.set_env("SEARCH_PAGE_LIMIT", "0");
            let err = SearchEngineConfig::load().unwrap_err();
            assert!(matches!(err, ConfigError::Invalid(_)));

            jail.set_env("SEARCH_PAGE_LIMIT", "lots");
            let err = SearchEngineConfig::load().unwrap_err();
            assert!(matches!(err, ConfigError::Load(_)));
            Ok(())
        });
    }
}
