//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (WISP_*)
//! 2. TOML config file (if WISP_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// User agent sent when nothing else is configured.
pub const DEFAULT_USER_AGENT: &str = "wisp/0.1 (toy browser)";

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (WISP_*)
/// 2. TOML config file (if WISP_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// User-Agent string for HTTP requests.
    ///
    /// Set via WISP_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Document opened for `file://` locators with an empty path and when no
    /// locator is given at all.
    ///
    /// Set via WISP_DEFAULT_DOCUMENT environment variable.
    #[serde(default = "default_document")]
    pub default_document: PathBuf,

    /// Maximum number of redirects to follow. Zero disables redirect following.
    ///
    /// Set via WISP_MAX_REDIRECTS environment variable.
    #[serde(default)]
    pub max_redirects: usize,

    /// Maximum response body size in bytes.
    ///
    /// Set via WISP_MAX_BYTES environment variable.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.into()
}

fn default_document() -> PathBuf {
    PathBuf::from("./default.html")
}

fn default_max_bytes() -> usize {
    5_242_880 // 5MB
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            default_document: default_document(),
            max_redirects: 0,
            max_bytes: default_max_bytes(),
        }
    }
}

impl AppConfig {
    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `WISP_`
    /// 2. TOML file from `WISP_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_figment(Self::figment())
    }

    /// The layered figment `load` extracts from.
    pub fn figment() -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("WISP_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment.merge(Env::prefixed("WISP_").ignore(&["CONFIG_FILE"]))
    }

    /// Extract and validate a configuration from an arbitrary figment.
    pub fn from_figment(figment: Figment) -> Result<Self, ConfigError> {
        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}
