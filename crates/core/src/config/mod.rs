//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (PRICESCOUT_*)
//! 2. Bare `PROXY_URL` (proxy only)
//! 3. TOML config file (if PRICESCOUT_CONFIG_FILE set)
//! 4. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (PRICESCOUT_*)
/// 2. TOML config file (if PRICESCOUT_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the JSON result cache.
    ///
    /// Set via PRICESCOUT_CACHE_PATH environment variable.
    #[serde(default = "default_cache_path")]
    pub cache_path: PathBuf,

    /// Fixed User-Agent string. When unset the page client rotates
    /// through a built-in list of browser User-Agents.
    ///
    /// Set via PRICESCOUT_USER_AGENT environment variable.
    #[serde(default)]
    pub user_agent: Option<String>,

    /// Page load ceiling in milliseconds.
    ///
    /// Set via PRICESCOUT_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Largest page body accepted, in bytes.
    ///
    /// Set via PRICESCOUT_MAX_BYTES environment variable.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// Lower bound of the per-host pacing delay in milliseconds.
    #[serde(default = "default_min_delay_ms")]
    pub min_delay_ms: u64,

    /// Upper bound of the per-host pacing delay in milliseconds.
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    /// Additional attempts after a soft-blocked page.
    ///
    /// Set via PRICESCOUT_MAX_RETRIES environment variable.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Optional proxy for all page requests.
    ///
    /// Set via PRICESCOUT_PROXY_URL, or PROXY_URL as a fallback.
    #[serde(default)]
    pub proxy_url: Option<String>,

    /// Sites to resolve against, in order.
    ///
    /// Set via PRICESCOUT_SITES as a TOML array, e.g. `["emag","altex"]`.
    #[serde(default = "default_sites")]
    pub sites: Vec<String>,
}

fn default_cache_path() -> PathBuf {
    PathBuf::from("./data/cache.json")
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_max_bytes() -> usize {
    5 * 1024 * 1024
}

fn default_min_delay_ms() -> u64 {
    2_000
}

fn default_max_delay_ms() -> u64 {
    5_000
}

fn default_max_retries() -> u32 {
    2
}

fn default_sites() -> Vec<String> {
    ["pcgarage", "vexio", "altex", "emag"].into_iter().map(String::from).collect()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            cache_path: default_cache_path(),
            user_agent: None,
            timeout_ms: default_timeout_ms(),
            max_bytes: default_max_bytes(),
            min_delay_ms: default_min_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            max_retries: default_max_retries(),
            proxy_url: None,
            sites: default_sites(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Per-host pacing delay bounds.
    pub fn delay_range(&self) -> (Duration, Duration) {
        (Duration::from_millis(self.min_delay_ms), Duration::from_millis(self.max_delay_ms))
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `PRICESCOUT_`
    /// 2. `PROXY_URL` (proxy only)
    /// 3. TOML file from `PRICESCOUT_CONFIG_FILE` (if set)
    /// 4. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("PRICESCOUT_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(Env::raw().only(&["proxy_url"]));

        figment = figment.merge(
            Env::prefixed("PRICESCOUT_")
                .ignore(&["config_file"])
                .map(|key| key.as_str().to_lowercase().into()),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}
