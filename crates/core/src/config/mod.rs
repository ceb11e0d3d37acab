//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (MDSCRAPE_*)
//! 2. TOML config file (if MDSCRAPE_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// When a navigation counts as finished.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NavigationPolicy {
    /// Return as soon as the DOM is parsed. Faster, may miss async content.
    #[default]
    DomReady,
    /// Wait for the load event and a quiet network. Slower, more complete.
    NetworkIdle,
}

/// Which part of the rendered page is snapshotted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotScope {
    /// `document.body.innerHTML`
    #[default]
    Body,
    /// `document.documentElement.outerHTML`
    Document,
}

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (MDSCRAPE_*)
/// 2. TOML config file (if MDSCRAPE_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Explicit Chrome/Chromium binary. Auto-detected when unset.
    ///
    /// Set via MDSCRAPE_CHROME_EXECUTABLE environment variable.
    #[serde(default)]
    pub chrome_executable: Option<PathBuf>,

    /// Launch the browser without its sandbox (required in most containers).
    #[serde(default = "default_true")]
    pub no_sandbox: bool,

    /// Navigation completion policy.
    ///
    /// Set via MDSCRAPE_NAVIGATION environment variable (`dom_ready` or `network_idle`).
    #[serde(default)]
    pub navigation: NavigationPolicy,

    /// Navigation timeout in milliseconds. Must be shorter than the request deadline.
    #[serde(default = "default_navigation_timeout_ms")]
    pub navigation_timeout_ms: u64,

    /// Hard end-to-end deadline per request in milliseconds.
    ///
    /// Set via MDSCRAPE_REQUEST_TIMEOUT_MS environment variable.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    #[serde(default)]
    pub snapshot_scope: SnapshotScope,

    /// Also strip nav/header/footer/aside and common ad containers from the snapshot.
    #[serde(default)]
    pub strip_noise: bool,

    /// Run the "load more" / scroll pass after navigation.
    #[serde(default)]
    pub lazy_load: bool,

    /// CSS selector of the "load more" trigger.
    #[serde(default = "default_load_more_selector")]
    pub load_more_selector: String,

    /// Upper bound on trigger clicks per page.
    #[serde(default = "default_lazy_max_rounds")]
    pub lazy_max_rounds: u32,

    /// Wait after each click or scroll, in milliseconds.
    #[serde(default = "default_lazy_settle_ms")]
    pub lazy_settle_ms: u64,

    /// Extracted text shorter than this is treated as a failed extraction.
    #[serde(default = "default_min_content_chars")]
    pub min_content_chars: usize,

    /// Default chunk size in characters.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Maximum number of cached pages.
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,

    /// Cache time-to-live in seconds.
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
}

fn default_true() -> bool {
    true
}

fn default_navigation_timeout_ms() -> u64 {
    15_000
}

fn default_request_timeout_ms() -> u64 {
    30_000
}

fn default_load_more_selector() -> String {
    "button.load-more, a.load-more, [data-load-more]".into()
}

fn default_lazy_max_rounds() -> u32 {
    5
}

fn default_lazy_settle_ms() -> u64 {
    1_000
}

fn default_min_content_chars() -> usize {
    200
}

fn default_chunk_size() -> usize {
    2_000
}

fn default_cache_capacity() -> usize {
    100
}

fn default_cache_ttl_secs() -> u64 {
    600 // 10 min
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            chrome_executable: None,
            no_sandbox: true,
            navigation: NavigationPolicy::default(),
            navigation_timeout_ms: default_navigation_timeout_ms(),
            request_timeout_ms: default_request_timeout_ms(),
            snapshot_scope: SnapshotScope::default(),
            strip_noise: false,
            lazy_load: false,
            load_more_selector: default_load_more_selector(),
            lazy_max_rounds: default_lazy_max_rounds(),
            lazy_settle_ms: default_lazy_settle_ms(),
            min_content_chars: default_min_content_chars(),
            chunk_size: default_chunk_size(),
            cache_capacity: default_cache_capacity(),
            cache_ttl_secs: default_cache_ttl_secs(),
        }
    }
}

impl AppConfig {
    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_millis(self.navigation_timeout_ms)
    }

    /// The coordinator's hard deadline.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn lazy_settle(&self) -> Duration {
        Duration::from_millis(self.lazy_settle_ms)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `MDSCRAPE_`
    /// 2. TOML file from `MDSCRAPE_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("MDSCRAPE_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("MDSCRAPE_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}
