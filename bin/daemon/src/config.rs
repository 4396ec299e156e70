//! Centralized daemon configuration.
//!
//! This module provides strongly-typed configuration for the daemon,
//! loaded via the `config` crate from environment variables. Library
//! crates never read the environment; everything they need arrives
//! through constructor arguments wired up in `main`.

use serde::Deserialize;

/// Daemon configuration loaded from the environment.
#[derive(Debug, Deserialize)]
pub struct DaemonConfig {
    /// PostgreSQL database connection URL.
    pub database_url: String,

    /// Log filter used when RUST_LOG is not set.
    #[serde(default = "default_log_filter")]
    pub log_filter: String,

    /// Interval between active-flow reloads from the store, in seconds.
    /// Reloads pick up flows edited by other services sharing the database.
    #[serde(default = "default_reload_interval_seconds")]
    pub reload_interval_seconds: u64,

    /// Instagram Graph API configuration.
    #[serde(default)]
    pub instagram: InstagramConfig,
}

/// Instagram Graph API settings.
#[derive(Debug, Clone, Deserialize)]
pub struct InstagramConfig {
    /// Base URL for API calls. Overridable for staging environments.
    #[serde(default = "default_instagram_base_url")]
    pub base_url: String,

    /// Request timeout in seconds.
    #[serde(default = "default_instagram_timeout_seconds")]
    pub timeout_seconds: u64,
}

fn default_log_filter() -> String {
    "info".to_string()
}

fn default_reload_interval_seconds() -> u64 {
    300
}

fn default_instagram_base_url() -> String {
    "https://graph.instagram.com".to_string()
}

fn default_instagram_timeout_seconds() -> u64 {
    10
}

impl Default for InstagramConfig {
    fn default() -> Self {
        Self {
            base_url: default_instagram_base_url(),
            timeout_seconds: default_instagram_timeout_seconds(),
        }
    }
}

impl DaemonConfig {
    /// Loads configuration from environment variables.
    ///
    /// Nested fields use `__` as the separator, e.g.
    /// `INSTAGRAM__TIMEOUT_SECONDS`.
    ///
    /// # Errors
    ///
    /// Returns an error if required configuration is missing or invalid.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(
                config::Environment::default()
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instagram_config_has_correct_defaults() {
        let config = InstagramConfig::default();
        assert_eq!(config.base_url, "https://graph.instagram.com");
        assert_eq!(config.timeout_seconds, 10);
    }

    #[test]
    fn top_level_defaults() {
        assert_eq!(default_log_filter(), "info");
        assert_eq!(default_reload_interval_seconds(), 300);
    }
}
