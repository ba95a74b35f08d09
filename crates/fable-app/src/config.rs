//! # App Configuration
//!
//! Configuration for the Fable client.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     FABLE_API_URL=https://api.fable.example/v1/                        │
//! │     FABLE_DB_PATH=/tmp/fable.db                                        │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/fable/fable.toml (Linux)                                 │
//! │     ~/Library/Application Support/com.fable.client/fable.toml (macOS)  │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # fable.toml
//! [api]
//! base_url = "https://api.fable.example/v1/"
//! request_timeout_secs = 15
//!
//! [cache]
//! # database_path defaults to the platform data dir when omitted
//! max_age_minutes = 5
//!
//! [log]
//! filter = "fable=debug,info"
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info, warn};

use crate::error::{AppError, AppResult};

// =============================================================================
// API Settings
// =============================================================================

/// Settings for the backend API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiSettings {
    /// Base URL of the backend. Must end with a slash so endpoint paths
    /// join underneath it.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout (seconds).
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_base_url() -> String {
    "https://api.fable.example/v1/".to_string()
}

fn default_request_timeout() -> u64 {
    15
}

impl Default for ApiSettings {
    fn default() -> Self {
        ApiSettings {
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

// =============================================================================
// Cache Settings
// =============================================================================

/// Settings for the local cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheSettings {
    /// Path to the SQLite database file.
    /// Defaults to `<platform data dir>/fable.db` when omitted.
    #[serde(default)]
    pub database_path: Option<PathBuf>,

    /// Maximum cache age before a resource is considered stale (minutes).
    #[serde(default = "default_max_age")]
    pub max_age_minutes: i64,
}

fn default_max_age() -> i64 {
    fable_sync::policy::DEFAULT_MAX_AGE_MINUTES
}

impl Default for CacheSettings {
    fn default() -> Self {
        CacheSettings {
            database_path: None,
            max_age_minutes: default_max_age(),
        }
    }
}

// =============================================================================
// Log Settings
// =============================================================================

/// Settings for tracing output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogSettings {
    /// EnvFilter directive string, overridable via `RUST_LOG`.
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

fn default_log_filter() -> String {
    "fable=info,warn".to_string()
}

impl Default for LogSettings {
    fn default() -> Self {
        LogSettings {
            filter: default_log_filter(),
        }
    }
}

// =============================================================================
// Main App Configuration
// =============================================================================

/// Complete app configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Backend API settings.
    #[serde(default)]
    pub api: ApiSettings,

    /// Local cache settings.
    #[serde(default)]
    pub cache: CacheSettings,

    /// Logging settings.
    #[serde(default)]
    pub log: LogSettings,
}

impl AppConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (fable.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> AppResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns defaults if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> AppResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| AppError::InvalidConfig("no config path available".to_string()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)?;

        info!(?path, "Config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> AppResult<()> {
        let url = url::Url::parse(&self.api.base_url)
            .map_err(|e| AppError::InvalidConfig(format!("api.base_url: {e}")))?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(AppError::InvalidConfig(format!(
                "api.base_url must be http(s), got scheme '{}'",
                url.scheme()
            )));
        }
        if !url.path().ends_with('/') {
            return Err(AppError::InvalidConfig(
                "api.base_url must end with '/' so endpoint paths join under it".to_string(),
            ));
        }

        if self.api.request_timeout_secs == 0 {
            return Err(AppError::InvalidConfig(
                "api.request_timeout_secs must be greater than 0".to_string(),
            ));
        }
        if self.cache.max_age_minutes < 0 {
            return Err(AppError::InvalidConfig(
                "cache.max_age_minutes must not be negative".to_string(),
            ));
        }

        Ok(())
    }

    /// Applies environment variable overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("FABLE_API_URL") {
            debug!(url = %url, "Overriding API URL from environment");
            self.api.base_url = url;
        }

        if let Ok(path) = std::env::var("FABLE_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.cache.database_path = Some(PathBuf::from(path));
        }

        if let Ok(minutes) = std::env::var("FABLE_MAX_AGE_MINUTES") {
            if let Ok(m) = minutes.parse::<i64>() {
                self.cache.max_age_minutes = m;
            }
        }

        if let Ok(filter) = std::env::var("FABLE_LOG") {
            self.log.filter = filter;
        }
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "fable", "client")
            .map(|dirs| dirs.config_dir().join("fable.toml"))
    }

    /// Resolves the database path: configured value or the platform data dir.
    pub fn database_path(&self) -> AppResult<PathBuf> {
        if let Some(path) = &self.cache.database_path {
            return Ok(path.clone());
        }

        let dirs = directories::ProjectDirs::from("com", "fable", "client")
            .ok_or_else(|| AppError::InvalidConfig("no platform data dir available".to_string()))?;
        Ok(dirs.data_dir().join("fable.db"))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_validates() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.cache.max_age_minutes, 5);
    }

    #[test]
    fn test_validation_rejects_bad_urls() {
        let mut config = AppConfig::default();

        config.api.base_url = "not a url".to_string();
        assert!(config.validate().is_err());

        config.api.base_url = "ftp://example.com/".to_string();
        assert!(config.validate().is_err());

        // Missing trailing slash would silently drop the last path segment
        // on join, so it is rejected outright.
        config.api.base_url = "https://api.example.com/v1".to_string();
        assert!(config.validate().is_err());

        config.api.base_url = "https://api.example.com/v1/".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [api]
            base_url = "http://localhost:8000/v1/"
            "#,
        )
        .unwrap();

        assert_eq!(config.api.base_url, "http://localhost:8000/v1/");
        assert_eq!(config.api.request_timeout_secs, 15);
        assert_eq!(config.cache.max_age_minutes, 5);
    }

    #[test]
    fn test_toml_round_trip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[api]"));
        assert!(toml_str.contains("[cache]"));
        assert!(toml_str.contains("[log]"));
    }
}
