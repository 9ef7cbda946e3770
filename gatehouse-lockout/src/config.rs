//! Configuration management using Figment
//!
//! Configuration is loaded from multiple sources with the following
//! precedence (highest to lowest):
//! 1. Environment variables (prefix: GATEHOUSE_)
//! 2. Current working directory: ./config.toml
//! 3. Default values

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::lockout::LockoutConfig;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Service configuration
    #[serde(default)]
    pub service: ServiceConfig,

    /// Lockout engine configuration
    #[serde(default)]
    pub lockout: LockoutConfig,
}

/// Service-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Service name
    #[serde(default = "default_service_name")]
    pub name: String,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Environment (dev, staging, production)
    #[serde(default = "default_environment")]
    pub environment: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service: ServiceConfig::default(),
            lockout: LockoutConfig::default(),
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            log_level: default_log_level(),
            environment: default_environment(),
        }
    }
}

impl Config {
    /// Load configuration from all sources
    ///
    /// Reads `./config.toml` if present; environment variables
    /// (GATEHOUSE_ prefix) override file-based values.
    pub fn load() -> Result<Self> {
        Self::load_from("config.toml")
    }

    /// Load configuration from a specific file
    ///
    /// Useful for testing or non-standard deployments. The lockout section
    /// is validated after extraction.
    pub fn load_from(path: &str) -> Result<Self> {
        let config: Config = Figment::new()
            // Start with defaults
            .merge(Serialized::defaults(Config::default()))
            // Load from config file (if exists)
            .merge(Toml::file(path))
            // Override with environment variables
            .merge(Env::prefixed("GATEHOUSE_").split("_"))
            .extract()?;

        config.lockout.validate().map_err(Error::InvalidConfig)?;
        Ok(config)
    }
}

fn default_service_name() -> String {
    "gatehouse".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_environment() -> String {
    "dev".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.service.name, "gatehouse");
        assert_eq!(config.service.log_level, "info");
        assert_eq!(config.service.environment, "dev");
        assert_eq!(config.lockout.max_attempts, 5);
    }

    #[test]
    fn test_load_from_missing_file_uses_defaults() {
        let config = Config::load_from("/nonexistent/config.toml").unwrap();
        assert_eq!(config.lockout.max_attempts, 5);
        assert_eq!(config.lockout.base_lockout_secs, 900);
    }

    #[test]
    fn test_load_from_file_overrides_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[service]
name = "login-gateway"

[lockout]
max_attempts = 3
base_lockout_secs = 60
"#
        )
        .unwrap();

        let config = Config::load_from(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.service.name, "login-gateway");
        assert_eq!(config.lockout.max_attempts, 3);
        assert_eq!(config.lockout.base_lockout_secs, 60);
        // Untouched fields keep their defaults
        assert_eq!(config.lockout.retention_secs, 86_400);
    }

    #[test]
    fn test_load_from_rejects_invalid_lockout_section() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[lockout]
max_attempts = 0
"#
        )
        .unwrap();

        let err = Config::load_from(file.path().to_str().unwrap()).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }
}
