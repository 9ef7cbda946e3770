//! Lockout engine configuration
//!
//! Controls attempt thresholds, progressive lockout windows, and the
//! garbage-collection schedule. All durations are in seconds.

use serde::{Deserialize, Serialize};

/// Lockout engine configuration
///
/// # Example (config.toml)
///
/// ```toml
/// [lockout]
/// enabled = true
/// max_attempts = 5
/// base_lockout_secs = 900
/// max_lockout_secs = 86400
/// backoff_cap_exponent = 10
/// warning_threshold = 3
/// gc_interval_secs = 3600
/// retention_secs = 86400
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[non_exhaustive]
pub struct LockoutConfig {
    /// Whether lockout enforcement is enabled
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Maximum failed attempts on a tracking key before it is locked
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Duration in seconds of the first lockout window
    #[serde(default = "default_base_lockout_secs")]
    pub base_lockout_secs: u64,

    /// Absolute ceiling in seconds on any escalated lockout window
    #[serde(default = "default_max_lockout_secs")]
    pub max_lockout_secs: u64,

    /// Bound on the doubling exponent (window = base * 2^min(locks - 1, cap))
    #[serde(default = "default_backoff_cap_exponent")]
    pub backoff_cap_exponent: u32,

    /// Failed attempts before a warning notification is sent (0 = disabled)
    #[serde(default = "default_warning_threshold")]
    pub warning_threshold: u32,

    /// Seconds between garbage-collection sweeps
    #[serde(default = "default_gc_interval_secs")]
    pub gc_interval_secs: u64,

    /// Seconds an unlocked record may go without a failed attempt before
    /// the sweep deletes it
    #[serde(default = "default_retention_secs")]
    pub retention_secs: u64,
}

impl LockoutConfig {
    /// Validate the configuration, returning an error message if invalid
    pub fn validate(&self) -> Result<(), String> {
        if self.max_attempts == 0 {
            return Err("max_attempts must be greater than 0".to_string());
        }
        if self.base_lockout_secs == 0 {
            return Err("base_lockout_secs must be greater than 0".to_string());
        }
        if self.max_lockout_secs < self.base_lockout_secs {
            return Err("max_lockout_secs must not be less than base_lockout_secs".to_string());
        }
        if self.backoff_cap_exponent > 32 {
            return Err("backoff_cap_exponent must not exceed 32".to_string());
        }
        if self.gc_interval_secs == 0 {
            return Err("gc_interval_secs must be greater than 0".to_string());
        }
        if self.retention_secs == 0 {
            return Err("retention_secs must be greater than 0".to_string());
        }
        Ok(())
    }
}

impl Default for LockoutConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_attempts: default_max_attempts(),
            base_lockout_secs: default_base_lockout_secs(),
            max_lockout_secs: default_max_lockout_secs(),
            backoff_cap_exponent: default_backoff_cap_exponent(),
            warning_threshold: default_warning_threshold(),
            gc_interval_secs: default_gc_interval_secs(),
            retention_secs: default_retention_secs(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_max_attempts() -> u32 {
    5
}

fn default_base_lockout_secs() -> u64 {
    900 // 15 minutes
}

fn default_max_lockout_secs() -> u64 {
    86_400 // 24 hours
}

fn default_backoff_cap_exponent() -> u32 {
    10
}

fn default_warning_threshold() -> u32 {
    3
}

fn default_gc_interval_secs() -> u64 {
    3600 // hourly
}

fn default_retention_secs() -> u64 {
    86_400 // 24 hours
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LockoutConfig::default();
        assert!(config.enabled);
        assert_eq!(config.max_attempts, 5);
        assert_eq!(config.base_lockout_secs, 900);
        assert_eq!(config.max_lockout_secs, 86_400);
        assert_eq!(config.backoff_cap_exponent, 10);
        assert_eq!(config.warning_threshold, 3);
        assert_eq!(config.gc_interval_secs, 3600);
        assert_eq!(config.retention_secs, 86_400);
    }

    #[test]
    fn test_validate_valid_config() {
        let config = LockoutConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_zero_max_attempts() {
        let mut config = LockoutConfig::default();
        config.max_attempts = 0;
        assert_eq!(
            config.validate(),
            Err("max_attempts must be greater than 0".to_string())
        );
    }

    #[test]
    fn test_validate_zero_base_lockout() {
        let mut config = LockoutConfig::default();
        config.base_lockout_secs = 0;
        assert_eq!(
            config.validate(),
            Err("base_lockout_secs must be greater than 0".to_string())
        );
    }

    #[test]
    fn test_validate_ceiling_below_base() {
        let mut config = LockoutConfig::default();
        config.base_lockout_secs = 900;
        config.max_lockout_secs = 600;
        assert_eq!(
            config.validate(),
            Err("max_lockout_secs must not be less than base_lockout_secs".to_string())
        );
    }

    #[test]
    fn test_validate_oversized_cap_exponent() {
        let mut config = LockoutConfig::default();
        config.backoff_cap_exponent = 33;
        assert_eq!(
            config.validate(),
            Err("backoff_cap_exponent must not exceed 32".to_string())
        );
    }

    #[test]
    fn test_validate_zero_gc_interval() {
        let mut config = LockoutConfig::default();
        config.gc_interval_secs = 0;
        assert_eq!(
            config.validate(),
            Err("gc_interval_secs must be greater than 0".to_string())
        );
    }

    #[test]
    fn test_validate_zero_retention() {
        let mut config = LockoutConfig::default();
        config.retention_secs = 0;
        assert_eq!(
            config.validate(),
            Err("retention_secs must be greater than 0".to_string())
        );
    }

    #[test]
    fn test_serde_roundtrip() {
        let config = LockoutConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let deserialized: LockoutConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized.max_attempts, config.max_attempts);
        assert_eq!(deserialized.base_lockout_secs, config.base_lockout_secs);
        assert_eq!(deserialized.retention_secs, config.retention_secs);
    }
}
