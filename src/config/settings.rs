//! Configuration settings and validation.

use std::path::PathBuf;
use std::time::Duration;

use crate::{Error, Result};

/// Configuration for the plugin substrate.
///
/// The hosting core owns one of these and hands it to plugins through
/// [`crate::plugin::ServerCore::config`].
#[derive(Debug, Clone)]
pub struct Config {
    /// Root of the managed configuration repository (the datastore).
    pub repository: PathBuf,

    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Capacity of each plugin's statistics work queue.
    pub stats_capacity: usize,

    /// Dequeue timeout for the statistics worker; bounds how long shutdown
    /// takes to be observed, nothing more.
    pub dequeue_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            repository: PathBuf::from("/var/lib/cfgplugin"),
            log_level: "info".to_string(),
            stats_capacity: 10,
            dequeue_timeout: Duration::from_secs(1),
        }
    }
}

impl Config {
    /// Create a configuration rooted at the given repository path.
    #[must_use]
    pub fn new(repository: impl Into<PathBuf>) -> Self {
        Self {
            repository: repository.into(),
            ..Self::default()
        }
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration value is invalid.
    pub fn validate(&self) -> Result<()> {
        if self.repository.as_os_str().is_empty() {
            return Err(Error::config("repository path cannot be empty"));
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.to_lowercase().as_str()) {
            return Err(Error::config(format!(
                "invalid log level '{}', must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            )));
        }

        if self.stats_capacity == 0 {
            return Err(Error::config("stats_capacity cannot be 0"));
        }

        if self.dequeue_timeout.is_zero() {
            return Err(Error::config("dequeue_timeout cannot be zero"));
        }

        Ok(())
    }

    /// Get the data directory for a named plugin.
    #[must_use]
    pub fn plugin_data_dir(&self, name: &str) -> PathBuf {
        self.repository.join(name)
    }

    /// Get the pending-snapshot path for a named plugin.
    #[must_use]
    pub fn pending_path(&self, name: &str) -> PathBuf {
        self.plugin_data_dir(name).join("pending.json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.stats_capacity, 10);
        assert_eq!(config.dequeue_timeout, Duration::from_secs(1));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_empty_repository() {
        let config = Config {
            repository: PathBuf::new(),
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("repository"));
    }

    #[test]
    fn test_validate_invalid_log_level() {
        let config = Config {
            log_level: "noisy".to_string(),
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("log level"));
    }

    #[test]
    fn test_validate_zero_capacity() {
        let config = Config {
            stats_capacity: 0,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("stats_capacity"));
    }

    #[test]
    fn test_validate_zero_timeout() {
        let config = Config {
            dequeue_timeout: Duration::ZERO,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("dequeue_timeout"));
    }

    #[test]
    fn test_plugin_paths() {
        let config = Config::new("/repo");
        assert_eq!(config.plugin_data_dir("Statistics"), PathBuf::from("/repo/Statistics"));
        assert_eq!(
            config.pending_path("Statistics"),
            PathBuf::from("/repo/Statistics/pending.json")
        );
    }
}
