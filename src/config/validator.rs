//! Configuration validator for verpatch
//!
//! Validates configuration values to ensure they are within acceptable ranges.

use super::loader::{Config, ConfigError, LaunchConfig, LoggingConfig, ScannerConfig, TargetConfig};
use crate::core::types::VERSION_VALUE_LEN;

/// Configuration validator
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validates the entire configuration
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        Self::validate_target(&config.target)?;
        Self::validate_scanner(&config.scanner)?;
        Self::validate_launch(&config.launch)?;
        Self::validate_logging(&config.logging)?;
        Ok(())
    }

    fn validate_target(target: &TargetConfig) -> Result<(), ConfigError> {
        if target.process_name.is_empty() {
            return Err(ConfigError::Invalid(
                "Target process name cannot be empty".to_string(),
            ));
        }

        if target.module_suffix.is_empty() {
            return Err(ConfigError::Invalid(
                "Target module suffix cannot be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Validates scanner configuration
    fn validate_scanner(scanner: &ScannerConfig) -> Result<(), ConfigError> {
        if scanner.total_size == 0 {
            return Err(ConfigError::Invalid(
                "Scan total size must be greater than 0".to_string(),
            ));
        }

        // A window shorter than the needle can never contain it
        if scanner.chunk_size < VERSION_VALUE_LEN {
            return Err(ConfigError::Invalid(format!(
                "Chunk size must be at least {} bytes",
                VERSION_VALUE_LEN
            )));
        }

        Ok(())
    }

    fn validate_launch(launch: &LaunchConfig) -> Result<(), ConfigError> {
        if launch.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "Launch poll interval must be greater than 0".to_string(),
            ));
        }

        if launch.timeout_ms < launch.poll_interval_ms {
            return Err(ConfigError::Invalid(
                "Launch timeout must be at least one poll interval".to_string(),
            ));
        }

        Ok(())
    }

    /// Validates logging configuration
    fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&logging.level.to_lowercase().as_str()) {
            return Err(ConfigError::Invalid(format!(
                "Invalid log level: {}. Must be one of: {:?}",
                logging.level, valid_levels
            )));
        }

        Ok(())
    }
}

/// Validates a configuration
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    ConfigValidator::validate(config)
}
