//! Configuration loader for verpatch
//!
//! Handles loading configuration from TOML files and merging with defaults.

use super::defaults::default_config;
use crate::memory::ScanOptions;
use crate::process::LaunchOptions;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Default configuration file name
pub const DEFAULT_CONFIG_FILE: &str = "verpatch.toml";

/// Configuration error type
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_target")]
    pub target: TargetConfig,

    #[serde(default = "default_scanner")]
    pub scanner: ScannerConfig,

    #[serde(default = "default_launch")]
    pub launch: LaunchConfig,

    #[serde(default = "default_registry")]
    pub registry: RegistryConfig,

    #[serde(default = "default_logging")]
    pub logging: LoggingConfig,
}

/// Target process configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetConfig {
    #[serde(default = "default_process_name")]
    pub process_name: String,
    #[serde(default = "default_module_suffix")]
    pub module_suffix: String,
    /// JSON document whose `"version"` key names the target version
    #[serde(default = "default_version_file")]
    pub version_file: PathBuf,
}

/// Scanner configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannerConfig {
    #[serde(default = "default_total_size")]
    pub total_size: usize,
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
}

/// Launch configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaunchConfig {
    #[serde(default = "default_launch_enabled")]
    pub enabled: bool,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

/// Registry configuration (HKEY_CURRENT_USER)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    #[serde(default = "default_registry_key")]
    pub key: String,
    #[serde(default = "default_version_value")]
    pub version_value: String,
    #[serde(default = "default_install_path_value")]
    pub install_path_value: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl ScannerConfig {
    pub fn scan_options(&self) -> ScanOptions {
        ScanOptions::new(self.total_size, self.chunk_size)
    }
}

impl LaunchConfig {
    pub fn launch_options(&self) -> LaunchOptions {
        LaunchOptions {
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            timeout: Duration::from_millis(self.timeout_ms),
        }
    }
}

/// Configuration loader
pub struct ConfigLoader {
    config_path: PathBuf,
}

impl ConfigLoader {
    /// Creates a new configuration loader
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        ConfigLoader {
            config_path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.config_path
    }

    /// Loads configuration from file
    pub fn load(&self) -> Result<Config, ConfigError> {
        if !self.config_path.exists() {
            return Err(ConfigError::FileNotFound(
                self.config_path.display().to_string(),
            ));
        }

        let contents = fs::read_to_string(&self.config_path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Loads configuration, falling back to defaults only when the file
    /// does not exist. A file that exists but fails to parse is an error.
    pub fn load_or_default(&self) -> Result<Config, ConfigError> {
        match self.load() {
            Err(ConfigError::FileNotFound(_)) => Ok(Config::default()),
            other => other,
        }
    }

    /// Saves configuration to file
    pub fn save(&self, config: &Config) -> Result<(), ConfigError> {
        let contents = toml::to_string_pretty(config)?;
        fs::write(&self.config_path, contents)?;
        Ok(())
    }
}

/// Loads configuration from the default location
pub fn load_config() -> Result<Config, ConfigError> {
    ConfigLoader::new(DEFAULT_CONFIG_FILE).load_or_default()
}

// Default functions for serde
fn default_target() -> TargetConfig {
    let defaults = default_config();
    TargetConfig {
        process_name: defaults.target.process_name,
        module_suffix: defaults.target.module_suffix,
        version_file: PathBuf::from(defaults.target.version_file),
    }
}

fn default_scanner() -> ScannerConfig {
    let defaults = default_config();
    ScannerConfig {
        total_size: defaults.scanner.total_size,
        chunk_size: defaults.scanner.chunk_size,
    }
}

fn default_launch() -> LaunchConfig {
    let defaults = default_config();
    LaunchConfig {
        enabled: defaults.launch.enabled,
        poll_interval_ms: defaults.launch.poll_interval_ms,
        timeout_ms: defaults.launch.timeout_ms,
    }
}

fn default_registry() -> RegistryConfig {
    let defaults = default_config();
    RegistryConfig {
        key: defaults.registry.key,
        version_value: defaults.registry.version_value,
        install_path_value: defaults.registry.install_path_value,
    }
}

fn default_logging() -> LoggingConfig {
    LoggingConfig {
        level: default_config().logging.level,
    }
}

// Individual field defaults
fn default_process_name() -> String {
    default_config().target.process_name
}

fn default_module_suffix() -> String {
    default_config().target.module_suffix
}

fn default_version_file() -> PathBuf {
    PathBuf::from(default_config().target.version_file)
}

fn default_total_size() -> usize {
    default_config().scanner.total_size
}

fn default_chunk_size() -> usize {
    default_config().scanner.chunk_size
}

fn default_launch_enabled() -> bool {
    default_config().launch.enabled
}

fn default_poll_interval_ms() -> u64 {
    default_config().launch.poll_interval_ms
}

fn default_timeout_ms() -> u64 {
    default_config().launch.timeout_ms
}

fn default_registry_key() -> String {
    default_config().registry.key
}

fn default_version_value() -> String {
    default_config().registry.version_value
}

fn default_install_path_value() -> String {
    default_config().registry.install_path_value
}

fn default_log_level() -> String {
    default_config().logging.level
}

impl Default for Config {
    fn default() -> Self {
        Config {
            target: default_target(),
            scanner: default_scanner(),
            launch: default_launch(),
            registry: default_registry(),
            logging: default_logging(),
        }
    }
}
