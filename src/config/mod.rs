//! Configuration module for verpatch
//!
//! Provides configuration loading, validation, and default settings.

mod defaults;
mod loader;
mod validator;

pub use defaults::{default_config, ConfigDefaults};
pub use loader::{load_config, ConfigLoader, DEFAULT_CONFIG_FILE};
pub use validator::{validate_config, ConfigValidator};

// Re-export the configuration structures
pub use loader::{
    Config, LaunchConfig, LoggingConfig, RegistryConfig, ScannerConfig, TargetConfig,
};

// Configuration-related error type
pub use loader::ConfigError;

// Configuration result type
pub type ConfigResult<T> = Result<T, ConfigError>;

impl From<ConfigError> for crate::core::types::PatchError {
    fn from(error: ConfigError) -> Self {
        crate::core::types::PatchError::Config(error.to_string())
    }
}
