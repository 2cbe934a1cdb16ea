//! Default configuration values for verpatch

use crate::memory::scanner::{DEFAULT_CHUNK_SIZE, DEFAULT_TOTAL_SIZE};
use serde::{Deserialize, Serialize};

/// Default configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigDefaults {
    pub target: TargetDefaults,
    pub scanner: ScannerDefaults,
    pub launch: LaunchDefaults,
    pub registry: RegistryDefaults,
    pub logging: LoggingDefaults,
}

/// Default target process configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetDefaults {
    pub process_name: String,
    pub module_suffix: String,
    pub version_file: String,
}

/// Default scanner configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannerDefaults {
    pub total_size: usize,
    pub chunk_size: usize,
}

/// Default launch configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaunchDefaults {
    pub enabled: bool,
    pub poll_interval_ms: u64,
    pub timeout_ms: u64,
}

/// Default registry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryDefaults {
    pub key: String,
    pub version_value: String,
    pub install_path_value: String,
}

/// Default logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingDefaults {
    pub level: String,
}

/// Returns the default configuration
pub fn default_config() -> ConfigDefaults {
    ConfigDefaults {
        target: TargetDefaults {
            process_name: "WeChat.exe".to_string(),
            module_suffix: "WeChatWin.dll".to_string(),
            version_file: "config.json".to_string(),
        },
        scanner: ScannerDefaults {
            total_size: DEFAULT_TOTAL_SIZE, // 256MB
            chunk_size: DEFAULT_CHUNK_SIZE, // 16MB
        },
        launch: LaunchDefaults {
            enabled: true,
            poll_interval_ms: 500,
            timeout_ms: 10_000,
        },
        registry: RegistryDefaults {
            key: r"SOFTWARE\Tencent\WeChat".to_string(),
            version_value: "Version".to_string(),
            install_path_value: "InstallPath".to_string(),
        },
        logging: LoggingDefaults {
            level: "info".to_string(),
        },
    }
}
