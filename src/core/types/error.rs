//! Error types for locating, scanning and patching process memory

use super::{Address, VersionValue};
use std::fmt;
use thiserror::Error;

/// Main error type for the patch pipeline
#[derive(Error, Debug)]
pub enum PatchError {
    #[error("Malformed version '{input}': {reason}")]
    MalformedVersion { input: String, reason: String },

    #[error("Invalid raw version value '{0}': expected 8 hex digits")]
    InvalidHexValue(String),

    #[error("Process not found: {0}")]
    ProcessNotFound(String),

    #[error("Module not found: {0}")]
    ModuleNotFound(String),

    #[error("Unreadable memory at {address} ({len} bytes): {reason}")]
    UnreadableMemory {
        address: Address,
        len: usize,
        reason: String,
    },

    #[error("No offsets holding {needle} found in module {module}; is the current version correct?")]
    OffsetsNotFound { module: String, needle: VersionValue },

    #[error(
        "Version mismatch at {address} (offset {offset:#x}): found {found}, expected default {expected} or target {target}"
    )]
    VersionMismatch {
        address: Address,
        offset: usize,
        found: VersionValue,
        expected: VersionValue,
        target: VersionValue,
    },

    #[error("Write denied at {address}: {reason}")]
    WriteProtected { address: Address, reason: String },

    #[error("Invalid handle: {0}")]
    InvalidHandle(String),

    #[error("Failed to launch {program}: {reason}")]
    LaunchFailed { program: String, reason: String },

    #[error("Registry error: {0}")]
    RegistryError(String),

    #[error("Invalid session state: {0}")]
    InvalidState(String),

    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Windows API: {0}")]
    WindowsApi(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Result type alias for patch operations
pub type PatchResult<T> = Result<T, PatchError>;

/// Coarse classification of a [`PatchError`], used as the payload of the
/// session's error state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    MalformedVersion,
    ProcessNotFound,
    ModuleNotFound,
    UnreadableMemory,
    OffsetsNotFound,
    VersionMismatch,
    WriteProtected,
    Other,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::MalformedVersion => "malformed version",
            ErrorKind::ProcessNotFound => "process not found",
            ErrorKind::ModuleNotFound => "module not found",
            ErrorKind::UnreadableMemory => "unreadable memory",
            ErrorKind::OffsetsNotFound => "offsets not found",
            ErrorKind::VersionMismatch => "version mismatch",
            ErrorKind::WriteProtected => "write protected",
            ErrorKind::Other => "other",
        };
        f.write_str(name)
    }
}

impl PatchError {
    /// Creates a malformed version error
    pub fn malformed_version(input: impl Into<String>, reason: impl Into<String>) -> Self {
        PatchError::MalformedVersion {
            input: input.into(),
            reason: reason.into(),
        }
    }

    /// Creates an unreadable memory error
    pub fn unreadable(address: Address, len: usize, reason: impl Into<String>) -> Self {
        PatchError::UnreadableMemory {
            address,
            len,
            reason: reason.into(),
        }
    }

    /// Creates a write protected error
    pub fn write_protected(address: Address, reason: impl Into<String>) -> Self {
        PatchError::WriteProtected {
            address,
            reason: reason.into(),
        }
    }

    /// Classifies the error
    pub fn kind(&self) -> ErrorKind {
        match self {
            PatchError::MalformedVersion { .. } | PatchError::InvalidHexValue(_) => {
                ErrorKind::MalformedVersion
            }
            PatchError::ProcessNotFound(_) | PatchError::LaunchFailed { .. } => {
                ErrorKind::ProcessNotFound
            }
            PatchError::ModuleNotFound(_) => ErrorKind::ModuleNotFound,
            PatchError::UnreadableMemory { .. } => ErrorKind::UnreadableMemory,
            PatchError::OffsetsNotFound { .. } => ErrorKind::OffsetsNotFound,
            PatchError::VersionMismatch { .. } => ErrorKind::VersionMismatch,
            PatchError::WriteProtected { .. } => ErrorKind::WriteProtected,
            _ => ErrorKind::Other,
        }
    }

    /// True for errors a chunked scan recovers from by skipping the window
    pub fn is_recoverable(&self) -> bool {
        matches!(self, PatchError::UnreadableMemory { .. })
    }
}
