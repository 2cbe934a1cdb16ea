//! Core module containing fundamental types for verpatch
//!
//! This module provides the foundational building blocks used throughout
//! the crate: addresses, module descriptions, version stamps and errors.

pub mod types;

// Re-export commonly used types for convenience
pub use types::{Address, ModuleInfo, PatchError, PatchResult, ProcessInfo, VersionValue};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const AUTHORS: &str = env!("CARGO_PKG_AUTHORS");
