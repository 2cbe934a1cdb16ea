//! Core type definitions for verpatch
//!
//! Address wrappers, process and module descriptions, the version stamp
//! value and the error taxonomy shared by every stage of the pipeline.

mod address;
mod error;
mod process_info;
mod version;

// Re-export all public types
pub use address::Address;
pub use error::{ErrorKind, PatchError, PatchResult};
pub use process_info::{ModuleInfo, ProcessInfo};
pub use version::{VersionValue, VERSION_VALUE_LEN};

// Common type aliases
pub type ProcessId = u32;
pub type Offset = usize;
