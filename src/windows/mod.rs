//! Windows API layer
//!
//! Safe wrappers around the Win32 calls the process backend needs. All
//! unsafe FFI is contained within this module.

pub mod bindings;
pub mod registry;
pub mod types;
pub mod utils;

pub use types::Handle;
pub use utils::{ErrorCode, WinError};

pub use bindings::{kernel32, psapi};
