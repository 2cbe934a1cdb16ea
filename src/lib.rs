//! verpatch: rewrite the 4-byte version stamp inside a running process
//!
//! The pipeline is locate module -> chunked scan for the current version
//! stamp -> validate and rewrite each hit to the target stamp. It runs
//! against any [`process::ProcessMemory`] implementation.

pub mod codec;
pub mod config;
pub mod core;
pub mod memory;
pub mod process;
pub mod session;
pub mod supply;

#[cfg(target_os = "linux")]
pub mod linux;
#[cfg(windows)]
pub mod windows;

pub use crate::core::types::{
    Address, ErrorKind, ModuleInfo, Offset, PatchError, PatchResult, ProcessId, ProcessInfo,
    VersionValue,
};
pub use codec::{decode, encode, VersionSpec};
pub use memory::{ChunkedScanner, ScanOptions, ValidatingPatcher};
pub use process::{open_process, ProcessMemory};
pub use session::{PatchReport, PatchRequest, PatchSession, PatchState};
