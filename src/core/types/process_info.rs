//! Process and module information types

use super::{Address, ProcessId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A running process found in the OS process list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessInfo {
    pub pid: ProcessId,
    pub name: String,
}

impl ProcessInfo {
    /// Creates a new ProcessInfo
    pub fn new(pid: ProcessId, name: String) -> Self {
        ProcessInfo { pid, name }
    }

    /// Check if the executable name matches (case-insensitive)
    pub fn name_matches(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }
}

impl fmt::Display for ProcessInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Process [{}] {}", self.pid, self.name)
    }
}

/// Information about a loaded module in a process
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleInfo {
    /// File name of the module
    pub name: String,
    /// Full path as reported by the OS
    pub path: String,
    pub base_address: Address,
    pub size: usize,
}

impl ModuleInfo {
    /// Creates a new ModuleInfo from its full path; the name is the last path segment
    pub fn new(path: impl Into<String>, base_address: Address, size: usize) -> Self {
        let path = path.into();
        let name = path
            .rsplit(['\\', '/'])
            .next()
            .unwrap_or(path.as_str())
            .to_string();
        ModuleInfo {
            name,
            path,
            base_address,
            size,
        }
    }

    /// Case-sensitive suffix match against the full path
    pub fn path_ends_with(&self, suffix: &str) -> bool {
        self.path.ends_with(suffix)
    }

    /// Gets the end address of the module
    pub fn end_address(&self) -> Address {
        self.base_address.add(self.size)
    }

    /// Checks if an address is within this module
    pub fn contains_address(&self, address: Address) -> bool {
        address >= self.base_address && address < self.end_address()
    }
}

impl fmt::Display for ModuleInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} @ {} ({:#x} bytes)",
            self.name, self.base_address, self.size
        )
    }
}
