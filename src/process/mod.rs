//! Access to another process's memory
//!
//! The patch pipeline only depends on the [`ProcessMemory`] capability.
//! Each platform provides a backend behind [`open_process`]; tests and
//! benchmarks use [`SimulatedProcess`].

pub mod launcher;
pub mod locator;
pub mod simulated;

#[cfg(windows)]
pub mod handle;
#[cfg(windows)]
pub mod enumerator;
#[cfg(windows)]
pub mod modules;

pub use launcher::{launch_and_wait, poll_until, LaunchOptions};
pub use locator::find_module;
pub use simulated::{SimulatedProcess, SimulatedProcessBuilder};

#[cfg(windows)]
pub use handle::{ProcessAccess, ProcessHandle};

use crate::core::types::{
    Address, ModuleInfo, PatchError, PatchResult, ProcessId, ProcessInfo, VersionValue,
    VERSION_VALUE_LEN,
};

/// Capability to inspect and modify another process's memory.
///
/// Implementations perform blocking I/O. Reads that hit unmapped or
/// protected pages fail with [`PatchError::UnreadableMemory`]; denied
/// writes fail with [`PatchError::WriteProtected`].
pub trait ProcessMemory {
    /// Process ID of the target
    fn pid(&self) -> ProcessId;

    /// Lists the modules currently loaded in the target
    fn list_modules(&self) -> PatchResult<Vec<ModuleInfo>>;

    /// Reads exactly `len` bytes starting at `address`
    fn read_bytes(&self, address: Address, len: usize) -> PatchResult<Vec<u8>>;

    /// Writes all of `data` starting at `address`
    fn write_bytes(&self, address: Address, data: &[u8]) -> PatchResult<()>;

    /// Reads a little-endian `u32`
    fn read_u32_le(&self, address: Address) -> PatchResult<u32> {
        let bytes = self.read_bytes(address, VERSION_VALUE_LEN)?;
        let array: [u8; VERSION_VALUE_LEN] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| PatchError::unreadable(address, VERSION_VALUE_LEN, "short read"))?;
        Ok(u32::from_le_bytes(array))
    }

    /// Writes a little-endian `u32`
    fn write_u32_le(&self, address: Address, value: u32) -> PatchResult<()> {
        self.write_bytes(address, &value.to_le_bytes())
    }

    /// Reads a version stamp
    fn read_version(&self, address: Address) -> PatchResult<VersionValue> {
        self.read_u32_le(address).map(VersionValue::new)
    }
}

impl<P: ProcessMemory + ?Sized> ProcessMemory for &P {
    fn pid(&self) -> ProcessId {
        (**self).pid()
    }

    fn list_modules(&self) -> PatchResult<Vec<ModuleInfo>> {
        (**self).list_modules()
    }

    fn read_bytes(&self, address: Address, len: usize) -> PatchResult<Vec<u8>> {
        (**self).read_bytes(address, len)
    }

    fn write_bytes(&self, address: Address, data: &[u8]) -> PatchResult<()> {
        (**self).write_bytes(address, data)
    }
}

impl<P: ProcessMemory + ?Sized> ProcessMemory for Box<P> {
    fn pid(&self) -> ProcessId {
        (**self).pid()
    }

    fn list_modules(&self) -> PatchResult<Vec<ModuleInfo>> {
        (**self).list_modules()
    }

    fn read_bytes(&self, address: Address, len: usize) -> PatchResult<Vec<u8>> {
        (**self).read_bytes(address, len)
    }

    fn write_bytes(&self, address: Address, data: &[u8]) -> PatchResult<()> {
        (**self).write_bytes(address, data)
    }
}

/// Finds the first running process whose executable name matches
/// (case-insensitive)
pub fn find_process(name: &str) -> PatchResult<Option<ProcessInfo>> {
    #[cfg(windows)]
    {
        enumerator::find_process_by_name(name)
    }
    #[cfg(target_os = "linux")]
    {
        crate::linux::find_process_by_name(name)
    }
    #[cfg(not(any(windows, target_os = "linux")))]
    {
        Err(PatchError::UnsupportedOperation(format!(
            "process lookup for {name} is not supported on this platform"
        )))
    }
}

/// Opens the named process for reading and writing memory
pub fn open_process(name: &str) -> PatchResult<Box<dyn ProcessMemory>> {
    let info = find_process(name)?.ok_or_else(|| PatchError::ProcessNotFound(name.to_string()))?;
    open_pid(info.pid)
}

#[cfg(windows)]
fn open_pid(pid: ProcessId) -> PatchResult<Box<dyn ProcessMemory>> {
    Ok(Box::new(ProcessHandle::open_for_read_write(pid)?))
}

#[cfg(target_os = "linux")]
fn open_pid(pid: ProcessId) -> PatchResult<Box<dyn ProcessMemory>> {
    Ok(Box::new(crate::linux::LinuxProcess::open(pid)?))
}

#[cfg(not(any(windows, target_os = "linux")))]
fn open_pid(pid: ProcessId) -> PatchResult<Box<dyn ProcessMemory>> {
    Err(PatchError::UnsupportedOperation(format!(
        "opening process {pid} is not supported on this platform"
    )))
}
