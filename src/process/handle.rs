//! Safe process handle wrapper with RAII semantics

use super::{modules, ProcessMemory};
use crate::core::types::{Address, ModuleInfo, PatchError, PatchResult, ProcessId};
use crate::windows::bindings::kernel32;
use crate::windows::types::Handle;
use std::fmt;
use winapi::um::winnt::HANDLE;

/// Access rights for process handles
#[derive(Debug, Clone, Copy)]
pub struct ProcessAccess {
    value: u32,
}

impl ProcessAccess {
    /// Query information access
    pub const QUERY_INFORMATION: Self = Self { value: 0x0400 };
    /// Read memory access
    pub const VM_READ: Self = Self { value: 0x0010 };
    /// Write memory access
    pub const VM_WRITE: Self = Self { value: 0x0020 };
    /// Required alongside VM_WRITE
    pub const VM_OPERATION: Self = Self { value: 0x0008 };

    /// Combine access rights
    pub fn combine(rights: &[Self]) -> Self {
        let mut value = 0;
        for right in rights {
            value |= right.value;
        }
        Self { value }
    }

    /// Get raw value
    pub fn value(&self) -> u32 {
        self.value
    }
}

/// Safe wrapper around a Windows process handle
pub struct ProcessHandle {
    handle: Handle,
    pid: ProcessId,
    access: ProcessAccess,
}

impl ProcessHandle {
    /// Open a process with specified access rights
    pub fn open(pid: ProcessId, access: ProcessAccess) -> PatchResult<Self> {
        let raw_handle = kernel32::open_process(pid, access.value())?;
        Ok(ProcessHandle {
            handle: Handle::from_raw(raw_handle, "OpenProcess")?,
            pid,
            access,
        })
    }

    /// Open a process for reading memory
    pub fn open_for_read(pid: ProcessId) -> PatchResult<Self> {
        Self::open(
            pid,
            ProcessAccess::combine(&[ProcessAccess::QUERY_INFORMATION, ProcessAccess::VM_READ]),
        )
    }

    /// Open a process for reading and writing memory
    pub fn open_for_read_write(pid: ProcessId) -> PatchResult<Self> {
        Self::open(
            pid,
            ProcessAccess::combine(&[
                ProcessAccess::QUERY_INFORMATION,
                ProcessAccess::VM_READ,
                ProcessAccess::VM_WRITE,
                ProcessAccess::VM_OPERATION,
            ]),
        )
    }

    /// Get the raw handle
    ///
    /// # Safety
    /// The returned handle is only valid as long as this ProcessHandle exists
    pub unsafe fn raw(&self) -> HANDLE {
        self.handle.raw()
    }

    /// Get the access rights
    pub fn access(&self) -> ProcessAccess {
        self.access
    }

    /// Check if handle is valid
    pub fn is_valid(&self) -> bool {
        !self.handle.is_null()
    }

    fn checked_raw(&self) -> PatchResult<HANDLE> {
        if self.is_valid() {
            Ok(self.handle.raw())
        } else {
            Err(PatchError::InvalidHandle(format!(
                "handle for pid {} is null",
                self.pid
            )))
        }
    }
}

impl ProcessMemory for ProcessHandle {
    fn pid(&self) -> ProcessId {
        self.pid
    }

    fn list_modules(&self) -> PatchResult<Vec<ModuleInfo>> {
        modules::enumerate(self)
    }

    fn read_bytes(&self, address: Address, len: usize) -> PatchResult<Vec<u8>> {
        let handle = self.checked_raw()?;
        let mut buffer = vec![0u8; len];
        unsafe { kernel32::read_process_memory(handle, address, &mut buffer)? };
        Ok(buffer)
    }

    fn write_bytes(&self, address: Address, data: &[u8]) -> PatchResult<()> {
        let handle = self.checked_raw()?;
        unsafe { kernel32::write_process_memory(handle, address, data) }
    }
}

impl fmt::Debug for ProcessHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessHandle")
            .field("pid", &self.pid)
            .field("valid", &self.is_valid())
            .field("access", &format!("0x{:X}", self.access.value()))
            .finish()
    }
}

impl fmt::Display for ProcessHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ProcessHandle(pid={}, valid={})",
            self.pid,
            self.is_valid()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn null_handle(pid: ProcessId) -> ProcessHandle {
        ProcessHandle {
            handle: Handle::null(),
            pid,
            access: ProcessAccess::VM_READ,
        }
    }

    #[test]
    fn test_process_access_combine() {
        let read_write = ProcessAccess::combine(&[
            ProcessAccess::QUERY_INFORMATION,
            ProcessAccess::VM_READ,
            ProcessAccess::VM_WRITE,
            ProcessAccess::VM_OPERATION,
        ]);
        assert_eq!(read_write.value(), 0x0438);
    }

    #[test]
    #[cfg_attr(miri, ignore = "FFI not supported in Miri")]
    fn test_open_invalid_pid() {
        assert!(ProcessHandle::open_for_read_write(0).is_err());
    }

    #[test]
    #[cfg_attr(miri, ignore = "FFI not supported in Miri")]
    fn test_current_process_read_write() {
        let value: u32 = 0x6309_0621;
        let address = Address::new(&value as *const u32 as usize);

        let handle = ProcessHandle::open_for_read(std::process::id()).unwrap();
        assert_eq!(handle.read_u32_le(address).unwrap(), 0x6309_0621);
        assert!(handle
            .list_modules()
            .unwrap()
            .iter()
            .any(|m| m.name.to_lowercase().ends_with(".exe")));
    }

    #[test]
    fn test_null_handle_operations() {
        let handle = null_handle(1234);
        assert!(!handle.is_valid());

        let err = handle.read_bytes(Address::new(0x1000), 4).unwrap_err();
        assert!(matches!(err, PatchError::InvalidHandle(ref msg) if msg.contains("null")));

        let err = handle.write_bytes(Address::new(0x1000), &[0; 4]).unwrap_err();
        assert!(matches!(err, PatchError::InvalidHandle(_)));
    }

    #[test]
    fn test_process_handle_display() {
        let handle = null_handle(1234);
        assert_eq!(handle.to_string(), "ProcessHandle(pid=1234, valid=false)");
        assert!(format!("{:?}", handle).contains("0x10"));
    }
}
