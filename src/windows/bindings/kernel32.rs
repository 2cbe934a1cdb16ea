//! Kernel32.dll bindings for process and memory operations

use crate::core::types::{Address, PatchError, PatchResult};
use crate::windows::utils::{ErrorCode, WinError};
use winapi::shared::minwindef::{FALSE, LPCVOID, LPVOID};
use winapi::um::handleapi::CloseHandle;
use winapi::um::memoryapi::{ReadProcessMemory, WriteProcessMemory};
use winapi::um::processthreadsapi::OpenProcess;
use winapi::um::winnt::HANDLE;

/// Safe wrapper for OpenProcess
pub fn open_process(pid: u32, desired_access: u32) -> PatchResult<HANDLE> {
    unsafe {
        let handle = OpenProcess(desired_access, FALSE, pid);
        if handle.is_null() {
            let err = WinError::new(format!("OpenProcess(pid {pid})"));
            match err.code() {
                ErrorCode::InvalidParameter => Err(PatchError::ProcessNotFound(format!("PID: {pid}"))),
                _ => Err(err.to_patch_error()),
            }
        } else {
            Ok(handle)
        }
    }
}

/// Safe wrapper for CloseHandle
///
/// # Safety
/// The handle must be a valid Windows handle
pub unsafe fn close_handle(handle: HANDLE) -> PatchResult<()> {
    if handle.is_null() {
        return Ok(());
    }

    if CloseHandle(handle) == FALSE {
        Err(WinError::new("CloseHandle").to_patch_error())
    } else {
        Ok(())
    }
}

/// Safe wrapper for ReadProcessMemory. A failed or partial read is
/// reported as unreadable memory.
///
/// # Safety
/// The handle must be a valid process handle with PROCESS_VM_READ
pub unsafe fn read_process_memory(
    handle: HANDLE,
    address: Address,
    buffer: &mut [u8],
) -> PatchResult<()> {
    let mut bytes_read = 0;

    let result = ReadProcessMemory(
        handle,
        address.as_usize() as LPCVOID,
        buffer.as_mut_ptr() as LPVOID,
        buffer.len(),
        &mut bytes_read,
    );

    if result == FALSE {
        return Err(PatchError::unreadable(
            address,
            buffer.len(),
            format!("ReadProcessMemory: {}", ErrorCode::last_error()),
        ));
    }
    if bytes_read != buffer.len() {
        return Err(PatchError::unreadable(
            address,
            buffer.len(),
            format!("short read: {bytes_read} bytes"),
        ));
    }
    Ok(())
}

/// Safe wrapper for WriteProcessMemory
///
/// # Safety
/// The handle must be a valid process handle with PROCESS_VM_WRITE and
/// PROCESS_VM_OPERATION
pub unsafe fn write_process_memory(handle: HANDLE, address: Address, data: &[u8]) -> PatchResult<()> {
    let mut bytes_written = 0;

    let result = WriteProcessMemory(
        handle,
        address.as_usize() as LPVOID,
        data.as_ptr() as LPCVOID,
        data.len(),
        &mut bytes_written,
    );

    if result == FALSE {
        return Err(PatchError::write_protected(
            address,
            format!("WriteProcessMemory: {}", ErrorCode::last_error()),
        ));
    }
    if bytes_written != data.len() {
        return Err(PatchError::write_protected(
            address,
            format!("short write: {bytes_written} of {} bytes", data.len()),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ptr;

    #[test]
    #[cfg_attr(miri, ignore = "FFI not supported in Miri")]
    fn test_null_handle_operations() {
        unsafe {
            // Closing null handle should succeed
            assert!(close_handle(ptr::null_mut()).is_ok());

            let mut buffer = vec![0u8; 4];
            let err = read_process_memory(ptr::null_mut(), Address::new(0x1000), &mut buffer)
                .unwrap_err();
            assert!(err.is_recoverable());

            let err = write_process_memory(ptr::null_mut(), Address::new(0x1000), &buffer)
                .unwrap_err();
            assert!(matches!(err, PatchError::WriteProtected { .. }));
        }
    }

    #[test]
    #[cfg_attr(miri, ignore = "FFI not supported in Miri")]
    fn test_open_invalid_process() {
        // PID 0 is the idle process and cannot be opened
        assert!(open_process(0, 0x0410).is_err());
    }
}
