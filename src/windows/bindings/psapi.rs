//! PSAPI.dll bindings for module enumeration

use crate::core::types::PatchResult;
use crate::windows::utils::{wide_to_string, WinError};
use std::mem;
use winapi::shared::minwindef::{DWORD, FALSE, HMODULE};
use winapi::um::psapi::{
    EnumProcessModulesEx, GetModuleFileNameExW, GetModuleInformation, LIST_MODULES_ALL, MODULEINFO,
};
use winapi::um::winnt::HANDLE;

// Long enough for \\?\ paths
const MAX_MODULE_PATH: usize = 32_768;

/// Safe wrapper for EnumProcessModulesEx; grows the buffer until every
/// module fits.
///
/// Lists both 32-bit and 64-bit modules, so a 64-bit caller sees the
/// modules of a WOW64 target and not only its 64-bit system DLLs.
///
/// # Safety
/// The handle must be a valid process handle with PROCESS_QUERY_INFORMATION
/// and PROCESS_VM_READ
pub unsafe fn enum_process_modules(handle: HANDLE) -> PatchResult<Vec<HMODULE>> {
    let mut modules: Vec<HMODULE> = vec![std::ptr::null_mut(); 1024];

    loop {
        let mut bytes_needed: DWORD = 0;
        let result = EnumProcessModulesEx(
            handle,
            modules.as_mut_ptr(),
            (modules.len() * mem::size_of::<HMODULE>()) as DWORD,
            &mut bytes_needed,
            LIST_MODULES_ALL,
        );

        if result == FALSE {
            return Err(WinError::new("EnumProcessModulesEx").to_patch_error());
        }

        let count = bytes_needed as usize / mem::size_of::<HMODULE>();
        if count <= modules.len() {
            modules.truncate(count);
            return Ok(modules);
        }
        modules.resize(count, std::ptr::null_mut());
    }
}

/// Safe wrapper for GetModuleInformation
///
/// # Safety
/// The handle must be a valid process handle and module must be valid
pub unsafe fn get_module_information(handle: HANDLE, module: HMODULE) -> PatchResult<MODULEINFO> {
    let mut info: MODULEINFO = mem::zeroed();

    let result = GetModuleInformation(
        handle,
        module,
        &mut info,
        mem::size_of::<MODULEINFO>() as DWORD,
    );

    if result == FALSE {
        return Err(WinError::new("GetModuleInformation").to_patch_error());
    }

    Ok(info)
}

/// Safe wrapper for GetModuleFileNameExW, returning the full module path
///
/// # Safety
/// The handle must be a valid process handle and module must be valid
pub unsafe fn get_module_file_name(handle: HANDLE, module: HMODULE) -> PatchResult<String> {
    let mut buffer = vec![0u16; MAX_MODULE_PATH];

    let length = GetModuleFileNameExW(handle, module, buffer.as_mut_ptr(), buffer.len() as DWORD);
    if length == 0 {
        return Err(WinError::new("GetModuleFileNameExW").to_patch_error());
    }

    Ok(wide_to_string(&buffer[..length as usize]))
}
