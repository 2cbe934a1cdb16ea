//! Module enumeration through PSAPI

use super::ProcessHandle;
use crate::core::types::{Address, ModuleInfo, PatchResult};
use crate::windows::bindings::psapi;
use tracing::trace;
use winapi::shared::minwindef::HMODULE;

/// Lists every module loaded in the process with its full path.
///
/// Modules that unload while being queried are skipped.
pub fn enumerate(process: &ProcessHandle) -> PatchResult<Vec<ModuleInfo>> {
    let raw = unsafe { process.raw() };
    let handles = unsafe { psapi::enum_process_modules(raw)? };

    let mut modules = Vec::with_capacity(handles.len());
    for module in handles {
        match module_info(process, module) {
            Ok(info) => modules.push(info),
            Err(e) => trace!(error = %e, "skipping module"),
        }
    }
    Ok(modules)
}

fn module_info(process: &ProcessHandle, module: HMODULE) -> PatchResult<ModuleInfo> {
    unsafe {
        let raw = process.raw();
        let path = psapi::get_module_file_name(raw, module)?;
        let info = psapi::get_module_information(raw, module)?;

        Ok(ModuleInfo::new(
            path,
            Address::from(info.lpBaseOfDll as usize),
            info.SizeOfImage as usize,
        ))
    }
}
