//! Module lookup by path suffix

use super::ProcessMemory;
use crate::core::types::{ModuleInfo, PatchError, PatchResult};
use tracing::debug;

/// Returns the first loaded module whose full path ends with `suffix`.
///
/// The match is case-sensitive. A module list that cannot be obtained
/// (process gone, access denied) is reported as `ModuleNotFound` as well.
pub fn find_module<P: ProcessMemory + ?Sized>(process: &P, suffix: &str) -> PatchResult<ModuleInfo> {
    let modules = process.list_modules().map_err(|e| {
        PatchError::ModuleNotFound(format!(
            "{suffix} (module list of pid {} unavailable: {e})",
            process.pid()
        ))
    })?;

    debug!(pid = process.pid(), count = modules.len(), "enumerated modules");

    modules
        .into_iter()
        .find(|m| m.path_ends_with(suffix))
        .ok_or_else(|| {
            PatchError::ModuleNotFound(format!("{suffix} is not loaded in pid {}", process.pid()))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Address;
    use crate::process::SimulatedProcess;

    fn process() -> SimulatedProcess {
        SimulatedProcess::builder()
            .pid(4242)
            .module(r"C:\Tencent\WeChat\WeChat.exe", Address::new(0x14000_0000), 0x1000)
            .module(
                r"C:\Tencent\WeChat\[3.9.6.33]\WeChatWin.dll",
                Address::new(0x7FF8_0000_0000),
                0x400_0000,
            )
            .module(r"C:\Windows\System32\WeChatWin.dll", Address::new(0x7FF9_0000_0000), 0x10)
            .build()
    }

    #[test]
    fn test_finds_first_suffix_match() {
        let module = find_module(&process(), "WeChatWin.dll").unwrap();
        assert_eq!(module.base_address, Address::new(0x7FF8_0000_0000));
        assert_eq!(module.size, 0x400_0000);
    }

    #[test]
    fn test_suffix_is_case_sensitive() {
        let err = find_module(&process(), "wechatwin.dll").unwrap_err();
        assert!(matches!(err, PatchError::ModuleNotFound(_)));
        assert!(err.to_string().contains("4242"));
    }

    #[test]
    fn test_empty_module_list() {
        let empty = SimulatedProcess::builder().build();
        assert!(find_module(&empty, "WeChatWin.dll").is_err());
    }
}
