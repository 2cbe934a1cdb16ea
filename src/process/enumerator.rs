//! Process enumeration using Windows ToolHelp32 API

use crate::core::types::{PatchResult, ProcessInfo};
use crate::windows::types::Handle;
use crate::windows::utils::wide_to_string;
use std::mem;
use winapi::shared::minwindef::FALSE;
use winapi::um::tlhelp32::{
    CreateToolhelp32Snapshot, Process32FirstW, Process32NextW, PROCESSENTRY32W,
    TH32CS_SNAPPROCESS,
};

/// Process enumerator using ToolHelp32 API
pub struct ProcessEnumerator {
    snapshot: Handle,
    first_called: bool,
}

impl ProcessEnumerator {
    /// Snapshot the current process list
    pub fn new() -> PatchResult<Self> {
        let raw = unsafe { CreateToolhelp32Snapshot(TH32CS_SNAPPROCESS, 0) };
        Ok(ProcessEnumerator {
            snapshot: Handle::from_raw(raw, "CreateToolhelp32Snapshot")?,
            first_called: false,
        })
    }

    /// Get the next process in the enumeration
    fn next_process(&mut self) -> Option<ProcessInfo> {
        unsafe {
            let mut entry: PROCESSENTRY32W = mem::zeroed();
            entry.dwSize = mem::size_of::<PROCESSENTRY32W>() as u32;

            let success = if !self.first_called {
                self.first_called = true;
                Process32FirstW(self.snapshot.raw(), &mut entry)
            } else {
                Process32NextW(self.snapshot.raw(), &mut entry)
            };

            if success == FALSE {
                return None;
            }

            Some(ProcessInfo::new(
                entry.th32ProcessID,
                wide_to_string(&entry.szExeFile),
            ))
        }
    }
}

impl Iterator for ProcessEnumerator {
    type Item = ProcessInfo;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_process()
    }
}

/// Find the first process with the given executable name (case-insensitive)
pub fn find_process_by_name(name: &str) -> PatchResult<Option<ProcessInfo>> {
    Ok(ProcessEnumerator::new()?.find(|p| p.name_matches(name)))
}
