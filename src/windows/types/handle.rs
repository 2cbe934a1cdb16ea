//! Owned kernel handles

use crate::core::types::PatchResult;
use crate::windows::bindings::kernel32;
use crate::windows::utils::error_codes::last_error_as_patch_error;
use std::fmt;
use tracing::trace;
use winapi::um::handleapi::INVALID_HANDLE_VALUE;
use winapi::um::winnt::HANDLE;

/// A process or snapshot handle, closed on drop.
///
/// `OpenProcess` signals failure with null and `CreateToolhelp32Snapshot`
/// with `INVALID_HANDLE_VALUE`; [`Handle::from_raw`] rejects both.
pub struct Handle {
    raw: HANDLE,
}

impl Handle {
    /// Takes ownership of `raw`, or reports the last error of `call` when
    /// it is one of the failure sentinels
    pub fn from_raw(raw: HANDLE, call: &str) -> PatchResult<Self> {
        if raw.is_null() || raw == INVALID_HANDLE_VALUE {
            return Err(last_error_as_patch_error(call));
        }
        Ok(Handle { raw })
    }

    #[cfg(test)]
    pub(crate) fn null() -> Self {
        Handle {
            raw: std::ptr::null_mut(),
        }
    }

    pub fn is_null(&self) -> bool {
        self.raw.is_null()
    }

    /// Borrowed raw handle, valid while `self` lives
    pub fn raw(&self) -> HANDLE {
        self.raw
    }
}

impl Drop for Handle {
    fn drop(&mut self) {
        if self.is_null() {
            return;
        }
        // SAFETY: `raw` was accepted by `from_raw` and is closed only here.
        if let Err(e) = unsafe { kernel32::close_handle(self.raw) } {
            trace!(error = %e, "closing handle failed");
        }
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle({:p})", self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ptr;
    use winapi::um::tlhelp32::{CreateToolhelp32Snapshot, TH32CS_SNAPPROCESS};

    #[test]
    #[cfg_attr(miri, ignore = "FFI not supported in Miri")]
    fn test_failure_sentinels_rejected() {
        assert!(Handle::from_raw(ptr::null_mut(), "OpenProcess").is_err());
        let err = Handle::from_raw(INVALID_HANDLE_VALUE, "CreateToolhelp32Snapshot").unwrap_err();
        assert!(err.to_string().contains("CreateToolhelp32Snapshot"));
    }

    #[test]
    #[cfg_attr(miri, ignore = "FFI not supported in Miri")]
    fn test_snapshot_handle_owned_and_closed() {
        let raw = unsafe { CreateToolhelp32Snapshot(TH32CS_SNAPPROCESS, 0) };
        let handle = Handle::from_raw(raw, "CreateToolhelp32Snapshot").unwrap();
        assert!(!handle.is_null());
        assert_eq!(handle.raw(), raw);
        assert!(format!("{handle:?}").starts_with("Handle(0x"));
    }

    #[test]
    fn test_null_handle_drop_is_noop() {
        let handle = Handle::null();
        assert!(handle.is_null());
        drop(handle);
    }
}
