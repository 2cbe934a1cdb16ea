//! Registry lookups under HKEY_CURRENT_USER

use crate::core::types::{PatchError, PatchResult};
use windows::core::HSTRING;
use windows::Win32::System::Registry::{
    RegGetValueW, HKEY_CURRENT_USER, RRF_RT_REG_DWORD, RRF_RT_REG_SZ,
};

fn registry_error(key: &str, value: &str, e: impl std::fmt::Display) -> PatchError {
    PatchError::RegistryError(format!(r"HKCU\{key}\{value}: {e}"))
}

/// Reads a REG_DWORD value
pub fn read_dword(key: &str, value: &str) -> PatchResult<u32> {
    let subkey = HSTRING::from(key);
    let value_name = HSTRING::from(value);

    let mut data: u32 = 0;
    let mut size = std::mem::size_of::<u32>() as u32;
    // SAFETY: the buffer is a valid u32 and size matches it.
    unsafe {
        RegGetValueW(
            HKEY_CURRENT_USER,
            &subkey,
            &value_name,
            RRF_RT_REG_DWORD,
            None,
            Some((&mut data as *mut u32).cast()),
            Some(&mut size),
        )
        .ok()
        .map_err(|e| registry_error(key, value, e))?;
    }

    Ok(data)
}

/// Reads a REG_SZ value
pub fn read_string(key: &str, value: &str) -> PatchResult<String> {
    let subkey = HSTRING::from(key);
    let value_name = HSTRING::from(value);

    // First call to get the required buffer size
    let mut size: u32 = 0;
    // SAFETY: RegGetValueW with null buffer queries the required size.
    unsafe {
        RegGetValueW(
            HKEY_CURRENT_USER,
            &subkey,
            &value_name,
            RRF_RT_REG_SZ,
            None,
            None,
            Some(&mut size),
        )
        .ok()
        .map_err(|e| registry_error(key, value, e))?;
    }

    let mut buffer = vec![0u16; (size as usize).div_ceil(2)];
    // SAFETY: the buffer holds `size` bytes.
    unsafe {
        RegGetValueW(
            HKEY_CURRENT_USER,
            &subkey,
            &value_name,
            RRF_RT_REG_SZ,
            None,
            Some(buffer.as_mut_ptr().cast()),
            Some(&mut size),
        )
        .ok()
        .map_err(|e| registry_error(key, value, e))?;
    }

    buffer.truncate(size as usize / 2);
    while buffer.last() == Some(&0) {
        buffer.pop();
    }

    String::from_utf16(&buffer).map_err(|e| registry_error(key, value, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg_attr(miri, ignore = "FFI not supported in Miri")]
    fn test_missing_value_is_registry_error() {
        let err = read_dword(r"SOFTWARE\verpatch-test-missing", "Version").unwrap_err();
        assert!(matches!(err, PatchError::RegistryError(_)));
        assert!(err.to_string().contains("verpatch-test-missing"));

        assert!(read_string(r"SOFTWARE\verpatch-test-missing", "InstallPath").is_err());
    }
}
