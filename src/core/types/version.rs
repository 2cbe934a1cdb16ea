//! Four-byte version stamp as stored in process memory

use super::error::{PatchError, PatchResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of bytes a version stamp occupies in memory
pub const VERSION_VALUE_LEN: usize = 4;

/// A version stamp: a `u32` stored little-endian in the target module
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VersionValue(pub u32);

impl VersionValue {
    pub const fn new(value: u32) -> Self {
        VersionValue(value)
    }

    pub const fn get(&self) -> u32 {
        self.0
    }

    /// In-memory byte pattern (little-endian)
    pub const fn to_le_bytes(&self) -> [u8; VERSION_VALUE_LEN] {
        self.0.to_le_bytes()
    }

    pub const fn from_le_bytes(bytes: [u8; VERSION_VALUE_LEN]) -> Self {
        VersionValue(u32::from_le_bytes(bytes))
    }

    /// Parses a raw value of exactly 8 hex digits, e.g. `63090621`.
    ///
    /// An optional `0x` prefix is accepted. The digits are read big-endian,
    /// so `63090621` becomes `0x63090621`.
    pub fn from_hex(input: &str) -> PatchResult<Self> {
        let trimmed = input.trim();
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);

        if digits.len() != 2 * VERSION_VALUE_LEN {
            return Err(PatchError::InvalidHexValue(input.to_string()));
        }

        let mut bytes = [0u8; VERSION_VALUE_LEN];
        hex::decode_to_slice(digits, &mut bytes)
            .map_err(|_| PatchError::InvalidHexValue(input.to_string()))?;
        Ok(VersionValue(u32::from_be_bytes(bytes)))
    }
}

impl FromStr for VersionValue {
    type Err = PatchError;

    fn from_str(s: &str) -> PatchResult<Self> {
        VersionValue::from_hex(s)
    }
}

impl fmt::Display for VersionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08x}", self.0)
    }
}

impl From<u32> for VersionValue {
    fn from(value: u32) -> Self {
        VersionValue(value)
    }
}
