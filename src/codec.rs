//! Version codec: dotted version strings to in-memory version stamps
//!
//! A version `a.b.c.d` is written as the hex digits `6` `a` `bb` `cc` `dd`,
//! where the first component takes one hex digit and the rest take two
//! (zero-padded). The resulting 8 hex digits are read as a big-endian
//! `u32`, which the target stores little-endian.
//!
//! Component magnitudes are not range checked. A component that needs more
//! digits than its slot shifts every digit after it; since the leading
//! nibble is always `6`, such an encoding no longer fits in four bytes and
//! is reported as [`PatchError::MalformedVersion`].

use crate::core::types::{PatchError, PatchResult, VersionValue};
use std::fmt;

/// Leading hex digit of every encoded version
pub const VERSION_MARKER: char = '6';

/// Number of dot-separated components in a version string
pub const VERSION_COMPONENTS: usize = 4;

/// Encodes a dotted version string, e.g. `"3.9.12.51"` -> `0x63090c33`
pub fn encode(version: &str) -> PatchResult<VersionValue> {
    let parts: Vec<&str> = version.split('.').collect();
    if parts.len() != VERSION_COMPONENTS {
        return Err(PatchError::malformed_version(
            version,
            format!(
                "expected {} components, got {}",
                VERSION_COMPONENTS,
                parts.len()
            ),
        ));
    }

    let mut digits = String::with_capacity(2 * VERSION_COMPONENTS);
    digits.push(VERSION_MARKER);

    for (i, part) in parts.iter().enumerate() {
        let component: u64 = part.trim().parse().map_err(|_| {
            PatchError::malformed_version(version, format!("component '{part}' is not numeric"))
        })?;

        if i == 0 {
            digits.push_str(&format!("{component:x}"));
        } else {
            digits.push_str(&format!("{component:02x}"));
        }
    }

    u32::from_str_radix(&digits, 16)
        .map(VersionValue::new)
        .map_err(|_| {
            PatchError::malformed_version(
                version,
                format!("encoding 0x{digits} does not fit in 4 bytes"),
            )
        })
}

/// Recovers the dotted form of an encoded version.
///
/// Returns `None` when the leading nibble is not the version marker.
pub fn decode(value: VersionValue) -> Option<String> {
    let raw = value.get();
    if raw >> 28 != 0x6 {
        return None;
    }

    let major = (raw >> 24) & 0xF;
    let minor = (raw >> 16) & 0xFF;
    let patch = (raw >> 8) & 0xFF;
    let build = raw & 0xFF;
    Some(format!("{major}.{minor}.{patch}.{build}"))
}

/// A version as supplied by the operator: dotted, or an already encoded
/// raw value (e.g. read from the registry)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionSpec {
    Dotted(String),
    Raw(VersionValue),
}

impl VersionSpec {
    /// Produces the in-memory version stamp
    pub fn encode(&self) -> PatchResult<VersionValue> {
        match self {
            VersionSpec::Dotted(version) => encode(version),
            VersionSpec::Raw(value) => Ok(*value),
        }
    }
}

impl fmt::Display for VersionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionSpec::Dotted(version) => f.write_str(version),
            VersionSpec::Raw(value) => match decode(*value) {
                Some(dotted) => write!(f, "{dotted} ({value})"),
                None => write!(f, "{value}"),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_known_versions() {
        assert_eq!(encode("3.9.6.33").unwrap(), VersionValue::new(0x6309_0621));
        assert_eq!(encode("3.9.12.51").unwrap(), VersionValue::new(0x6309_0C33));
        assert_eq!(encode("3.9.10.27").unwrap(), VersionValue::new(0x6309_0A1B));
        assert_eq!(encode("0.0.0.0").unwrap(), VersionValue::new(0x6000_0000));
        assert_eq!(encode("15.255.255.255").unwrap(), VersionValue::new(0x6FFF_FFFF));
    }

    #[test]
    fn test_encode_component_count() {
        for input in ["3.9.6", "3.9.6.33.1", "", "3"] {
            let err = encode(input).unwrap_err();
            assert!(
                matches!(err, PatchError::MalformedVersion { .. }),
                "{input}: {err}"
            );
        }
    }

    #[test]
    fn test_encode_non_numeric() {
        for input in ["3.9.x.33", "3..6.33", "3.9.6.-1", "a.b.c.d"] {
            assert!(encode(input).is_err(), "{input}");
        }
    }

    #[test]
    fn test_encode_width_overflow() {
        let err = encode("16.0.0.0").unwrap_err();
        assert!(err.to_string().contains("does not fit"));
        assert!(encode("3.256.0.0").is_err());
    }

    #[test]
    fn test_decode() {
        assert_eq!(decode(VersionValue::new(0x6309_0621)).as_deref(), Some("3.9.6.33"));
        assert_eq!(decode(VersionValue::new(0x7309_0621)), None);
    }

    #[test]
    fn test_version_spec() {
        let dotted = VersionSpec::Dotted("3.9.12.51".to_string());
        assert_eq!(dotted.encode().unwrap(), VersionValue::new(0x6309_0C33));
        assert_eq!(dotted.to_string(), "3.9.12.51");

        let raw = VersionSpec::Raw(VersionValue::new(0x6309_0621));
        assert_eq!(raw.encode().unwrap(), VersionValue::new(0x6309_0621));
        assert_eq!(raw.to_string(), "3.9.6.33 (63090621)");

        assert!(VersionSpec::Dotted("3.9".to_string()).encode().is_err());
    }
}
