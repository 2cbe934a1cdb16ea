//! Where the current and target versions come from
//!
//! Current version, first match wins:
//! 1. `--current <a.b.c.d>` (or legacy `c=`)
//! 2. `--default-hex <8 hex digits>`
//! 3. the `Version` DWORD under the registry key, which also yields the
//!    install path used for launching
//!
//! Target version: `--target <a.b.c.d>` (or legacy `t=`), else the
//! `"version"` key of the JSON version file.

use crate::codec::VersionSpec;
use crate::config::RegistryConfig;
use crate::core::types::{PatchError, PatchResult, VersionValue};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Version sources given on the command line
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionSources {
    pub current: Option<String>,
    pub default_hex: Option<String>,
    pub target: Option<String>,
    pub version_file: PathBuf,
}

/// The version pair to patch with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedVersions {
    pub current: VersionSpec,
    pub target: VersionSpec,
    /// Install directory, known only when the registry was consulted
    pub install_path: Option<PathBuf>,
}

/// Read access to the installer's registry values
pub trait RegistrySource {
    fn version(&self) -> PatchResult<u32>;
    fn install_path(&self) -> PatchResult<PathBuf>;
}

/// The real registry (HKEY_CURRENT_USER)
#[derive(Debug, Clone)]
pub struct SystemRegistry {
    config: RegistryConfig,
}

impl SystemRegistry {
    pub fn new(config: RegistryConfig) -> Self {
        SystemRegistry { config }
    }
}

#[cfg(windows)]
impl RegistrySource for SystemRegistry {
    fn version(&self) -> PatchResult<u32> {
        crate::windows::registry::read_dword(&self.config.key, &self.config.version_value)
    }

    fn install_path(&self) -> PatchResult<PathBuf> {
        crate::windows::registry::read_string(&self.config.key, &self.config.install_path_value)
            .map(PathBuf::from)
    }
}

#[cfg(not(windows))]
impl RegistrySource for SystemRegistry {
    fn version(&self) -> PatchResult<u32> {
        Err(PatchError::UnsupportedOperation(format!(
            r"registry value HKCU\{}\{} is only available on Windows",
            self.config.key, self.config.version_value
        )))
    }

    fn install_path(&self) -> PatchResult<PathBuf> {
        Err(PatchError::UnsupportedOperation(format!(
            r"registry value HKCU\{}\{} is only available on Windows",
            self.config.key, self.config.install_path_value
        )))
    }
}

#[derive(Debug, Deserialize)]
struct VersionFile {
    version: String,
}

/// Reads the `"version"` key of a JSON document
pub fn read_target_version(path: &Path) -> PatchResult<String> {
    let contents = fs::read_to_string(path)?;
    let file: VersionFile = serde_json::from_str(&contents)?;
    Ok(file.version)
}

/// Resolves the version pair from the command line, the registry and the
/// version file
pub fn resolve_versions<R: RegistrySource + ?Sized>(
    sources: &VersionSources,
    registry: &R,
) -> PatchResult<ResolvedVersions> {
    let mut install_path = None;

    let current = if let Some(current) = &sources.current {
        VersionSpec::Dotted(current.clone())
    } else if let Some(hex) = &sources.default_hex {
        VersionSpec::Raw(hex.parse::<VersionValue>()?)
    } else {
        let raw = registry.version().map_err(|e| {
            PatchError::Config(format!(
                "current version unavailable ({e}); pass --current <version> or --default-hex <hex>"
            ))
        })?;
        let value = VersionValue::new(raw);
        debug!(%value, "current version from registry");

        match registry.install_path() {
            Ok(path) => install_path = Some(path),
            Err(e) => warn!(error = %e, "install path unavailable, will not launch"),
        }
        VersionSpec::Raw(value)
    };

    let target = match &sources.target {
        Some(target) => target.clone(),
        None => read_target_version(&sources.version_file).map_err(|e| {
            PatchError::Config(format!(
                "target version unavailable from {} ({e}); pass --target <version>",
                sources.version_file.display()
            ))
        })?,
    };

    info!(%current, %target, "versions resolved");
    Ok(ResolvedVersions {
        current,
        target: VersionSpec::Dotted(target),
        install_path,
    })
}

/// Versions given as bare `c=<version>` / `t=<version>` arguments
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LegacyArgs {
    pub current: Option<String>,
    pub target: Option<String>,
}

impl LegacyArgs {
    pub fn parse<S: AsRef<str>>(args: &[S]) -> PatchResult<Self> {
        let mut parsed = LegacyArgs::default();
        for arg in args {
            let arg = arg.as_ref();
            if let Some(version) = arg.strip_prefix("c=") {
                parsed.current = Some(version.to_string());
            } else if let Some(version) = arg.strip_prefix("t=") {
                parsed.target = Some(version.to_string());
            } else {
                return Err(PatchError::Config(format!(
                    "unrecognized argument '{arg}'; expected c=<version> or t=<version>"
                )));
            }
        }
        Ok(parsed)
    }
}
