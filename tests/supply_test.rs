//! Version resolution with a version file on disk

use pretty_assertions::assert_eq;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;
use verpatch::codec::VersionSpec;
use verpatch::core::types::{PatchError, PatchResult, VersionValue};
use verpatch::supply::{read_target_version, resolve_versions, RegistrySource, VersionSources};

struct NoRegistry;

impl RegistrySource for NoRegistry {
    fn version(&self) -> PatchResult<u32> {
        Err(PatchError::RegistryError("no registry in tests".to_string()))
    }

    fn install_path(&self) -> PatchResult<PathBuf> {
        Err(PatchError::RegistryError("no registry in tests".to_string()))
    }
}

fn version_file(dir: &TempDir, contents: &str) -> PathBuf {
    let path = dir.path().join("config.json");
    fs::write(&path, contents).unwrap();
    path
}

#[test]
fn test_target_from_version_file() {
    let dir = TempDir::new().unwrap();
    let path = version_file(&dir, r#"{ "version": "3.9.12.51", "updated": "2024-11-02" }"#);

    let sources = VersionSources {
        current: Some("3.9.6.33".to_string()),
        version_file: path,
        ..Default::default()
    };
    let resolved = resolve_versions(&sources, &NoRegistry).unwrap();

    assert_eq!(resolved.target, VersionSpec::Dotted("3.9.12.51".to_string()));
    assert_eq!(
        resolved.target.encode().unwrap(),
        VersionValue::new(0x6309_0C33)
    );
}

#[test]
fn test_command_line_target_ignores_file() {
    let dir = TempDir::new().unwrap();
    let path = version_file(&dir, "not json at all");

    let sources = VersionSources {
        current: Some("3.9.6.33".to_string()),
        target: Some("3.9.10.27".to_string()),
        version_file: path,
        ..Default::default()
    };
    let resolved = resolve_versions(&sources, &NoRegistry).unwrap();
    assert_eq!(resolved.target, VersionSpec::Dotted("3.9.10.27".to_string()));
}

#[test]
fn test_version_file_errors() {
    let dir = TempDir::new().unwrap();

    let missing_key = version_file(&dir, r#"{ "ver": "3.9.12.51" }"#);
    assert!(matches!(
        read_target_version(&missing_key),
        Err(PatchError::JsonError(_))
    ));

    let not_a_string = version_file(&dir, r#"{ "version": 3912 }"#);
    assert!(read_target_version(&not_a_string).is_err());

    let absent = dir.path().join("absent.json");
    assert!(matches!(
        read_target_version(&absent),
        Err(PatchError::IoError(_))
    ));
}

#[test]
fn test_registry_failure_without_flags() {
    let dir = TempDir::new().unwrap();
    let sources = VersionSources {
        version_file: version_file(&dir, r#"{ "version": "3.9.12.51" }"#),
        ..Default::default()
    };

    let err = resolve_versions(&sources, &NoRegistry).unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("no registry in tests"), "{msg}");
    assert!(msg.contains("--current"), "{msg}");
}
