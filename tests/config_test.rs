// tests/config_test.rs
use component_ident::config::{load_config, Config, CONFIG_FILE_NAME};
use serial_test::serial;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::{tempdir, NamedTempFile};

#[test]
fn test_default_config_is_empty() {
    let config = Config::default();
    assert!(config.components.is_empty());
    assert_eq!(config.artifacts_dir, None);
}

#[test]
fn test_load_from_file() {
    let mut temp_file = NamedTempFile::new().unwrap();
    let toml_content = r#"
artifacts_dir = "/var/lib/builder/artifacts"

[components.core-admin]
source_dir = "/srv/sources/core-admin"

[components.builder-rpm]
is_plugin = true

[components.linux-template-builder]
has_packages = false
devel_path = "/tmp/ltb-devel"
"#;
    temp_file.write_all(toml_content.as_bytes()).unwrap();
    temp_file.flush().unwrap();

    let config = load_config(Some(temp_file.path())).unwrap();
    assert_eq!(
        config.artifacts_dir,
        Some(PathBuf::from("/var/lib/builder/artifacts"))
    );

    let admin = config.component("core-admin").unwrap();
    assert_eq!(admin.name(), "core-admin");
    assert_eq!(admin.source_dir(), Path::new("/srv/sources/core-admin"));
    assert!(admin.has_packages());
    assert!(!admin.is_plugin());
    assert_eq!(
        admin.devel_path(),
        Some(Path::new(
            "/var/lib/builder/artifacts/components/core-admin/noversion/devel"
        ))
    );

    let plugin = config.component("builder-rpm").unwrap();
    assert!(plugin.is_plugin());
    assert_eq!(plugin.source_dir(), Path::new("builder-rpm"));

    let ltb = config.component("linux-template-builder").unwrap();
    assert!(!ltb.has_packages());
    assert_eq!(ltb.devel_path(), Some(Path::new("/tmp/ltb-devel")));
}

#[test]
fn test_invalid_file_is_config_error() {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(b"[components\n").unwrap();
    temp_file.flush().unwrap();

    let err = load_config(Some(temp_file.path())).unwrap_err();
    assert!(err.to_string().starts_with("Configuration error"));
}

#[test]
fn test_missing_explicit_file_is_error() {
    let temp = tempdir().unwrap();
    assert!(load_config(Some(&temp.path().join("absent.toml"))).is_err());
}

#[test]
#[serial]
fn test_config_in_working_directory() {
    let temp = tempdir().unwrap();
    std::fs::write(
        temp.path().join(CONFIG_FILE_NAME),
        "[components.vmm-xen]\nis_plugin = false\n",
    )
    .unwrap();

    let previous = std::env::current_dir().unwrap();
    std::env::set_current_dir(temp.path()).unwrap();
    let config = load_config(None);
    std::env::set_current_dir(previous).unwrap();

    let config = config.unwrap();
    assert!(config.components.contains_key("vmm-xen"));
}

#[test]
fn test_component_for_dir_uses_artifacts_dir() {
    let config = Config {
        artifacts_dir: Some(PathBuf::from("/artifacts")),
        ..Config::default()
    };
    let component = config.component_for_dir(Path::new("/srv/sources/gui-agent-linux"));
    assert_eq!(component.name(), "gui-agent-linux");
    assert_eq!(
        component.devel_path(),
        Some(Path::new(
            "/artifacts/components/gui-agent-linux/noversion/devel"
        ))
    );
}
