//! Tests for root folder and config file resolution
//!
//! Uses serial_test because these tests manipulate process environment
//! variables (MAF_ROOT_FOLDER, MAF_CONFIG).

use maf_common::config::{
    load_toml_config, resolve_root_folder, TomlConfig, CONFIG_FILE_ENV, ROOT_FOLDER_ENV,
};
use maf_common::Error;
use serial_test::serial;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn config_with_root(root: &str) -> TomlConfig {
    TomlConfig {
        root_folder: Some(PathBuf::from(root)),
        ..TomlConfig::default()
    }
}

#[test]
#[serial]
fn test_cli_overrides_env_and_toml() {
    std::env::set_var(ROOT_FOLDER_ENV, "/from/env");

    let root = resolve_root_folder(Some(Path::new("/from/cli")), &config_with_root("/from/toml"));
    assert_eq!(root, PathBuf::from("/from/cli"));

    std::env::remove_var(ROOT_FOLDER_ENV);
}

#[test]
#[serial]
fn test_env_overrides_toml() {
    std::env::set_var(ROOT_FOLDER_ENV, "/from/env");

    let root = resolve_root_folder(None, &config_with_root("/from/toml"));
    assert_eq!(root, PathBuf::from("/from/env"));

    std::env::remove_var(ROOT_FOLDER_ENV);
}

#[test]
#[serial]
fn test_toml_used_when_no_cli_or_env() {
    std::env::remove_var(ROOT_FOLDER_ENV);

    let root = resolve_root_folder(None, &config_with_root("/from/toml"));
    assert_eq!(root, PathBuf::from("/from/toml"));
}

#[test]
#[serial]
fn test_default_root_folder_is_app_specific() {
    std::env::remove_var(ROOT_FOLDER_ENV);

    let root = resolve_root_folder(None, &TomlConfig::default());
    assert!(
        root.ends_with("myanimefigures") || root.ends_with("myanimefigures_data"),
        "Unexpected default root folder: {}",
        root.display()
    );
}

#[test]
#[serial]
fn test_load_explicit_config_file() {
    std::env::remove_var(CONFIG_FILE_ENV);
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "port = 8123\n[logging]\nlevel = \"debug\"\n").unwrap();

    let config = load_toml_config(Some(&path)).unwrap();
    assert_eq!(config.port, 8123);
    assert_eq!(config.logging.level, "debug");
}

#[test]
#[serial]
fn test_missing_explicit_config_is_error() {
    std::env::remove_var(CONFIG_FILE_ENV);
    let dir = TempDir::new().unwrap();

    let result = load_toml_config(Some(&dir.path().join("absent.toml")));
    assert!(matches!(result, Err(Error::Config(_))));
}

#[test]
#[serial]
fn test_config_env_var_is_honoured() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("env.toml");
    std::fs::write(&path, "host = \"0.0.0.0\"\n").unwrap();
    std::env::set_var(CONFIG_FILE_ENV, &path);

    let config = load_toml_config(None).unwrap();
    assert_eq!(config.host, "0.0.0.0");

    std::env::remove_var(CONFIG_FILE_ENV);
}
