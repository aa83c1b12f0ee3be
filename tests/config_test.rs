//! Integration tests for Settings config loading with layered merge semantics.
//!
//! These tests run without a global config (temp directories only),
//! so they effectively test local config merging with defaults.

use std::fs;

use tempfile::TempDir;

use treestore::application::services::DocumentFormat;
use treestore::config::{local_config_path, Settings};

#[test]
fn given_no_local_config_when_load_then_uses_defaults() {
    let dir = TempDir::new().unwrap();
    let settings = Settings::load(Some(dir.path())).expect("load settings");

    assert_eq!(settings.format, DocumentFormat::Json);
    assert!(settings.pretty);
    assert_eq!(settings.tree.max_depth, None);
}

#[test]
fn given_local_config_when_load_then_overrides_defaults() {
    let dir = TempDir::new().unwrap();
    fs::write(
        local_config_path(dir.path()),
        r#"
format = "toml"
pretty = false

[tree]
max_depth = 2
"#,
    )
    .unwrap();

    let settings = Settings::load(Some(dir.path())).expect("load settings");

    assert_eq!(settings.format, DocumentFormat::Toml);
    assert!(!settings.pretty);
    assert_eq!(settings.tree.max_depth, Some(2));
}

#[test]
fn given_invalid_local_config_when_load_then_returns_config_error() {
    let dir = TempDir::new().unwrap();
    fs::write(local_config_path(dir.path()), "format = [not toml").unwrap();

    let err = Settings::load(Some(dir.path())).unwrap_err();
    assert!(err.to_string().contains("config error"));
    assert!(err.to_string().contains(".treestore.toml"));
}

#[test]
fn given_env_var_when_load_then_overrides_local_config() {
    let dir = TempDir::new().unwrap();
    fs::write(
        local_config_path(dir.path()),
        r#"
[tree]
root_label = "from-file"
"#,
    )
    .unwrap();

    // only this test touches root_label, so the override cannot leak into assertions elsewhere
    std::env::set_var("TREESTORE_TREE__ROOT_LABEL", "from-env");
    let settings = Settings::load(Some(dir.path()));
    std::env::remove_var("TREESTORE_TREE__ROOT_LABEL");

    assert_eq!(settings.expect("load settings").tree.root_label, "from-env");
}

#[test]
fn given_effective_settings_when_shown_then_toml_reloads_identically() {
    let dir = TempDir::new().unwrap();
    let settings = Settings::load(Some(dir.path())).unwrap();
    let shown = settings.to_toml().unwrap();

    let other = TempDir::new().unwrap();
    fs::write(local_config_path(other.path()), &shown).unwrap();
    let reloaded = Settings::load(Some(other.path())).unwrap();

    assert_eq!(reloaded.format, settings.format);
    assert_eq!(reloaded.pretty, settings.pretty);
    assert_eq!(reloaded.tree.max_depth, settings.tree.max_depth);
}
