//! Config save/load roundtrip integration tests.

use keybridge_core::config::{Backend, Config};
use std::path::Path;
use tempfile::TempDir;

#[test]
fn test_config_save_and_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("keybridge.json5");

    let config = Config::default();
    config.save(&path).unwrap();

    let loaded = Config::load(&path).unwrap();
    assert_eq!(loaded.store.backend, config.store.backend);
    assert_eq!(loaded.store.label, config.store.label);
    assert_eq!(loaded.store.service, config.store.service);
    assert_eq!(loaded.logging.level, config.logging.level);
}

#[test]
fn test_config_modify_and_reload() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("keybridge.json5");

    let mut config = Config::default();
    config.store.backend = Backend::Keyring;
    config.store.service = "registry-helper".to_string();
    config.save(&path).unwrap();

    let loaded = Config::resolve(Some(&path)).unwrap();
    assert_eq!(loaded.store.service, "registry-helper");
}

#[test]
fn test_config_load_nonexistent() {
    assert!(Config::load(Path::new("/nonexistent/keybridge.json5")).is_err());
}

#[test]
fn test_config_parse_invalid() {
    assert!(Config::parse("not valid json").is_err());
}

#[test]
fn test_resolve_rejects_invalid_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("keybridge.json5");
    std::fs::write(&path, r#"{ store: { label: "" } }"#).unwrap();

    let err = Config::resolve(Some(&path)).unwrap_err();
    assert!(err.to_string().contains("store.label"));
}
