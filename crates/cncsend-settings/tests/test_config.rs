use cncsend_core::SentinelMatch;
use cncsend_settings::{Config, SettingsError};
use std::path::PathBuf;

fn customized() -> Config {
    let mut config = Config::default();
    config.connection.read_timeout_ms = 50;
    config.streaming.sentinel = "OK".to_string();
    config.streaming.sentinel_match = SentinelMatch::Line;
    config.streaming.max_queue_len = Some(2048);
    config.files.project_root = PathBuf::from("/srv/jobs");
    config.logging.json = true;
    config
}

#[test]
fn test_save_and_load_toml() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("config.toml");

    let config = customized();
    config.save_to_file(&path).unwrap();

    let loaded = Config::load_from_file(&path).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn test_save_and_load_json() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");

    let config = customized();
    config.save_to_file(&path).unwrap();

    let loaded = Config::load_from_file(&path).unwrap();
    assert_eq!(loaded.streaming.sentinel, "OK");
    assert_eq!(loaded.logging, config.logging);
}

#[test]
fn test_unsupported_extension() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.yaml");

    let result = Config::default().save_to_file(&path);
    assert!(matches!(result, Err(SettingsError::UnsupportedFormat(ref ext)) if ext == "yaml"));
}

#[test]
fn test_missing_file_is_load_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = Config::load_from_file(&dir.path().join("absent.toml"));
    assert!(matches!(result, Err(SettingsError::LoadError(_))));
}

#[test]
fn test_invalid_values_rejected_on_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[connection]\nread_timeout_ms = 0\n").unwrap();

    let result = Config::load_from_file(&path);
    assert!(matches!(
        result,
        Err(SettingsError::InvalidSetting { ref key, .. }) if key == "connection.read_timeout_ms"
    ));
}

#[test]
fn test_malformed_toml() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[streaming\nsentinel = ").unwrap();

    assert!(matches!(
        Config::load_from_file(&path),
        Err(SettingsError::TomlError(_))
    ));
}
