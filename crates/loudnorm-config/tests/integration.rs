//! Integration tests for loudnorm-config.
//!
//! Exercises settings files on disk.

use std::time::Duration;

use loudnorm_config::{ConfigError, Settings, ValidationError};
use tempfile::TempDir;

#[test]
fn save_then_load() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("nested").join("settings.toml");

    let mut settings = Settings::default();
    settings.wait.interval_ms = 250;
    settings.render.sample_rate = 44100;
    settings.save(&path).unwrap();

    let loaded = Settings::load(&path).unwrap();
    assert_eq!(loaded, settings);
    assert_eq!(loaded.wait_policy().interval, Duration::from_millis(250));
    assert_eq!(loaded.sample_rate(), 44100.0);
}

#[test]
fn missing_file_falls_back_to_default() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("absent.toml");
    assert_eq!(Settings::load_or_default(&path).unwrap(), Settings::default());
}

#[test]
fn missing_file_is_read_error_for_load() {
    let temp = TempDir::new().unwrap();
    let err = Settings::load(temp.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::ReadFile { .. }));
}

#[test]
fn hand_edited_file_with_bad_values() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("settings.toml");
    std::fs::write(
        &path,
        "[wait]\nmax_attempts = 0\n\n[selectors]\nplayer = \"\"\n",
    )
    .unwrap();

    let err = Settings::load_or_default(&path).unwrap_err();
    let ConfigError::Validation(ValidationError::Multiple(errors)) = err else {
        panic!("expected validation errors");
    };
    assert_eq!(errors.len(), 2);
}
