//! Integration tests for preference persistence.
//!
//! The dark-mode flag is the only persisted value; these tests verify the
//! whole disk round trip including defaults and malformed files.

use camino::Utf8PathBuf;
use qrdesk::{Preferences, PrefsManager};
use std::fs;
use tempfile::TempDir;

fn manager_in(temp_dir: &TempDir) -> PrefsManager {
    let path = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).unwrap();
    PrefsManager::new(&path).unwrap()
}

#[test]
fn test_defaults_when_no_file_exists() {
    let temp_dir = TempDir::new().unwrap();
    let manager = manager_in(&temp_dir);

    let prefs = manager.load_preferences().unwrap();
    assert!(!prefs.dark_mode);
}

#[test]
fn test_round_trip_preserves_dark_mode() {
    let temp_dir = TempDir::new().unwrap();
    let manager = manager_in(&temp_dir);

    manager
        .save_preferences(&Preferences { dark_mode: true })
        .unwrap();

    let loaded = manager.load_preferences().unwrap();
    assert!(loaded.dark_mode);
}

#[test]
fn test_persists_across_manager_instances() {
    let temp_dir = TempDir::new().unwrap();

    {
        let manager = manager_in(&temp_dir);
        manager
            .save_preferences(&Preferences { dark_mode: true })
            .unwrap();
    }

    // A fresh manager over the same directory sees the saved flag - the
    // startup path in main.rs relies on this.
    let manager = manager_in(&temp_dir);
    assert!(manager.load_preferences().unwrap().dark_mode);
}

#[test]
fn test_yaml_uses_readable_key() {
    let temp_dir = TempDir::new().unwrap();
    let manager = manager_in(&temp_dir);

    manager
        .save_preferences(&Preferences { dark_mode: true })
        .unwrap();

    let contents = fs::read_to_string(temp_dir.path().join("Preferences.yaml")).unwrap();
    assert!(contents.contains("Dark Mode"));
}

#[test]
fn test_hand_edited_file_with_missing_key_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let manager = manager_in(&temp_dir);

    fs::write(temp_dir.path().join("Preferences.yaml"), "{}\n").unwrap();

    let prefs = manager.load_preferences().unwrap();
    assert!(!prefs.dark_mode);
}

#[test]
fn test_malformed_yaml_is_an_error() {
    let temp_dir = TempDir::new().unwrap();
    let manager = manager_in(&temp_dir);

    fs::write(
        temp_dir.path().join("Preferences.yaml"),
        "Dark Mode: [not a bool",
    )
    .unwrap();

    assert!(manager.load_preferences().is_err());
}

#[test]
fn test_save_overwrites_previous_value() {
    let temp_dir = TempDir::new().unwrap();
    let manager = manager_in(&temp_dir);

    manager
        .save_preferences(&Preferences { dark_mode: true })
        .unwrap();
    manager
        .save_preferences(&Preferences { dark_mode: false })
        .unwrap();

    assert!(!manager.load_preferences().unwrap().dark_mode);
}
