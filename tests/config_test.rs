//! Configuration loading tests
//!
//! Tests that engine configuration loads from disk and provides expected
//! default values

use std::path::PathBuf;
use voxdub::config::{Config, DEFAULT_CATALOG_URL};
use voxdub::platform::{Device, SpeechPlatform};

#[test]
fn test_config_loads_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("voxdub.cfg");
    std::fs::write(
        &path,
        "[espeak]\nbinary = /opt/espeak/bin/espeak-ng\n\n\
         [neural]\ndevice = cpu\nmodels_dir = /srv/piper\n\n\
         [system]\nengine = sapi\n",
    )
    .unwrap();

    let config = Config::load_from(&path).expect("Failed to load config");
    assert_eq!(config.espeak_binary(), "/opt/espeak/bin/espeak-ng");
    assert_eq!(config.device(), Device::Cpu);
    assert_eq!(config.models_dir(), PathBuf::from("/srv/piper"));
    assert_eq!(config.system_engine(), Some(SpeechPlatform::Sapi));
    assert_eq!(config.path(), Some(path.as_path()));
}

#[test]
fn test_missing_keys_use_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("voxdub.cfg");
    std::fs::write(&path, "[neural]\n").unwrap();

    let config = Config::load_from(&path).unwrap();
    assert_eq!(config.piper_binary(), "piper");
    assert_eq!(config.catalog_url(), DEFAULT_CATALOG_URL);
    assert_eq!(config.system_engine(), None);
}

#[test]
fn test_config_save_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("voxdub.cfg");
    std::fs::write(&path, "").unwrap();

    let mut config = Config::load_from(&path).unwrap();
    config.set("neural", "binary", "/usr/local/bin/piper");
    config.set("system", "engine", "say");
    config.save().unwrap();

    let reloaded = Config::load_from(&path).unwrap();
    assert_eq!(reloaded.piper_binary(), "/usr/local/bin/piper");
    assert_eq!(reloaded.system_engine(), Some(SpeechPlatform::Say));
}

#[test]
fn test_missing_file_is_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(Config::load_from(&dir.path().join("absent.cfg")).is_err());
}
