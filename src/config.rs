//! Configuration management

use crate::platform::{Device, SpeechPlatform};
use crate::{Result, VoiceError};
use ini::Ini;
use log::{debug, info};
use std::path::{Path, PathBuf};

/// Default piper voice catalog
pub const DEFAULT_CATALOG_URL: &str =
    "https://huggingface.co/rhasspy/piper-voices/raw/main/voices.json";

/// Engine settings shared by every voice backend
///
/// Holds binary locations for the rule-based and neural engines, the model
/// catalog source and cache directory, and the OS engine override.
pub struct Config {
    /// INI configuration storage
    ini: Ini,

    /// Config file path (~/.voxdub.cfg), None for in-memory defaults
    path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from ~/.voxdub.cfg, creating it with defaults
    pub fn load() -> Result<Self> {
        let path = Self::config_path();
        debug!("Loading config from {:?}", path);

        if !path.exists() {
            info!("Config file not found, creating default");
            let default = Self::default_config();
            default
                .write_to_file(&path)
                .map_err(|e| VoiceError::IniParse(format!("Failed to write config: {}", e)))?;
        }

        Self::load_from(&path)
    }

    /// Load configuration from an explicit file
    pub fn load_from(path: &Path) -> Result<Self> {
        let ini = Ini::load_from_file(path)
            .map_err(|e| VoiceError::IniParse(format!("Failed to load config: {}", e)))?;

        Ok(Self {
            ini,
            path: Some(path.to_path_buf()),
        })
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        let path = self
            .path
            .as_ref()
            .ok_or_else(|| VoiceError::Config("In-memory config has no file".to_string()))?;
        debug!("Saving config to {:?}", path);
        self.ini
            .write_to_file(path)
            .map_err(|e| VoiceError::Config(format!("Failed to save config: {}", e)))
    }

    /// Get config file path (~/.voxdub.cfg)
    fn config_path() -> PathBuf {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home).join(".voxdub.cfg")
    }

    /// Expose the config file path for display
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Create default configuration
    fn default_config() -> Ini {
        let mut ini = Ini::new();

        ini.with_section(Some("espeak")).set("binary", "espeak-ng");

        ini.with_section(Some("neural"))
            .set("binary", "piper")
            .set("catalog_url", DEFAULT_CATALOG_URL)
            .set("device", "auto");

        ini.with_section(Some("system")).set("engine", "auto");

        ini
    }

    /// Get a string value from config
    pub fn get_string(&self, section: &str, key: &str, default: &str) -> String {
        self.ini
            .get_from(Some(section), key)
            .filter(|v| !v.trim().is_empty())
            .unwrap_or(default)
            .to_string()
    }

    /// Set a value in config
    pub fn set(&mut self, section: &str, key: &str, value: &str) {
        self.ini.with_section(Some(section)).set(key, value);
    }

    /// espeak-ng executable used by the rule-based voice
    pub fn espeak_binary(&self) -> String {
        self.get_string("espeak", "binary", "espeak-ng")
    }

    /// piper executable used by the neural voice
    pub fn piper_binary(&self) -> String {
        self.get_string("neural", "binary", "piper")
    }

    /// URL of the neural model catalog (voices.json)
    pub fn catalog_url(&self) -> String {
        self.get_string("neural", "catalog_url", DEFAULT_CATALOG_URL)
    }

    /// Directory holding downloaded models and the cached catalog
    pub fn models_dir(&self) -> PathBuf {
        match self.ini.get_from(Some("neural"), "models_dir") {
            Some(dir) if !dir.trim().is_empty() => PathBuf::from(dir),
            _ => dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("voxdub")
                .join("models"),
        }
    }

    /// Compute device for neural models; `auto` probes for CUDA
    pub fn device(&self) -> Device {
        let device = self.get_string("neural", "device", "auto").to_lowercase();
        match device.as_str() {
            "cpu" => Device::Cpu,
            "cuda" | "gpu" => Device::Cuda,
            _ => Device::auto(),
        }
    }

    /// OS speech engine override, None when set to `auto`
    pub fn system_engine(&self) -> Option<SpeechPlatform> {
        SpeechPlatform::from_name(&self.get_string("system", "engine", "auto"))
    }
}

impl Default for Config {
    /// In-memory defaults, not backed by a file
    fn default() -> Self {
        Self {
            ini: Self::default_config(),
            path: None,
        }
    }
}
