//! Platform detection utilities

use log::debug;
use std::fs;
use std::path::Path;
use std::process::{Command, Stdio};

/// Compute device a neural model runs on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Device {
    Cpu,
    Cuda,
}

impl Device {
    /// Pick CUDA when an NVIDIA driver is present, otherwise CPU
    pub fn auto() -> Self {
        if cuda_available() {
            Device::Cuda
        } else {
            Device::Cpu
        }
    }
}

impl std::fmt::Display for Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Device::Cpu => write!(f, "cpu"),
            Device::Cuda => write!(f, "cuda"),
        }
    }
}

/// OS speech engine family available on this host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeechPlatform {
    /// Windows SAPI, reached through PowerShell (native Windows or WSL)
    Sapi,
    /// macOS `say`
    Say,
    /// espeak-ng, the default speech engine on Linux desktops
    Espeak,
}

impl SpeechPlatform {
    /// Detect the OS speech engine for the current host
    pub fn detect() -> Self {
        match std::env::consts::OS {
            "windows" => SpeechPlatform::Sapi,
            "macos" => SpeechPlatform::Say,
            "linux" if is_wsl() => SpeechPlatform::Sapi,
            _ => SpeechPlatform::Espeak,
        }
    }

    /// Parse a configured engine name; `auto` and unknown names return None
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "sapi" => Some(SpeechPlatform::Sapi),
            "say" => Some(SpeechPlatform::Say),
            "espeak" | "espeak-ng" => Some(SpeechPlatform::Espeak),
            _ => None,
        }
    }
}

/// Detect if running in WSL (Windows Subsystem for Linux)
///
/// Checks for WSL-specific indicators in /proc/version and environment variables.
pub fn is_wsl() -> bool {
    if let Ok(contents) = fs::read_to_string("/proc/version") {
        let lower = contents.to_lowercase();
        if lower.contains("microsoft") || lower.contains("wsl") {
            return true;
        }
    }

    std::env::var("WSL_DISTRO_NAME").is_ok()
}

/// Check whether a CUDA-capable NVIDIA driver is installed
pub fn cuda_available() -> bool {
    if Path::new("/proc/driver/nvidia/version").exists() {
        debug!("NVIDIA driver found via /proc");
        return true;
    }

    Command::new("nvidia-smi")
        .arg("-L")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Check that `program` can be started with `arg`
pub fn command_runs(program: &str, arg: &str) -> bool {
    Command::new(program)
        .arg(arg)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}
