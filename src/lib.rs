//! voxdub - voice abstraction layer
//!
//! One contract over rule-based (espeak-ng), neural (piper) and operating
//! system text-to-speech engines, plus speaking-rate calibration.

pub mod audio;
pub mod config;
pub mod engines;
pub mod error;
pub mod platform;
pub mod voice;

pub use error::{Result, VoiceError};
pub use voice::{create_voice, SpeechOutput, Voice, VoiceBackend, VoiceParams, VoiceType};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const APP_NAME: &str = "voxdub";
