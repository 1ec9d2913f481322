//! Error types for voxdub

use crate::voice::VoiceType;
use std::io;
use thiserror::Error;

/// Main error type for the voice layer
///
/// Backend errors name the backend and, for synthesis, the operation that
/// failed, since the same call runs on a different engine per backend.
#[derive(Error, Debug)]
pub enum VoiceError {
    #[error("Unsupported voice type: {0}")]
    UnsupportedVoiceType(String),

    #[error("{backend} engine failed to start: {message}")]
    EngineInit { backend: VoiceType, message: String },

    #[error("{backend} backend could not load model '{model}': {message}")]
    ModelLoad {
        backend: VoiceType,
        model: String,
        message: String,
    },

    #[error("{backend} backend failed in {operation}: {message}")]
    Synthesis {
        backend: VoiceType,
        operation: &'static str,
        message: String,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("INI parse error: {0}")]
    IniParse(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Audio error: {0}")]
    Audio(String),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for voice operations
pub type Result<T> = std::result::Result<T, VoiceError>;

impl VoiceError {
    /// Build an engine start-up error for `backend`
    pub fn engine_init(backend: VoiceType, message: impl ToString) -> Self {
        VoiceError::EngineInit {
            backend,
            message: message.to_string(),
        }
    }

    /// Build a synthesis error for `backend` failing in `operation`
    pub fn synthesis(
        backend: VoiceType,
        operation: &'static str,
        message: impl ToString,
    ) -> Self {
        VoiceError::Synthesis {
            backend,
            operation,
            message: message.to_string(),
        }
    }

    /// The backend this error came from, if any
    pub fn backend(&self) -> Option<VoiceType> {
        match self {
            VoiceError::EngineInit { backend, .. }
            | VoiceError::ModelLoad { backend, .. }
            | VoiceError::Synthesis { backend, .. } => Some(*backend),
            _ => None,
        }
    }
}

impl From<hound::Error> for VoiceError {
    fn from(e: hound::Error) -> Self {
        VoiceError::Audio(format!("WAV error: {}", e))
    }
}
