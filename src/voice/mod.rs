//! Voice abstraction layer
//!
//! Provides one contract over every text-to-speech backend so callers never
//! branch on which engine produces the audio. Backends are picked by
//! [`create_voice`] from a [`VoiceType`] tag.

pub mod calibration;
pub mod factory;
pub mod neural;
pub mod params;
pub mod rule_based;
pub mod system;

pub use calibration::{words_per_minute, CalibrationPhrase, CalibrationResult, CALIBRATION_OUTPUT};
pub use factory::{create_voice, create_voice_from_tag, create_voice_with_config, VoiceBackend};
pub use neural::NeuralVoice;
pub use params::{ProgressReporter, ProgressStatus, VoiceParams};
pub use rule_based::RuleBasedVoice;
pub use system::SystemVoice;

use crate::{Result, VoiceError};
use log::debug;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Which backend variant backs a voice
///
/// Fixed for the lifetime of a voice instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VoiceType {
    /// Rule-based phoneme synthesizer (espeak-ng)
    RuleBased,
    /// Neural multi-speaker/multi-language model (piper)
    Neural,
    /// Operating-system voice engine
    System,
}

impl VoiceType {
    pub const ALL: [VoiceType; 3] = [VoiceType::RuleBased, VoiceType::Neural, VoiceType::System];

    /// Canonical tag, as accepted by [`FromStr`]
    pub fn tag(&self) -> &'static str {
        match self {
            VoiceType::RuleBased => "rule-based",
            VoiceType::Neural => "neural",
            VoiceType::System => "system",
        }
    }
}

impl fmt::Display for VoiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for VoiceType {
    type Err = VoiceError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "rule-based" | "rulebased" | "espeak" => Ok(VoiceType::RuleBased),
            "neural" | "piper" | "coqui" => Ok(VoiceType::Neural),
            "system" | "os" => Ok(VoiceType::System),
            _ => Err(VoiceError::UnsupportedVoiceType(s.to_string())),
        }
    }
}

/// Result of a `speak` call
///
/// The two modes are exclusive: a target path yields `File`, no target
/// yields `Samples`.
#[derive(Debug, Clone, PartialEq)]
pub enum SpeechOutput {
    /// Waveform in [-1.0, 1.0]
    Samples(Vec<f32>),
    /// Path of the written WAV file
    File(PathBuf),
}

impl SpeechOutput {
    pub fn samples(&self) -> Option<&[f32]> {
        match self {
            SpeechOutput::Samples(s) => Some(s),
            SpeechOutput::File(_) => None,
        }
    }

    pub fn path(&self) -> Option<&Path> {
        match self {
            SpeechOutput::Samples(_) => None,
            SpeechOutput::File(p) => Some(p),
        }
    }
}

/// The contract every backend implements
///
/// All calls block until the engine finishes. A voice is not safe for
/// concurrent mutation; callers sharing one across threads must serialize
/// `speak` and `set_voice_params` themselves.
pub trait Voice: Send {
    fn voice_type(&self) -> VoiceType;

    /// Display name given at construction
    fn name(&self) -> &str;

    /// Current voice or model selection
    fn voice_option(&self) -> Option<&str>;

    /// Synthesize `text` into `target`, or into samples when no target is given
    fn speak(&mut self, text: &str, target: Option<&Path>) -> Result<SpeechOutput>;

    /// Set speaking speed in the backend's own units
    ///
    /// Values are not validated. Backends without a speed control ignore it.
    fn set_speed(&mut self, speed: f32) -> Result<()> {
        debug!("{} backend ignores speed {}", self.voice_type(), speed);
        Ok(())
    }

    /// Apply the voice, pitch and speaker fields of `params`
    ///
    /// Fields a backend has no use for are ignored. `progress` is told when
    /// a long-running model switch starts and finishes.
    fn set_voice_params(
        &mut self,
        params: &VoiceParams,
        progress: Option<ProgressReporter<'_>>,
    ) -> Result<()>;

    /// Voices or models this backend can select
    fn list_voice_options(&self) -> Result<Vec<String>>;

    /// Write the reference phrase to `./output/calibration.wav` and measure it
    ///
    /// The `output` directory must already exist.
    fn calibrate_rate(&mut self) -> Result<CalibrationResult> {
        self.calibrate_rate_at(Path::new(CALIBRATION_OUTPUT))
    }

    /// Like [`Voice::calibrate_rate`], writing to `path`
    fn calibrate_rate_at(&mut self, path: &Path) -> Result<CalibrationResult> {
        calibration::calibrate(self, CalibrationPhrase::default(), path)
    }
}

/// Render through a scratch WAV file and return its samples
pub(crate) fn render_samples(render: impl FnOnce(&Path) -> Result<()>) -> Result<Vec<f32>> {
    let scratch = tempfile::Builder::new()
        .prefix("voxdub-")
        .suffix(".wav")
        .tempfile()?;
    render(scratch.path())?;
    crate::audio::read_wav_samples(scratch.path())
}
