//! Voice construction
//!
//! The only place a [`VoiceType`] is mapped to a backend. Construction
//! starts the backend's engine before returning, so building a neural or
//! system voice can take seconds.

use super::{
    CalibrationResult, NeuralVoice, ProgressReporter, RuleBasedVoice, SpeechOutput, SystemVoice,
    Voice, VoiceParams, VoiceType,
};
use crate::config::Config;
use crate::Result;
use log::info;
use std::path::Path;

/// A voice of any backend
///
/// Implements [`Voice`] by delegation; match on it to reach
/// backend-specific operations.
pub enum VoiceBackend {
    RuleBased(RuleBasedVoice),
    Neural(NeuralVoice),
    System(SystemVoice),
}

impl VoiceBackend {
    fn inner(&self) -> &dyn Voice {
        match self {
            VoiceBackend::RuleBased(v) => v,
            VoiceBackend::Neural(v) => v,
            VoiceBackend::System(v) => v,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn Voice {
        match self {
            VoiceBackend::RuleBased(v) => v,
            VoiceBackend::Neural(v) => v,
            VoiceBackend::System(v) => v,
        }
    }

    pub fn as_neural(&self) -> Option<&NeuralVoice> {
        match self {
            VoiceBackend::Neural(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_neural_mut(&mut self) -> Option<&mut NeuralVoice> {
        match self {
            VoiceBackend::Neural(v) => Some(v),
            _ => None,
        }
    }
}

impl Voice for VoiceBackend {
    fn voice_type(&self) -> VoiceType {
        self.inner().voice_type()
    }

    fn name(&self) -> &str {
        self.inner().name()
    }

    fn voice_option(&self) -> Option<&str> {
        self.inner().voice_option()
    }

    fn speak(&mut self, text: &str, target: Option<&Path>) -> Result<SpeechOutput> {
        self.inner_mut().speak(text, target)
    }

    fn set_speed(&mut self, speed: f32) -> Result<()> {
        self.inner_mut().set_speed(speed)
    }

    fn set_voice_params(
        &mut self,
        params: &VoiceParams,
        progress: Option<ProgressReporter<'_>>,
    ) -> Result<()> {
        self.inner_mut().set_voice_params(params, progress)
    }

    fn list_voice_options(&self) -> Result<Vec<String>> {
        self.inner().list_voice_options()
    }

    fn calibrate_rate_at(&mut self, path: &Path) -> Result<CalibrationResult> {
        self.inner_mut().calibrate_rate_at(path)
    }
}

impl From<RuleBasedVoice> for VoiceBackend {
    fn from(v: RuleBasedVoice) -> Self {
        VoiceBackend::RuleBased(v)
    }
}

impl From<NeuralVoice> for VoiceBackend {
    fn from(v: NeuralVoice) -> Self {
        VoiceBackend::Neural(v)
    }
}

impl From<SystemVoice> for VoiceBackend {
    fn from(v: SystemVoice) -> Self {
        VoiceBackend::System(v)
    }
}

/// Create a voice of `voice_type`, configured from ~/.voxdub.cfg
///
/// `init_args` is applied once the engine is up: speed first, then the
/// voice, pitch and speaker fields. If either step fails the half-built
/// voice is dropped and the error returned.
pub fn create_voice(
    voice_type: VoiceType,
    init_args: &VoiceParams,
    name: &str,
) -> Result<VoiceBackend> {
    let config = Config::load()?;
    create_voice_with_config(&config, voice_type, init_args, name)
}

/// Create a voice from a textual tag such as "neural" or "espeak"
///
/// Unrecognized tags fail with `UnsupportedVoiceType` before anything is
/// constructed.
pub fn create_voice_from_tag(
    tag: &str,
    init_args: &VoiceParams,
    name: &str,
) -> Result<VoiceBackend> {
    let voice_type: VoiceType = tag.parse()?;
    create_voice(voice_type, init_args, name)
}

/// Create a voice using an explicit configuration
pub fn create_voice_with_config(
    config: &Config,
    voice_type: VoiceType,
    init_args: &VoiceParams,
    name: &str,
) -> Result<VoiceBackend> {
    info!("Creating {} voice '{}'", voice_type, name);

    let mut voice = match voice_type {
        VoiceType::RuleBased => VoiceBackend::RuleBased(RuleBasedVoice::new(name, config)?),
        VoiceType::Neural => VoiceBackend::Neural(NeuralVoice::new(name, config)?),
        VoiceType::System => VoiceBackend::System(SystemVoice::new(name, config)?),
    };

    apply_init_args(&mut voice, init_args)?;
    if let (Some(language), Some(neural)) = (&init_args.language, voice.as_neural_mut()) {
        neural.set_language(language)?;
    }
    Ok(voice)
}

/// Apply construction-time parameters to a fresh voice
pub fn apply_init_args<V: Voice + ?Sized>(voice: &mut V, init_args: &VoiceParams) -> Result<()> {
    if let Some(speed) = init_args.speed {
        voice.set_speed(speed)?;
    }
    if init_args.voice.is_some() || init_args.pitch.is_some() || init_args.speaker.is_some() {
        voice.set_voice_params(init_args, None)?;
    }
    Ok(())
}
