//! Rule-based voice backed by espeak-ng

use super::{render_samples, ProgressReporter, SpeechOutput, Voice, VoiceParams, VoiceType};
use crate::config::Config;
use crate::engines::{EngineError, EspeakEngine, PhonemeEngine};
use crate::{Result, VoiceError};
use log::{debug, error};
use std::path::Path;

/// Voice driving a rule-based phoneme synthesizer
pub struct RuleBasedVoice {
    name: String,
    engine: Box<dyn PhonemeEngine>,
}

impl RuleBasedVoice {
    /// Locate espeak-ng using the configured binary
    pub fn new(name: &str, config: &Config) -> Result<Self> {
        let engine = EspeakEngine::new(&config.espeak_binary())
            .map_err(|e| VoiceError::engine_init(VoiceType::RuleBased, e))?;
        Ok(Self::with_engine(name, Box::new(engine)))
    }

    /// Wrap an already started engine
    pub fn with_engine(name: &str, engine: Box<dyn PhonemeEngine>) -> Self {
        Self {
            name: name.to_string(),
            engine,
        }
    }

    fn synth_failed(operation: &'static str, e: EngineError) -> VoiceError {
        error!("espeak-ng failed in {}: {}", operation, e);
        VoiceError::synthesis(VoiceType::RuleBased, operation, e)
    }
}

impl Voice for RuleBasedVoice {
    fn voice_type(&self) -> VoiceType {
        VoiceType::RuleBased
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn voice_option(&self) -> Option<&str> {
        self.engine.voice()
    }

    fn speak(&mut self, text: &str, target: Option<&Path>) -> Result<SpeechOutput> {
        match target {
            Some(path) => {
                self.engine
                    .synth_wav(text, path)
                    .map_err(|e| Self::synth_failed("speak", e))?;
                Ok(SpeechOutput::File(path.to_path_buf()))
            }
            None => {
                let engine = &mut self.engine;
                let samples = render_samples(|scratch| {
                    engine
                        .synth_wav(text, scratch)
                        .map_err(|e| Self::synth_failed("speak", e))
                })?;
                Ok(SpeechOutput::Samples(samples))
            }
        }
    }

    fn set_speed(&mut self, speed: f32) -> Result<()> {
        self.engine.set_speed(speed);
        Ok(())
    }

    fn set_voice_params(
        &mut self,
        params: &VoiceParams,
        _progress: Option<ProgressReporter<'_>>,
    ) -> Result<()> {
        if let Some(voice) = &params.voice {
            self.engine.set_voice(voice);
        }
        if let Some(pitch) = params.pitch {
            self.engine.set_pitch(pitch);
        }
        if params.speaker.is_some() {
            debug!("Rule-based voice '{}' has no speakers", self.name);
        }
        Ok(())
    }

    /// Voice enumeration is not offered by this backend
    fn list_voice_options(&self) -> Result<Vec<String>> {
        debug!("Rule-based voice '{}' does not list voice options", self.name);
        Ok(Vec::new())
    }
}
