//! System voice backed by the operating system's speech engine

use super::{render_samples, ProgressReporter, SpeechOutput, Voice, VoiceParams, VoiceType};
use crate::config::Config;
use crate::engines::{CommandSystemEngine, SystemEngine};
use crate::platform::SpeechPlatform;
use crate::{Result, VoiceError};
use log::{debug, error, warn};
use std::path::Path;

/// Voice driving the host's native speech engine
pub struct SystemVoice {
    name: String,
    engine: Box<dyn SystemEngine>,

    /// Active OS voice, as reported by the engine
    voice_option: Option<String>,
}

impl SystemVoice {
    /// Start a session on the configured or detected OS engine
    pub fn new(name: &str, config: &Config) -> Result<Self> {
        let platform = config.system_engine().unwrap_or_else(SpeechPlatform::detect);
        let engine = CommandSystemEngine::new(platform, &config.espeak_binary())
            .map_err(|e| VoiceError::engine_init(VoiceType::System, e))?;
        Ok(Self::with_engine(name, Box::new(engine)))
    }

    /// Wrap an already started engine, capturing its current voice
    pub fn with_engine(name: &str, engine: Box<dyn SystemEngine>) -> Self {
        Self {
            name: name.to_string(),
            voice_option: engine.voice(),
            engine,
        }
    }

    /// Queue `text` for `path` and block until the engine has finalized it
    fn render(engine: &mut dyn SystemEngine, text: &str, path: &Path) -> Result<()> {
        engine.save_to_file(text, path);
        engine.run_and_wait().map_err(|e| {
            error!("System engine could not write {:?}: {}", path, e);
            VoiceError::synthesis(VoiceType::System, "speak", e)
        })
    }
}

impl Voice for SystemVoice {
    fn voice_type(&self) -> VoiceType {
        VoiceType::System
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn voice_option(&self) -> Option<&str> {
        self.voice_option.as_deref()
    }

    fn speak(&mut self, text: &str, target: Option<&Path>) -> Result<SpeechOutput> {
        match target {
            Some(path) => {
                Self::render(self.engine.as_mut(), text, path)?;
                Ok(SpeechOutput::File(path.to_path_buf()))
            }
            None => {
                let engine = self.engine.as_mut();
                let samples = render_samples(|scratch| Self::render(engine, text, scratch))?;
                Ok(SpeechOutput::Samples(samples))
            }
        }
    }

    /// Rate is in words per minute
    fn set_speed(&mut self, speed: f32) -> Result<()> {
        self.engine.set_rate(speed);
        Ok(())
    }

    fn set_voice_params(
        &mut self,
        params: &VoiceParams,
        _progress: Option<ProgressReporter<'_>>,
    ) -> Result<()> {
        if let Some(voice) = &params.voice {
            self.engine
                .set_voice(voice)
                .map_err(|e| VoiceError::synthesis(VoiceType::System, "set_voice_params", e))?;
            self.voice_option = self.engine.voice();
            debug!("System voice '{}' now uses {:?}", self.name, self.voice_option);
        }
        if params.pitch.is_some() {
            warn!("System voices do not support pitch; ignoring it");
        }
        Ok(())
    }

    fn list_voice_options(&self) -> Result<Vec<String>> {
        self.engine
            .voices()
            .map_err(|e| VoiceError::synthesis(VoiceType::System, "list_voice_options", e))
    }
}
