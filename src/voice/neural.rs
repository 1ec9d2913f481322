//! Neural voice backed by a multi-speaker/multi-language model runtime
//!
//! Model switches are the expensive part: a switch may download hundreds of
//! megabytes before loading, and blocks the calling thread throughout.
//! Speaker facts (`is_multispeaker`, the speaker list) belong to the loaded
//! model and are re-read from it on every `set_voice_params` call.

use super::{ProgressReporter, ProgressStatus, SpeechOutput, Voice, VoiceParams, VoiceType};
use crate::config::Config;
use crate::engines::catalog::{self, ModelCatalog, ALL_LANGUAGES};
use crate::engines::{EngineError, NeuralEngine, PiperEngine};
use crate::platform::Device;
use crate::{Result, VoiceError};
use log::{debug, error, info};
use std::path::Path;

/// Language a multi-lingual model is asked to speak
///
/// Kept at English regardless of the selected language, which only filters
/// the model catalog.
pub const SPEAK_LANGUAGE: &str = "en";

/// Language selected when a neural voice is created
const DEFAULT_LANGUAGE: &str = "en";

/// Voice driving a neural TTS model
pub struct NeuralVoice {
    name: String,
    engine: Box<dyn NeuralEngine>,

    /// Identifier of the loaded model
    voice_option: Option<String>,

    /// Catalog languages, [`ALL_LANGUAGES`] first
    languages: Vec<String>,
    selected_lang: String,

    /// Valid only for the model named by `voice_option`
    is_multispeaker: bool,
    speakers: Vec<String>,

    speaker: Option<String>,
}

impl NeuralVoice {
    /// Open the model catalog and start the piper runtime
    ///
    /// Fetches the catalog on first use, which can take several seconds.
    pub fn new(name: &str, config: &Config) -> Result<Self> {
        let init_failed = |e: EngineError| VoiceError::engine_init(VoiceType::Neural, e);

        let catalog = ModelCatalog::load(&config.catalog_url(), &config.models_dir())
            .map_err(init_failed)?;
        let engine = PiperEngine::new(&config.piper_binary(), catalog, config.device())
            .map_err(init_failed)?;

        Ok(Self::with_engine(name, Box::new(engine)))
    }

    /// Wrap an already started engine
    pub fn with_engine(name: &str, engine: Box<dyn NeuralEngine>) -> Self {
        let models = engine.list_models();
        let languages = catalog::languages(models.iter().map(String::as_str));
        debug!(
            "Neural voice '{}' on {} with {} models in {} languages",
            name,
            engine.device(),
            models.len(),
            languages.len() - 1
        );

        Self {
            name: name.to_string(),
            voice_option: engine.model_name().map(str::to_string),
            engine,
            languages,
            selected_lang: DEFAULT_LANGUAGE.to_string(),
            is_multispeaker: false,
            speakers: Vec::new(),
            speaker: None,
        }
    }

    /// Whether a model's files are already cached locally
    ///
    /// Never triggers a download.
    pub fn is_model_downloaded(&self, model: &str) -> bool {
        self.engine.is_cached(model)
    }

    /// Speakers of the loaded model, empty for single-speaker models
    pub fn list_speakers(&self) -> &[String] {
        if self.is_multispeaker {
            &self.speakers
        } else {
            &[]
        }
    }

    pub fn is_multispeaker(&self) -> bool {
        self.is_multispeaker
    }

    pub fn speaker(&self) -> Option<&str> {
        self.speaker.as_deref()
    }

    pub fn device(&self) -> Device {
        self.engine.device()
    }

    /// Catalog languages, with [`ALL_LANGUAGES`] first
    pub fn languages(&self) -> &[String] {
        &self.languages
    }

    pub fn selected_language(&self) -> &str {
        &self.selected_lang
    }

    /// Select the language used to filter the model catalog
    pub fn set_language(&mut self, language: &str) -> Result<()> {
        if !self.languages.iter().any(|l| l == language) {
            return Err(VoiceError::Other(format!(
                "neural voice '{}' offers no language '{}'",
                self.name, language
            )));
        }
        debug!("Neural voice '{}' language -> {}", self.name, language);
        self.selected_lang = language.to_string();
        Ok(())
    }

    /// Catalog models in the selected language, or all of them
    pub fn models_for_selected_language(&self) -> Vec<String> {
        let models = self.engine.list_models();
        if self.selected_lang == ALL_LANGUAGES {
            return models;
        }
        models
            .into_iter()
            .filter(|m| catalog::language_of(m) == Some(self.selected_lang.as_str()))
            .collect()
    }

    /// Full catalog identifier for `model`, which may be a bare voice key
    ///
    /// Unknown names come back unchanged so the load reports them.
    fn canonical_model(&self, model: &str) -> String {
        self.engine
            .list_models()
            .into_iter()
            .find(|id| id == model || id.rsplit('/').next() == Some(model))
            .unwrap_or_else(|| model.to_string())
    }

    /// Load `model`, reporting start and finish to `progress`
    fn switch_model(&mut self, model: &str, progress: Option<ProgressReporter<'_>>) -> Result<()> {
        info!("Neural voice '{}' switching to model {}", self.name, model);
        let load_failed = |e: EngineError| VoiceError::ModelLoad {
            backend: VoiceType::Neural,
            model: model.to_string(),
            message: e.to_string(),
        };

        match progress {
            Some(report) => {
                report(ProgressStatus::Percent(0), "downloading");
                self.engine.load_model(model).map_err(load_failed)?;
                report(ProgressStatus::Done, "done!");
            }
            None => self.engine.load_model(model).map_err(load_failed)?,
        }
        Ok(())
    }

    /// Re-read speaker facts from the loaded model
    fn refresh_speakers(&mut self) {
        match self.engine.metadata() {
            Some(meta) => {
                self.is_multispeaker = meta.multi_speaker;
                self.speakers = meta.speakers.clone();
            }
            None => {
                self.is_multispeaker = false;
                self.speakers.clear();
            }
        }
    }

    /// Reject speaker settings the loaded model cannot honor
    fn check_speaker(&self) -> Result<()> {
        let model = self
            .voice_option
            .as_deref()
            .ok_or_else(|| VoiceError::synthesis(VoiceType::Neural, "speak", "no model loaded"))?;

        match &self.speaker {
            None if self.is_multispeaker => Err(VoiceError::synthesis(
                VoiceType::Neural,
                "speak",
                format!("model {} has multiple speakers; select one first", model),
            )),
            Some(speaker) if !self.list_speakers().contains(speaker) => {
                Err(VoiceError::synthesis(
                    VoiceType::Neural,
                    "speak",
                    format!("model {} has no speaker '{}'", model, speaker),
                ))
            }
            _ => Ok(()),
        }
    }
}

impl Voice for NeuralVoice {
    fn voice_type(&self) -> VoiceType {
        VoiceType::Neural
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn voice_option(&self) -> Option<&str> {
        self.voice_option.as_deref()
    }

    fn speak(&mut self, text: &str, target: Option<&Path>) -> Result<SpeechOutput> {
        self.check_speaker()?;

        let multi_lingual = self.engine.metadata().map_or(false, |m| m.multi_lingual);
        let language = multi_lingual.then_some(SPEAK_LANGUAGE);
        let speaker = self.speaker.clone();
        let failed = |e: EngineError| {
            error!("Neural synthesis failed: {}", e);
            VoiceError::synthesis(VoiceType::Neural, "speak", e)
        };

        match target {
            Some(path) => {
                self.engine
                    .synthesize_to_file(text, speaker.as_deref(), language, path)
                    .map_err(failed)?;
                Ok(SpeechOutput::File(path.to_path_buf()))
            }
            None => {
                let samples = self
                    .engine
                    .synthesize(text, speaker.as_deref(), language)
                    .map_err(failed)?;
                Ok(SpeechOutput::Samples(samples))
            }
        }
    }

    fn set_voice_params(
        &mut self,
        params: &VoiceParams,
        progress: Option<ProgressReporter<'_>>,
    ) -> Result<()> {
        let requested = params.voice.as_deref().map(|m| self.canonical_model(m));
        let switched = match requested.as_deref() {
            Some(model) if self.voice_option.as_deref() != Some(model) => {
                self.switch_model(model, progress)
            }
            _ => Ok(()),
        };

        // Speaker facts follow whatever model is loaded now, switch or not
        self.voice_option = self.engine.model_name().map(str::to_string);
        self.refresh_speakers();
        switched?;

        if params.pitch.is_some() {
            debug!("Neural voice '{}' ignores pitch", self.name);
        }
        self.speaker = params.speaker.clone();
        Ok(())
    }

    fn list_voice_options(&self) -> Result<Vec<String>> {
        Ok(self.engine.list_models())
    }
}
