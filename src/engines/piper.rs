//! piper neural TTS runtime
//!
//! Models come from the [`ModelCatalog`] and are downloaded on first load.
//! Synthesis runs the piper binary with the loaded model; in-memory output
//! uses `--output_raw` (16-bit little-endian PCM on stdout).

use super::catalog::ModelCatalog;
use super::{check_written, run_with_stdin, EngineError, ModelMetadata, NeuralEngine};
use crate::audio::pcm16_to_f32;
use crate::platform::{command_runs, Device};
use log::{debug, info};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Sample rate piper uses when a config omits it
const DEFAULT_SAMPLE_RATE: u32 = 22_050;

#[derive(Debug, Default, Deserialize)]
struct PiperConfig {
    #[serde(default)]
    audio: AudioSection,
    #[serde(default)]
    num_speakers: usize,
    #[serde(default)]
    speaker_id_map: HashMap<String, i64>,
    #[serde(default)]
    language: Option<LanguageSection>,
    #[serde(default)]
    language_id_map: HashMap<String, i64>,
}

#[derive(Debug, Deserialize)]
struct AudioSection {
    #[serde(default = "default_sample_rate")]
    sample_rate: u32,
}

impl Default for AudioSection {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
        }
    }
}

fn default_sample_rate() -> u32 {
    DEFAULT_SAMPLE_RATE
}

#[derive(Debug, Deserialize)]
struct LanguageSection {
    code: String,
}

/// Model currently held by the engine
struct LoadedModel {
    id: String,
    onnx: PathBuf,
    config: PathBuf,
    metadata: ModelMetadata,
    speaker_ids: HashMap<String, i64>,
}

/// Parse a piper `<model>.onnx.json` into metadata and the speaker id map
pub fn parse_model_config(
    json: &str,
) -> Result<(ModelMetadata, HashMap<String, i64>), EngineError> {
    let config: PiperConfig =
        serde_json::from_str(json).map_err(|e| EngineError::Metadata(e.to_string()))?;

    let mut ordered: Vec<(&String, &i64)> = config.speaker_id_map.iter().collect();
    ordered.sort_by(|a, b| a.1.cmp(b.1).then(a.0.cmp(b.0)));
    let speakers = ordered.into_iter().map(|(name, _)| name.clone()).collect();

    let metadata = ModelMetadata {
        language: config
            .language
            .map(|l| l.code)
            .unwrap_or_else(|| "unknown".to_string()),
        sample_rate: config.audio.sample_rate,
        multi_speaker: config.num_speakers > 1 || config.speaker_id_map.len() > 1,
        speakers,
        multi_lingual: config.language_id_map.len() > 1,
    };

    Ok((metadata, config.speaker_id_map))
}

/// piper process driver with its model catalog
pub struct PiperEngine {
    /// Path to the piper executable
    binary: String,

    catalog: ModelCatalog,

    device: Device,

    loaded: Option<LoadedModel>,
}

impl PiperEngine {
    /// Check that piper runs and take ownership of the catalog
    pub fn new(binary: &str, catalog: ModelCatalog, device: Device) -> Result<Self, EngineError> {
        if !command_runs(binary, "--help") {
            return Err(EngineError::NotFound(format!(
                "piper executable '{}' (see https://github.com/rhasspy/piper)",
                binary
            )));
        }

        info!("piper runtime ready on {}", device);
        Ok(Self {
            binary: binary.to_string(),
            catalog,
            device,
            loaded: None,
        })
    }

    /// Arguments selecting the loaded model, speaker and device
    fn model_args(&self, speaker: Option<&str>) -> Result<Vec<String>, EngineError> {
        let model = self.loaded.as_ref().ok_or(EngineError::NoModel)?;

        let mut args = vec![
            "-m".to_string(),
            model.onnx.display().to_string(),
            "-c".to_string(),
            model.config.display().to_string(),
        ];

        if let Some(name) = speaker {
            let id = model
                .speaker_ids
                .get(name)
                .ok_or_else(|| EngineError::UnknownSpeaker(name.to_string()))?;
            args.push("--speaker".to_string());
            args.push(id.to_string());
        }

        if self.device == Device::Cuda {
            args.push("--cuda".to_string());
        }

        Ok(args)
    }

    fn note_language(&self, language: Option<&str>) {
        // piper selects language through the model itself
        if let Some(lang) = language {
            debug!("piper ignores explicit language '{}'", lang);
        }
    }
}

impl NeuralEngine for PiperEngine {
    fn list_models(&self) -> Vec<String> {
        self.catalog.ids()
    }

    fn load_model(&mut self, model: &str) -> Result<(), EngineError> {
        let entry = self
            .catalog
            .resolve(model)
            .ok_or_else(|| EngineError::NotFound(format!("model '{}' in catalog", model)))?
            .clone();

        if !self.catalog.is_cached(&entry.id()) {
            self.catalog.download(&entry)?;
        }

        let (onnx, config) = self.catalog.model_paths(&entry);
        let (metadata, speaker_ids) = parse_model_config(&std::fs::read_to_string(&config)?)?;

        info!(
            "Loaded model {} ({} speakers)",
            entry.id(),
            metadata.speakers.len()
        );
        self.loaded = Some(LoadedModel {
            id: entry.id(),
            onnx,
            config,
            metadata,
            speaker_ids,
        });
        Ok(())
    }

    fn model_name(&self) -> Option<&str> {
        self.loaded.as_ref().map(|m| m.id.as_str())
    }

    fn metadata(&self) -> Option<&ModelMetadata> {
        self.loaded.as_ref().map(|m| &m.metadata)
    }

    fn is_cached(&self, model: &str) -> bool {
        self.catalog.is_cached(model)
    }

    fn device(&self) -> Device {
        self.device
    }

    fn synthesize(
        &mut self,
        text: &str,
        speaker: Option<&str>,
        language: Option<&str>,
    ) -> Result<Vec<f32>, EngineError> {
        self.note_language(language);
        let mut args = self.model_args(speaker)?;
        args.push("--output_raw".to_string());

        let pcm = run_with_stdin(&self.binary, &args, text)?;
        Ok(pcm16_to_f32(&pcm))
    }

    fn synthesize_to_file(
        &mut self,
        text: &str,
        speaker: Option<&str>,
        language: Option<&str>,
        path: &Path,
    ) -> Result<(), EngineError> {
        self.note_language(language);
        let mut args = self.model_args(speaker)?;
        args.push("--output_file".to_string());
        args.push(path.display().to_string());

        run_with_stdin(&self.binary, &args, text)?;
        check_written(path)
    }
}
