//! In-process fake engines for integration tests
//!
//! Each fake writes a real (short) WAV file so calibration and sample
//! decoding run the same code paths as real engines.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use voxdub::audio::write_wav;
use voxdub::engines::{
    EngineError, ModelMetadata, NeuralEngine, PhonemeEngine, SystemEngine,
};
use voxdub::platform::Device;

pub const SAMPLE_RATE: u32 = 8_000;

pub const LESSAC: &str = "piper/en/en_US-lessac-medium";
pub const VCTK: &str = "piper/en/en_GB-vctk-medium";
pub const THORSTEN: &str = "piper/de/de_DE-thorsten-low";
pub const POLYGLOT: &str = "piper/mul/polyglot-medium";

/// Samples a fake produces for `text`: a tenth of a second per word
pub fn samples_for(text: &str) -> Vec<f32> {
    let words = text.split_whitespace().count().max(1);
    vec![0.1; words * SAMPLE_RATE as usize / 10]
}

fn write_speech(text: &str, path: &Path) -> Result<(), EngineError> {
    write_wav(path, &samples_for(text), SAMPLE_RATE)
        .map_err(|e| EngineError::MissingOutput(format!("{}: {}", path.display(), e)))
}

fn meta(language: &str, speakers: &[&str], multi_lingual: bool) -> ModelMetadata {
    ModelMetadata {
        language: language.to_string(),
        sample_rate: SAMPLE_RATE,
        multi_speaker: speakers.len() > 1,
        speakers: speakers.iter().map(|s| s.to_string()).collect(),
        multi_lingual,
    }
}

/// What the fake neural engine was last asked to do
#[derive(Debug, Default)]
pub struct NeuralCalls {
    pub loads: Vec<String>,
    pub last_language: Option<Option<String>>,
    pub last_speaker: Option<Option<String>>,
}

pub struct FakeNeural {
    catalog: BTreeMap<String, ModelMetadata>,
    cached: HashSet<String>,
    loaded: Option<String>,
    pub calls: Arc<Mutex<NeuralCalls>>,
}

impl FakeNeural {
    pub fn new() -> Self {
        let mut catalog = BTreeMap::new();
        catalog.insert(LESSAC.to_string(), meta("en_US", &[], false));
        catalog.insert(VCTK.to_string(), meta("en_GB", &["p225", "p226", "p239"], false));
        catalog.insert(THORSTEN.to_string(), meta("de_DE", &[], false));
        catalog.insert(POLYGLOT.to_string(), meta("mul", &[], true));

        Self {
            catalog,
            cached: HashSet::new(),
            loaded: None,
            calls: Arc::new(Mutex::new(NeuralCalls::default())),
        }
    }

    fn record(&self, speaker: Option<&str>, language: Option<&str>) {
        let mut calls = self.calls.lock().unwrap();
        calls.last_speaker = Some(speaker.map(str::to_string));
        calls.last_language = Some(language.map(str::to_string));
    }
}

impl NeuralEngine for FakeNeural {
    fn list_models(&self) -> Vec<String> {
        self.catalog.keys().cloned().collect()
    }

    fn load_model(&mut self, model: &str) -> Result<(), EngineError> {
        if !self.catalog.contains_key(model) {
            return Err(EngineError::NotFound(format!("model '{}' in catalog", model)));
        }
        self.calls.lock().unwrap().loads.push(model.to_string());
        self.cached.insert(model.to_string());
        self.loaded = Some(model.to_string());
        Ok(())
    }

    fn model_name(&self) -> Option<&str> {
        self.loaded.as_deref()
    }

    fn metadata(&self) -> Option<&ModelMetadata> {
        self.loaded.as_ref().and_then(|m| self.catalog.get(m))
    }

    fn is_cached(&self, model: &str) -> bool {
        self.cached.contains(model)
    }

    fn device(&self) -> Device {
        Device::Cpu
    }

    fn synthesize(
        &mut self,
        text: &str,
        speaker: Option<&str>,
        language: Option<&str>,
    ) -> Result<Vec<f32>, EngineError> {
        self.record(speaker, language);
        Ok(samples_for(text))
    }

    fn synthesize_to_file(
        &mut self,
        text: &str,
        speaker: Option<&str>,
        language: Option<&str>,
        path: &Path,
    ) -> Result<(), EngineError> {
        self.record(speaker, language);
        write_speech(text, path)
    }
}

#[derive(Default)]
pub struct FakePhoneme {
    voice: Option<String>,
}

impl PhonemeEngine for FakePhoneme {
    fn set_voice(&mut self, voice: &str) {
        self.voice = Some(voice.to_string());
    }

    fn set_pitch(&mut self, _pitch: f32) {}

    fn set_speed(&mut self, _speed: f32) {}

    fn voice(&self) -> Option<&str> {
        self.voice.as_deref()
    }

    fn synth_wav(&mut self, text: &str, path: &Path) -> Result<(), EngineError> {
        write_speech(text, path)
    }
}

/// OS engine fake; files are only written by `run_and_wait`
pub struct FakeSystem {
    voices: Vec<String>,
    voice: Option<String>,
    pub rate: Option<f32>,
    queue: Vec<(String, std::path::PathBuf)>,
}

impl FakeSystem {
    pub fn new() -> Self {
        Self {
            voices: vec!["Alex".to_string(), "Samantha".to_string()],
            voice: Some("Alex".to_string()),
            rate: None,
            queue: Vec::new(),
        }
    }
}

impl SystemEngine for FakeSystem {
    fn voices(&self) -> Result<Vec<String>, EngineError> {
        Ok(self.voices.clone())
    }

    fn voice(&self) -> Option<String> {
        self.voice.clone()
    }

    fn set_voice(&mut self, voice: &str) -> Result<(), EngineError> {
        if !self.voices.iter().any(|v| v == voice) {
            return Err(EngineError::NotFound(format!("voice '{}'", voice)));
        }
        self.voice = Some(voice.to_string());
        Ok(())
    }

    fn set_rate(&mut self, wpm: f32) {
        self.rate = Some(wpm);
    }

    fn save_to_file(&mut self, text: &str, path: &Path) {
        self.queue.push((text.to_string(), path.to_path_buf()));
    }

    fn run_and_wait(&mut self) -> Result<(), EngineError> {
        for (text, path) in std::mem::take(&mut self.queue) {
            if path
                .parent()
                .map_or(false, |p| !p.as_os_str().is_empty() && !p.exists())
            {
                return Err(EngineError::MissingOutput(path.display().to_string()));
            }
            write_speech(&text, &path)?;
        }
        Ok(())
    }
}

/// Shell stand-in for espeak-ng: answers `--version` and `--voices`, and for
/// synthesis writes a small file to the `-w` target, failing on unknown `-v`
#[cfg(unix)]
pub fn fake_espeak(dir: &Path) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let script = dir.join("espeak-ng");
    std::fs::write(
        &script,
        r#"#!/bin/sh
case "$1" in
    --version) echo "eSpeak NG text-to-speech: 1.51"; exit 0 ;;
    --voices)
        echo "Pty Language       Age/Gender VoiceName          File                 Other Languages"
        echo " 5  af              --/M      Afrikaans          gmw/af"
        echo " 2  en              --/M      English            gmw/en"
        echo " 5  en-gb           --/M      English_(Great_Britain) gmw/en"
        exit 0 ;;
esac
out=""
while [ $# -gt 0 ]; do
    case "$1" in
        -v) case "$2" in af|en|en-gb) ;; *) echo "unknown voice $2" >&2; exit 1 ;; esac; shift ;;
        -w) out="$2"; shift ;;
    esac
    shift
done
cat > /dev/null
printf 'RIFF....WAVEfmt ' > "$out"
"#,
    )
    .unwrap();

    let mut perms = std::fs::metadata(&script).unwrap().permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&script, perms).unwrap();
    script
}
