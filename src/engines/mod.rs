//! Engine handles behind the voice backends
//!
//! Each voice owns exactly one engine. The traits here are the seams between
//! a voice (parameter bookkeeping, error context) and the process or model
//! that actually produces audio.

pub mod catalog;
pub mod espeak;
pub mod piper;
pub mod system;

pub use catalog::ModelCatalog;
pub use espeak::EspeakEngine;
pub use piper::PiperEngine;
pub use system::CommandSystemEngine;

use crate::platform::Device;
use log::debug;
use std::io::{self, Write};
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;
use thiserror::Error;

/// Failure reported by an engine, before the voice layer adds context
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with {status}: {stderr}")]
    Failed {
        program: String,
        status: String,
        stderr: String,
    },

    #[error("{0} not found")]
    NotFound(String),

    #[error("download failed: {0}")]
    Download(String),

    #[error("invalid metadata: {0}")]
    Metadata(String),

    #[error("unknown speaker '{0}'")]
    UnknownSpeaker(String),

    #[error("no model loaded")]
    NoModel,

    #[error("output {0} was not written")]
    MissingOutput(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Per-model facts needed to drive synthesis
#[derive(Debug, Clone, PartialEq)]
pub struct ModelMetadata {
    /// Language code the model was trained on (e.g. "en_US")
    pub language: String,
    /// Output sample rate in Hz
    pub sample_rate: u32,
    /// Whether the model has more than one speaker
    pub multi_speaker: bool,
    /// Speaker identifiers, sorted
    pub speakers: Vec<String>,
    /// Whether the model synthesizes more than one language
    pub multi_lingual: bool,
}

/// Rule-based phoneme synthesizer
///
/// Speed is in words per minute, pitch in the engine's 0-99 range; both are
/// passed through unchecked.
pub trait PhonemeEngine: Send {
    fn set_voice(&mut self, voice: &str);
    fn set_pitch(&mut self, pitch: f32);
    fn set_speed(&mut self, speed: f32);
    fn voice(&self) -> Option<&str>;
    fn synth_wav(&mut self, text: &str, path: &Path) -> Result<(), EngineError>;
}

/// Neural multi-speaker/multi-language model runtime
pub trait NeuralEngine: Send {
    /// Every installable model identifier
    fn list_models(&self) -> Vec<String>;

    /// Resolve, download if needed, and load a model
    fn load_model(&mut self, model: &str) -> Result<(), EngineError>;

    /// Identifier of the loaded model
    fn model_name(&self) -> Option<&str>;

    /// Metadata of the loaded model
    fn metadata(&self) -> Option<&ModelMetadata>;

    /// Whether a model's files are in the local cache; never downloads
    fn is_cached(&self, model: &str) -> bool;

    fn device(&self) -> Device;

    fn synthesize(
        &mut self,
        text: &str,
        speaker: Option<&str>,
        language: Option<&str>,
    ) -> Result<Vec<f32>, EngineError>;

    fn synthesize_to_file(
        &mut self,
        text: &str,
        speaker: Option<&str>,
        language: Option<&str>,
        path: &Path,
    ) -> Result<(), EngineError>;
}

/// OS speech engine session
///
/// Files are queued with `save_to_file` and only written once
/// `run_and_wait` drains the queue.
pub trait SystemEngine: Send {
    /// Display names of installed voices
    fn voices(&self) -> Result<Vec<String>, EngineError>;

    /// Active voice, None for the OS default
    fn voice(&self) -> Option<String>;

    fn set_voice(&mut self, voice: &str) -> Result<(), EngineError>;

    /// Speaking rate in words per minute
    fn set_rate(&mut self, wpm: f32);

    fn save_to_file(&mut self, text: &str, path: &Path);

    fn run_and_wait(&mut self) -> Result<(), EngineError>;
}

/// Turn a finished child process into an `EngineError` unless it succeeded
pub(crate) fn check_output(
    program: &str,
    output: std::process::Output,
) -> Result<Vec<u8>, EngineError> {
    if output.status.success() {
        Ok(output.stdout)
    } else {
        Err(EngineError::Failed {
            program: program.to_string(),
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }
}

/// Confirm an engine left a non-empty file at `path`
pub(crate) fn check_written(path: &Path) -> Result<(), EngineError> {
    match std::fs::metadata(path) {
        Ok(meta) if meta.len() > 0 => Ok(()),
        _ => Err(EngineError::MissingOutput(path.display().to_string())),
    }
}

/// Run `program` with `args`, feeding `text` on stdin, and collect stdout
///
/// stdin is written from its own thread while stdout drains, so engines
/// that answer line by line never stall on a full pipe.
pub(crate) fn run_with_stdin(
    program: &str,
    args: &[String],
    text: &str,
) -> Result<Vec<u8>, EngineError> {
    debug!("Running {} {:?}", program, args);
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|source| EngineError::Spawn {
            program: program.to_string(),
            source,
        })?;

    let writer = child.stdin.take().map(|mut stdin| {
        let input = format!("{}\n", text);
        // stdin is dropped when the thread ends, closing the pipe
        thread::spawn(move || stdin.write_all(input.as_bytes()))
    });

    let output = child.wait_with_output()?;

    if let Some(writer) = writer {
        match writer.join() {
            // An engine may exit without reading everything; its status decides
            Ok(Err(e)) if e.kind() != io::ErrorKind::BrokenPipe => return Err(e.into()),
            Ok(_) => {}
            Err(_) => {
                return Err(EngineError::Io(io::Error::new(
                    io::ErrorKind::Other,
                    format!("stdin writer for {} panicked", program),
                )))
            }
        }
    }

    check_output(program, output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::time::Duration;

    #[test]
    fn test_check_written_rejects_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.wav");
        assert!(check_written(&path).is_err());

        std::fs::write(&path, b"").unwrap();
        assert!(matches!(check_written(&path), Err(EngineError::MissingOutput(_))));

        std::fs::write(&path, b"RIFF").unwrap();
        assert!(check_written(&path).is_ok());
    }

    #[cfg(unix)]
    #[test]
    fn test_large_input_with_streaming_output_does_not_stall() {
        // Both directions exceed the pipe buffer: ~90 KB in, ~3 MB out
        let text = vec!["the quick brown fox jumps over it"; 3000].join("\n");
        let args = vec![
            "-c".to_string(),
            "while read line; do head -c 1000 /dev/zero; done".to_string(),
        ];

        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let _ = tx.send(run_with_stdin("sh", &args, &text));
        });

        let stdout = rx
            .recv_timeout(Duration::from_secs(30))
            .expect("engine process stalled on its pipes")
            .unwrap();
        assert_eq!(stdout.len(), 3000 * 1000);
    }

    #[cfg(unix)]
    #[test]
    fn test_engine_ignoring_stdin_reports_its_status() {
        let text = "x".repeat(256 * 1024);
        let args = vec!["-c".to_string(), "exit 3".to_string()];
        match run_with_stdin("sh", &args, &text) {
            Err(EngineError::Failed { program, .. }) => assert_eq!(program, "sh"),
            other => panic!("expected Failed, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_program_is_spawn_error() {
        let result = run_with_stdin("voxdub-no-such-engine", &[], "hello");
        assert!(matches!(result, Err(EngineError::Spawn { .. })));
    }
}
