//! OS speech engine session
//!
//! Drives whatever speech engine the host ships with:
//! - Windows SAPI (System.Speech.Synthesis) through PowerShell, also from WSL
//! - `say` on macOS
//! - espeak-ng on Linux
//!
//! Installed voices are captured once when the session starts. Requests to
//! write files are queued and rendered one process at a time by
//! `run_and_wait`, which returns only after every file is finalized.

use super::espeak::{parse_voice_table, EspeakEngine};
use super::{check_output, check_written, run_with_stdin, EngineError, SystemEngine};
use crate::platform::{command_runs, is_wsl, SpeechPlatform};
use log::{debug, info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// SAPI's rate step: each unit speeds speech up by about 11%
const SAPI_RATE_BASE: f32 = 1.11;

/// Words per minute at SAPI rate 0
const SAPI_NORMAL_WPM: f32 = 156.63;

/// `say -v ?` lines look like "Alex                en_US    # Most people recognize me..."
static SAY_VOICE_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(.+?)\s{2,}[a-z]{2,3}[_-][A-Za-z0-9]+\s+#").expect("valid say voice pattern")
});

/// Voice espeak-ng speaks with when no `-v` is given
const ESPEAK_DEFAULT_VOICE: &str = "en";

/// PowerShell prelude creating `$synth`
const SAPI_PRELUDE: &str = "Add-Type -AssemblyName System.Speech\n\
$synth = New-Object System.Speech.Synthesis.SpeechSynthesizer\n";

/// One queued file render
struct Job {
    text: String,
    path: PathBuf,
}

/// Command-driven OS speech engine
pub struct CommandSystemEngine {
    platform: SpeechPlatform,

    /// Executable for the platform (powershell, say or espeak-ng)
    program: String,

    /// Voices installed when the session started
    voices: Vec<String>,

    /// Active voice, None for the OS default
    voice: Option<String>,

    /// Speaking rate in words per minute
    rate: Option<f32>,

    /// Renders waiting for `run_and_wait`
    queue: Vec<Job>,
}

impl CommandSystemEngine {
    /// Start a session on `platform`
    ///
    /// `espeak_binary` is only consulted for [`SpeechPlatform::Espeak`].
    pub fn new(platform: SpeechPlatform, espeak_binary: &str) -> Result<Self, EngineError> {
        debug!("Starting {:?} speech session", platform);

        let (program, voices, voice) = match platform {
            SpeechPlatform::Sapi => {
                let program = Self::find_powershell()?;
                let (voices, default) = Self::sapi_voices(&program)?;
                (program, voices, default)
            }
            SpeechPlatform::Say => {
                let output = Command::new("say")
                    .args(["-v", "?"])
                    .output()
                    .map_err(|source| EngineError::Spawn {
                        program: "say".to_string(),
                        source,
                    })?;
                let stdout = check_output("say", output)?;
                let voices = parse_say_voices(&String::from_utf8_lossy(&stdout));
                let default = default_voice(&voices, Self::say_selected_voice().as_deref());
                ("say".to_string(), voices, default)
            }
            SpeechPlatform::Espeak => {
                let program = EspeakEngine::new(espeak_binary)?.path().to_string();
                let output = Command::new(&program)
                    .arg("--voices")
                    .output()
                    .map_err(|source| EngineError::Spawn {
                        program: program.clone(),
                        source,
                    })?;
                let stdout = check_output(&program, output)?;
                let voices = parse_voice_table(&String::from_utf8_lossy(&stdout));
                let default = default_voice(&voices, Some(ESPEAK_DEFAULT_VOICE));
                (program, voices, default)
            }
        };

        info!(
            "{:?} speech session started with {} voices",
            platform,
            voices.len()
        );

        Ok(Self {
            platform,
            program,
            voices,
            voice,
            rate: None,
            queue: Vec::new(),
        })
    }

    /// Start a session on the detected host engine
    pub fn detect(espeak_binary: &str) -> Result<Self, EngineError> {
        Self::new(SpeechPlatform::detect(), espeak_binary)
    }

    /// Voice picked in macOS System Settings, if any
    fn say_selected_voice() -> Option<String> {
        let output = Command::new("defaults")
            .args(["read", "com.apple.speech.voice.prefs", "SelectedVoiceName"])
            .stderr(Stdio::null())
            .output()
            .ok()?;
        let name = String::from_utf8_lossy(&output.stdout).trim().to_string();
        (output.status.success() && !name.is_empty()).then_some(name)
    }

    /// Find PowerShell executable (native or through WSL interop)
    fn find_powershell() -> Result<String, EngineError> {
        [
            "powershell.exe",
            "/mnt/c/Windows/System32/WindowsPowerShell/v1.0/powershell.exe",
        ]
        .into_iter()
        .find(|path| command_runs(path, "-Help"))
        .map(str::to_string)
        .ok_or_else(|| {
            EngineError::NotFound("PowerShell (WSL interop may not be enabled)".to_string())
        })
    }

    fn powershell_args(script: &str) -> Vec<String> {
        vec![
            "-NoProfile".to_string(),
            "-NonInteractive".to_string(),
            "-Command".to_string(),
            script.to_string(),
        ]
    }

    /// Installed SAPI voices and the synthesizer's default voice
    fn sapi_voices(program: &str) -> Result<(Vec<String>, Option<String>), EngineError> {
        let script = format!(
            "{}Write-Output ('*' + $synth.Voice.Name)\n\
             $synth.GetInstalledVoices() | Where-Object {{ $_.Enabled }} | \
             ForEach-Object {{ $_.VoiceInfo.Name }}",
            SAPI_PRELUDE
        );
        let stdout = run_with_stdin(program, &Self::powershell_args(&script), "")?;
        Ok(parse_sapi_voices(&String::from_utf8_lossy(&stdout)))
    }

    /// Path as the engine process sees it
    fn engine_path(&self, path: &Path) -> String {
        if self.platform == SpeechPlatform::Sapi && is_wsl() {
            let converted = Command::new("wslpath")
                .arg("-w")
                .arg(path)
                .stderr(Stdio::null())
                .output();
            match converted {
                Ok(out) if out.status.success() => {
                    return String::from_utf8_lossy(&out.stdout).trim().to_string();
                }
                _ => warn!("wslpath failed for {:?}, passing it unchanged", path),
            }
        }
        path.display().to_string()
    }

    /// Program arguments rendering one job
    fn render_args(&self, path: &str) -> Vec<String> {
        let mut args = Vec::new();
        match self.platform {
            SpeechPlatform::Sapi => {
                let mut script = SAPI_PRELUDE.to_string();
                if let Some(voice) = &self.voice {
                    script.push_str(&format!("$synth.SelectVoice('{}')\n", ps_quote(voice)));
                }
                if let Some(rate) = self.rate {
                    script.push_str(&format!("$synth.Rate = {}\n", sapi_rate(rate)));
                }
                script.push_str(&format!(
                    "$synth.SetOutputToWaveFile('{}')\n\
                     $synth.Speak([Console]::In.ReadToEnd())\n\
                     $synth.Dispose()",
                    ps_quote(path)
                ));
                args = Self::powershell_args(&script);
            }
            SpeechPlatform::Say => {
                if let Some(voice) = &self.voice {
                    args.push("-v".to_string());
                    args.push(voice.clone());
                }
                if let Some(rate) = self.rate {
                    args.push("-r".to_string());
                    args.push(format!("{}", rate.round() as i64));
                }
                args.extend(
                    [
                        "--file-format=WAVE",
                        "--data-format=LEI16@22050",
                        "-o",
                        path,
                        "-f",
                        "-",
                    ]
                    .map(str::to_string),
                );
            }
            SpeechPlatform::Espeak => {
                if let Some(voice) = &self.voice {
                    args.push("-v".to_string());
                    args.push(voice.clone());
                }
                if let Some(rate) = self.rate {
                    args.push("-s".to_string());
                    args.push(format!("{}", rate.round() as i64));
                }
                args.extend(["-w", path, "--stdin"].map(str::to_string));
            }
        }
        args
    }
}

impl SystemEngine for CommandSystemEngine {
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
        debug!("System voice -> {}", voice);
        self.voice = Some(voice.to_string());
        Ok(())
    }

    fn set_rate(&mut self, wpm: f32) {
        debug!("System rate -> {} wpm", wpm);
        self.rate = Some(wpm);
    }

    fn save_to_file(&mut self, text: &str, path: &Path) {
        self.queue.push(Job {
            text: text.to_string(),
            path: path.to_path_buf(),
        });
    }

    fn run_and_wait(&mut self) -> Result<(), EngineError> {
        for job in std::mem::take(&mut self.queue) {
            let target = self.engine_path(&job.path);
            let args = self.render_args(&target);
            run_with_stdin(&self.program, &args, &job.text)?;
            check_written(&job.path)?;
        }
        Ok(())
    }
}

/// Convert words per minute to SAPI's -10..10 rate scale
pub fn sapi_rate(wpm: f32) -> i32 {
    ((wpm / SAPI_NORMAL_WPM).ln() / SAPI_RATE_BASE.ln())
        .round()
        .clamp(-10.0, 10.0) as i32
}

/// `preferred` when installed, otherwise the first installed voice
fn default_voice(voices: &[String], preferred: Option<&str>) -> Option<String> {
    preferred
        .and_then(|p| voices.iter().find(|v| v.as_str() == p))
        .or_else(|| voices.first())
        .cloned()
}

/// Escape a string for a single-quoted PowerShell literal
fn ps_quote(s: &str) -> String {
    s.replace('\'', "''")
}

/// Split SAPI listing output into voices and the '*'-marked default
fn parse_sapi_voices(output: &str) -> (Vec<String>, Option<String>) {
    let mut voices = Vec::new();
    let mut default = None;
    for line in output.lines().map(str::trim).filter(|l| !l.is_empty()) {
        match line.strip_prefix('*') {
            Some(name) => default = Some(name.to_string()),
            None => voices.push(line.to_string()),
        }
    }
    (voices, default)
}

/// Voice names from `say -v ?`
pub fn parse_say_voices(output: &str) -> Vec<String> {
    output
        .lines()
        .filter_map(|line| SAY_VOICE_LINE.captures(line))
        .map(|caps| caps[1].trim().to_string())
        .collect()
}
