//! espeak-ng rule-based synthesizer
//!
//! Every synthesis call runs one espeak-ng process that writes a WAV file.
//! Text goes through stdin so that input starting with '-' is never read
//! as an option.
//!
//! Dependencies:
//! - espeak-ng (install with: sudo apt install espeak-ng)

use super::{check_written, run_with_stdin, EngineError, PhonemeEngine};
use crate::platform::command_runs;
use log::debug;
use std::path::Path;

/// espeak-ng process driver
pub struct EspeakEngine {
    /// Path to espeak-ng
    espeak_path: String,

    /// Voice name passed with -v; espeak's default when None
    voice: Option<String>,

    /// Pitch passed with -p
    pitch: Option<f32>,

    /// Speed in words per minute passed with -s
    speed: Option<f32>,
}

impl EspeakEngine {
    /// Locate espeak-ng, trying the configured binary first
    pub fn new(binary: &str) -> Result<Self, EngineError> {
        let espeak_path = Self::find_espeak(binary)?;
        debug!("Found espeak-ng at: {}", espeak_path);

        Ok(Self {
            espeak_path,
            voice: None,
            pitch: None,
            speed: None,
        })
    }

    /// Find espeak-ng executable
    fn find_espeak(binary: &str) -> Result<String, EngineError> {
        [binary, "espeak-ng", "/usr/bin/espeak-ng"]
            .into_iter()
            .find(|path| command_runs(path, "--version"))
            .map(str::to_string)
            .ok_or_else(|| {
                EngineError::NotFound(
                    "espeak-ng (install with: sudo apt install espeak-ng)".to_string(),
                )
            })
    }

    /// Path of the espeak-ng executable in use
    pub fn path(&self) -> &str {
        &self.espeak_path
    }

    /// Build the argument list for one synthesis run
    fn args(&self, path: &Path) -> Vec<String> {
        let mut args = Vec::new();
        if let Some(voice) = &self.voice {
            args.push("-v".to_string());
            args.push(voice.clone());
        }
        if let Some(pitch) = self.pitch {
            args.push("-p".to_string());
            args.push(format!("{}", pitch.round() as i64));
        }
        if let Some(speed) = self.speed {
            args.push("-s".to_string());
            args.push(format!("{}", speed.round() as i64));
        }
        args.push("-w".to_string());
        args.push(path.display().to_string());
        args.push("--stdin".to_string());
        args
    }
}

impl PhonemeEngine for EspeakEngine {
    fn set_voice(&mut self, voice: &str) {
        debug!("espeak voice -> {}", voice);
        self.voice = Some(voice.to_string());
    }

    fn set_pitch(&mut self, pitch: f32) {
        debug!("espeak pitch -> {}", pitch);
        self.pitch = Some(pitch);
    }

    fn set_speed(&mut self, speed: f32) {
        debug!("espeak speed -> {}", speed);
        self.speed = Some(speed);
    }

    fn voice(&self) -> Option<&str> {
        self.voice.as_deref()
    }

    fn synth_wav(&mut self, text: &str, path: &Path) -> Result<(), EngineError> {
        let args = self.args(path);
        run_with_stdin(&self.espeak_path, &args, text)?;
        check_written(path)
    }
}

/// Parse the table printed by `espeak-ng --voices` into voice identifiers
///
/// Returns the Language column, which `-v` accepts as is; the VoiceName
/// column spells spaces as underscores and is only for display.
///
/// ```text
/// Pty Language       Age/Gender VoiceName          File                 Other Languages
///  5  af              --/M      Afrikaans          gmw/af
/// ```
pub fn parse_voice_table(output: &str) -> Vec<String> {
    let mut voices: Vec<String> = Vec::new();
    for language in output
        .lines()
        .skip(1)
        .filter_map(|line| line.split_whitespace().nth(1))
    {
        if !voices.iter().any(|v| v == language) {
            voices.push(language.to_string());
        }
    }
    voices
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> EspeakEngine {
        EspeakEngine {
            espeak_path: "espeak-ng".to_string(),
            voice: None,
            pitch: None,
            speed: None,
        }
    }

    #[test]
    fn test_args_default() {
        let args = engine().args(Path::new("/tmp/a.wav"));
        assert_eq!(args, vec!["-w", "/tmp/a.wav", "--stdin"]);
    }

    #[test]
    fn test_args_with_params() {
        let mut e = engine();
        e.set_voice("en-gb");
        e.set_pitch(62.4);
        e.set_speed(175.0);
        let args = e.args(Path::new("out.wav"));
        assert_eq!(
            args,
            vec!["-v", "en-gb", "-p", "62", "-s", "175", "-w", "out.wav", "--stdin"]
        );
        assert_eq!(e.voice(), Some("en-gb"));
    }

    #[test]
    fn test_parse_voice_table() {
        let table = "Pty Language       Age/Gender VoiceName          File                 Other Languages\n \
                     5  af              --/M      Afrikaans          gmw/af\n \
                     5  en-gb           --/M      English_(Great_Britain) gmw/en\n \
                     5  en-gb           --/F      English_(Great_Britain) gmw/en\n";
        assert_eq!(parse_voice_table(table), vec!["af", "en-gb"]);
    }

    #[test]
    fn test_create_espeak_engine() {
        match EspeakEngine::new("espeak-ng") {
            Ok(e) => println!("✓ espeak-ng available at {}", e.path()),
            Err(e) => println!("⚠ espeak-ng not available: {}", e),
        }
    }
}
