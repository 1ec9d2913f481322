//! System voice tests

mod common;

use common::FakeSystem;
use std::path::Path;
use voxdub::engines::CommandSystemEngine;
use voxdub::platform::SpeechPlatform;
use voxdub::voice::SystemVoice;
use voxdub::{Voice, VoiceError, VoiceParams, VoiceType};

fn narrator() -> SystemVoice {
    SystemVoice::with_engine("Narrator", Box::new(FakeSystem::new()))
}

#[test]
fn test_narrator_defaults() {
    let voice = narrator();
    assert_eq!(voice.voice_type(), VoiceType::System);
    assert_eq!(voice.name(), "Narrator");
    assert_eq!(voice.voice_option(), Some("Alex"));
    assert_eq!(voice.list_voice_options().unwrap(), vec!["Alex", "Samantha"]);
}

#[test]
fn test_speak_to_file_blocks_until_written() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("narrator.wav");
    let mut voice = narrator();

    let output = voice.speak("once upon a time", Some(&path)).unwrap();
    assert_eq!(output.path(), Some(path.as_path()));
    assert!(std::fs::metadata(&path).unwrap().len() > 0);
}

#[test]
fn test_speak_to_samples() {
    let mut voice = narrator();
    let output = voice.speak("once upon a time", None).unwrap();
    let samples = output.samples().unwrap();
    assert_eq!(samples.len(), common::samples_for("once upon a time").len());
}

#[test]
fn test_select_voice() {
    let mut voice = narrator();
    voice
        .set_voice_params(&VoiceParams::new().voice("Samantha").pitch(40.0), None)
        .unwrap();
    assert_eq!(voice.voice_option(), Some("Samantha"));
    voice.set_speed(200.0).unwrap();
}

#[test]
fn test_unknown_voice_keeps_selection() {
    let mut voice = narrator();
    let result = voice.set_voice_params(&VoiceParams::new().voice("Zarvox"), None);
    match result {
        Err(VoiceError::Synthesis { backend, .. }) => assert_eq!(backend, VoiceType::System),
        other => panic!("expected Synthesis error, got {:?}", other),
    }
    assert_eq!(voice.voice_option(), Some("Alex"));
}

#[test]
fn test_speak_into_missing_directory_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nope").join("narrator.wav");
    let mut voice = narrator();
    assert!(matches!(
        voice.speak("hello", Some(&path)),
        Err(VoiceError::Synthesis { operation: "speak", .. })
    ));
}

/// List, select the first option, speak to a file
fn speak_with_first_option(voice: &mut SystemVoice, path: &Path) {
    let options = voice.list_voice_options().unwrap();
    assert!(!options.is_empty(), "engine lists no voices");
    assert!(voice.voice_option().is_some());

    voice
        .set_voice_params(&VoiceParams::new().voice(options[0].as_str()), None)
        .unwrap();
    assert_eq!(voice.voice_option(), Some(options[0].as_str()));

    let output = voice.speak("hello world", Some(path)).unwrap();
    assert_eq!(output.path(), Some(path));
    assert!(std::fs::metadata(path).unwrap().len() > 0);
}

#[cfg(unix)]
#[test]
fn test_espeak_session_full_scenario() {
    let dir = tempfile::tempdir().unwrap();
    let espeak = common::fake_espeak(dir.path());
    let binary = espeak.to_string_lossy();
    let engine = CommandSystemEngine::new(SpeechPlatform::Espeak, &binary).unwrap();
    let mut voice = SystemVoice::with_engine("Narrator", Box::new(engine));

    assert_eq!(voice.voice_option(), Some("en"));
    assert_eq!(voice.list_voice_options().unwrap(), vec!["af", "en", "en-gb"]);

    speak_with_first_option(&mut voice, &dir.path().join("out.wav"));

    // Every listed option is accepted by -v
    for option in voice.list_voice_options().unwrap() {
        voice
            .set_voice_params(&VoiceParams::new().voice(option.as_str()), None)
            .unwrap();
        let path = dir.path().join(format!("{}.wav", option));
        voice.speak("hello world", Some(&path)).unwrap();
    }
}

#[test]
fn test_host_engine_when_available() {
    // Only meaningful where an OS speech engine is installed
    let engine = match CommandSystemEngine::detect("espeak-ng") {
        Ok(engine) => engine,
        Err(e) => {
            println!("⚠ no OS speech engine available: {}", e);
            return;
        }
    };
    let mut voice = SystemVoice::with_engine("Narrator", Box::new(engine));
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.wav");

    speak_with_first_option(&mut voice, &path);
    assert!(voxdub::audio::wav_duration(&path).is_ok());
}
