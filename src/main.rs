//! voxdub command-line entry point
//!
//! Thin consumer of the voice layer: list voices, speak text to a file,
//! calibrate speaking rate.

use anyhow::{anyhow, bail, Context};
use log::{error, info};
use std::path::PathBuf;
use std::process;
use voxdub::voice::{words_per_minute, ProgressStatus};
use voxdub::{create_voice, SpeechOutput, Voice, VoiceBackend, VoiceParams, VoiceType};

const USAGE: &str = "Usage: voxdub [--debug] <command>

Commands:
  voices <type>                 List voice options of a backend
  speak <type> <text> [options] Synthesize text
      --out <path>              Write a WAV file instead of returning samples
      --voice <id>              Voice name or model identifier
      --speaker <id>            Speaker of a multi-speaker model
      --speed <n>               Speed in backend units
      --pitch <n>               Pitch (rule-based only)
  languages                     List neural model languages
  calibrate <type> [options]    Write ./output/calibration.wav and report wpm
  wpm <text> <seconds>          Words per minute of text spoken over a duration

Types: rule-based, neural, system";

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let debug_mode = args.iter().any(|arg| arg == "--debug" || arg == "-d");

    init_logging(debug_mode);

    let args: Vec<String> = args
        .into_iter()
        .filter(|arg| arg != "--debug" && arg != "-d")
        .collect();

    if let Err(e) = run(&args) {
        error!("Fatal error: {:#}", e);
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

fn init_logging(debug_mode: bool) {
    if debug_mode {
        // Debug mode: write to voxdub.log file
        use std::fs::OpenOptions;
        match OpenOptions::new().create(true).append(true).open("voxdub.log") {
            Ok(log_file) => {
                env_logger::Builder::new()
                    .filter_level(log::LevelFilter::Debug)
                    .target(env_logger::Target::Pipe(Box::new(log_file)))
                    .init();
            }
            Err(e) => {
                eprintln!("Warning: Failed to open voxdub.log for debug logging: {}", e);
                env_logger::Builder::new()
                    .filter_level(log::LevelFilter::Warn)
                    .init();
            }
        }
        info!("voxdub version {} starting (debug mode)", voxdub::VERSION);
    } else {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Error)
            .init();
    }
}

fn run(args: &[String]) -> anyhow::Result<()> {
    let (command, rest) = match args.split_first() {
        Some((c, r)) => (c.as_str(), r),
        None => bail!("{}", USAGE),
    };

    match command {
        "voices" => {
            let voice = build_voice(rest.first(), &VoiceParams::new())?;
            for option in voice.list_voice_options()? {
                println!("{}", option);
            }
        }
        "speak" => {
            let text = rest.get(1).ok_or_else(|| anyhow!("speak needs <type> <text>"))?;
            let (params, out) = parse_options(&rest[2..])?;
            let mut voice = build_voice(rest.first(), &params)?;

            match voice.speak(text, out.as_deref())? {
                SpeechOutput::File(path) => println!("{}", path.display()),
                SpeechOutput::Samples(samples) => println!("{} samples", samples.len()),
            }
        }
        "languages" => {
            let voice = create_voice(VoiceType::Neural, &VoiceParams::new(), voxdub::APP_NAME)?;
            if let VoiceBackend::Neural(neural) = &voice {
                for language in neural.languages() {
                    println!("{}", language);
                }
            }
        }
        "calibrate" => {
            let (params, _) = parse_options(&rest[1.min(rest.len())..])?;
            let mut voice = build_voice(rest.first(), &params)?;
            let result = voice.calibrate_rate()?;
            println!(
                "{}: {:.1} wpm over {:.2}s",
                result.path.display(),
                result.words_per_minute,
                result.duration.as_secs_f64()
            );
        }
        "wpm" => {
            let text = rest.first().ok_or_else(|| anyhow!("wpm needs <text> <seconds>"))?;
            let seconds: f64 = rest
                .get(1)
                .ok_or_else(|| anyhow!("wpm needs <text> <seconds>"))?
                .parse()
                .context("seconds must be a number")?;
            println!("{:.1}", words_per_minute(text, seconds));
        }
        "help" | "--help" | "-h" => println!("{}", USAGE),
        other => bail!("unknown command '{}'\n\n{}", other, USAGE),
    }

    Ok(())
}

/// Create the requested backend, printing model download progress
fn build_voice(tag: Option<&String>, params: &VoiceParams) -> anyhow::Result<VoiceBackend> {
    let tag = tag.ok_or_else(|| anyhow!("missing voice type\n\n{}", USAGE))?;
    let voice_type: VoiceType = tag.parse()?;

    // Construct bare, then switch voice with a progress reporter attached
    let mut voice = create_voice(voice_type, &VoiceParams::new(), voxdub::APP_NAME)?;
    if let Some(speed) = params.speed {
        voice.set_speed(speed)?;
    }

    let mut report = |status: ProgressStatus, message: &str| {
        eprintln!("[{:>3}] {}", status.code(), message);
    };
    voice.set_voice_params(params, Some(&mut report))?;
    Ok(voice)
}

/// Parse `--flag value` pairs
fn parse_options(args: &[String]) -> anyhow::Result<(VoiceParams, Option<PathBuf>)> {
    let mut params = VoiceParams::new();
    let mut out = None;

    let mut iter = args.iter();
    while let Some(flag) = iter.next() {
        let value = iter
            .next()
            .ok_or_else(|| anyhow!("{} needs a value", flag))?;
        match flag.as_str() {
            "--out" => out = Some(PathBuf::from(value)),
            "--voice" => params = params.voice(value.as_str()),
            "--speaker" => params = params.speaker(value.as_str()),
            "--speed" => params = params.speed(value.parse().context("--speed must be a number")?),
            "--pitch" => params = params.pitch(value.parse().context("--pitch must be a number")?),
            other => bail!("unknown option '{}'", other),
        }
    }

    Ok((params, out))
}
