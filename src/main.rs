//! Medivox: voice and image diagnostic assistant.
//!
//! Main entry point for the command-line front end.
//!
//! ```bash
//! medivox diagnose [--audio <file>] [--image <file>] [--json]
//! medivox replay
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use medivox::adapters::groq::GroqClient;
use medivox::adapters::onnx::TissueClassifier;
use medivox::adapters::sanitize::SanitizingMakeWriter;
use medivox::adapters::voice::VoiceBackend;
use medivox::application::{replay_audio, DiagnosticRouter, RouterSettings};
use medivox::config::AppConfig;
use medivox::{DiagnosticOutcome, ImageRef, MedivoxError};

const USAGE: &str = "usage:
  medivox diagnose [--audio <file>] [--image <file>] [--json]
  medivox replay";

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Diagnose {
        audio: Option<PathBuf>,
        image: Option<PathBuf>,
        json: bool,
    },
    Replay,
}

fn parse_args(args: &[String]) -> std::result::Result<Command, MedivoxError> {
    let mut it = args.iter();
    match it.next().map(String::as_str) {
        Some("diagnose") => {
            let (mut audio, mut image, mut json) = (None, None, false);
            while let Some(flag) = it.next() {
                match flag.as_str() {
                    "--audio" => audio = Some(PathBuf::from(value_for(flag, it.next())?)),
                    "--image" => image = Some(PathBuf::from(value_for(flag, it.next())?)),
                    "--json" => json = true,
                    other => {
                        return Err(MedivoxError::Validation(format!("unknown flag {other}")));
                    }
                }
            }
            Ok(Command::Diagnose { audio, image, json })
        }
        Some("replay") => Ok(Command::Replay),
        Some(other) => Err(MedivoxError::Validation(format!("unknown command {other}"))),
        None => Err(MedivoxError::Validation("missing command".to_string())),
    }
}

fn value_for<'a>(flag: &str, value: Option<&'a String>) -> std::result::Result<&'a str, MedivoxError> {
    value
        .map(String::as_str)
        .filter(|v| !v.starts_with("--"))
        .ok_or_else(|| MedivoxError::Validation(format!("{flag} needs a value")))
}

fn init_logging() -> Result<tracing_appender::non_blocking::WorkerGuard> {
    // stdout carries the diagnosis, so logs go to stderr unless told otherwise.
    let log_mode = std::env::var("MEDIVOX_LOG_MODE").unwrap_or_else(|_| "auto".to_string());

    let (writer, guard) = match log_mode.as_str() {
        "file" => {
            let log_file = std::env::var("MEDIVOX_LOG_FILE")
                .unwrap_or_else(|_| "medivox.log".to_string());
            if let Some(parent) = std::path::Path::new(&log_file).parent() {
                // Best-effort: a missing folder surfaces as an open error below.
                let _ = std::fs::create_dir_all(parent);
            }
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&log_file)?;
            tracing_appender::non_blocking(file)
        }
        "stdout" => tracing_appender::non_blocking(std::io::stdout()),
        _ => tracing_appender::non_blocking(std::io::stderr()),
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(SanitizingMakeWriter::new(writer)),
        )
        .init();

    Ok(guard)
}

fn print_outcome(outcome: &DiagnosticOutcome, json: bool) -> Result<()> {
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(outcome).map_err(MedivoxError::from)?
        );
        return Ok(());
    }

    println!("Transcribed text: {}", outcome.transcript);
    println!("Diagnosis: {}", outcome.diagnosis_text);
    match &outcome.audio_path {
        Some(path) => println!("Voice: {}", path.display()),
        None => println!("Voice: unavailable"),
    }
    if outcome.is_degraded() {
        eprintln!("Request degraded: see logs for details");
    }
    Ok(())
}

fn main() -> Result<()> {
    let _guard = init_logging()?;

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = match parse_args(&args) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{e}\n{USAGE}");
            std::process::exit(2);
        }
    };

    let config = AppConfig::from_env()?;
    tracing::debug!(?config, "Configuration loaded");

    match command {
        Command::Replay => match replay_audio(&config.audio_output_path) {
            Some(path) => println!("{}", path.display()),
            None => {
                eprintln!("No previous audio at {}", config.audio_output_path.display());
                std::process::exit(1);
            }
        },
        Command::Diagnose { audio, image, json } => {
            let groq = Arc::new(GroqClient::from_config(&config)?);
            let voice = Arc::new(VoiceBackend::from_config(&config)?);
            let router = DiagnosticRouter::new(
                Arc::new(TissueClassifier::load(&config.classifier_model_path)),
                Arc::clone(&groq),
                groq,
                Arc::clone(&voice),
                RouterSettings::from_config(&config),
            );

            tracing::info!(voice = voice.name(), "Starting Medivox request...");
            let outcome = router.diagnose(audio.as_deref(), image.map(ImageRef::new));
            print_outcome(&outcome, json)?;

            // The answer is already printed; let the player finish before exit.
            voice.wait_for_playback();
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_parse_diagnose_flags() {
        let cmd = parse_args(&args(&["diagnose", "--image", "scan.hdr", "--json"])).expect("parses");
        assert_eq!(
            cmd,
            Command::Diagnose {
                audio: None,
                image: Some(PathBuf::from("scan.hdr")),
                json: true
            }
        );
    }

    #[test]
    fn test_parse_rejects_missing_value() {
        assert!(parse_args(&args(&["diagnose", "--audio"])).is_err());
        assert!(parse_args(&args(&["diagnose", "--audio", "--json"])).is_err());
    }

    #[test]
    fn test_parse_replay_and_unknown() {
        assert_eq!(parse_args(&args(&["replay"])).expect("parses"), Command::Replay);
        assert!(parse_args(&args(&["launch"])).is_err());
        assert!(parse_args(&args(&[])).is_err());
    }
}
