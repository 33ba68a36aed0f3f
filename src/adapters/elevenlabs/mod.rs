//! ElevenLabs adapter: Implementation of `VoiceSynthesizer`.
//!
//! Posts the diagnosis text to `/v1/text-to-speech/{voice_id}` and writes
//! the returned MP3 to the configured output path, creating its folder if
//! needed. Playback, when enabled, is handed to [`Playback`] and never
//! affects the result.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Serialize;
use zeroize::Zeroizing;

use crate::config::AppConfig;
use crate::ports::{SynthesisError, VoiceSynthesizer};

use super::playback::Playback;

/// Settings for one synthesizer instance.
#[derive(Debug, Clone)]
pub struct VoiceSettings {
    pub voice_id: String,
    pub model_id: String,
    pub output_format: String,
    pub output_path: PathBuf,
    pub playback: bool,
}

impl VoiceSettings {
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            voice_id: config.voice_id.clone(),
            model_id: config.voice_model.clone(),
            output_format: config.output_format.clone(),
            output_path: config.audio_output_path.clone(),
            playback: config.playback,
        }
    }
}

/// ElevenLabs text-to-speech client.
pub struct ElevenLabsSynthesizer {
    base_url: String,
    api_key: Zeroizing<String>,
    client: reqwest::blocking::Client,
    settings: VoiceSettings,
    playback: Playback,
}

#[derive(Debug, Serialize)]
struct SpeechRequest<'a> {
    text: &'a str,
    model_id: &'a str,
}

impl ElevenLabsSynthesizer {
    /// # Errors
    /// Returns the underlying `reqwest` error if the client cannot be built.
    pub fn new(
        base_url: &str,
        api_key: Zeroizing<String>,
        timeout: Duration,
        settings: VoiceSettings,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            client,
            playback: Playback::new(settings.playback),
            settings,
        })
    }

    /// # Errors
    /// Fails if the ElevenLabs key is missing or the HTTP client cannot be built.
    pub fn from_config(config: &AppConfig) -> crate::Result<Self> {
        let key = config.require_elevenlabs_key()?;
        Ok(Self::new(
            &config.elevenlabs_base_url,
            key,
            config.http_timeout,
            VoiceSettings::from_config(config),
        )?)
    }

    /// Block until audio started by earlier calls has finished playing.
    pub fn wait_for_playback(&self) {
        self.playback.wait();
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1/text-to-speech/{}?output_format={}",
            self.base_url, self.settings.voice_id, self.settings.output_format
        )
    }
}

/// Write synthesized audio to `output`, replacing any previous answer.
///
/// # Errors
/// Returns `SynthesisError::Io` if the folder or the file cannot be written.
pub fn write_audio(output: &Path, audio: &[u8]) -> Result<(), SynthesisError> {
    ensure_parent_dir(output)?;
    std::fs::write(output, audio)
        .map_err(|e| SynthesisError::Io(format!("{}: {e}", output.display())))
}

/// Create the parent folder of `path` if it does not exist yet.
///
/// # Errors
/// Returns `SynthesisError::Io` if the folder cannot be created.
pub fn ensure_parent_dir(path: &Path) -> Result<(), SynthesisError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .map_err(|e| SynthesisError::Io(format!("{}: {e}", parent.display())))?;
    }
    Ok(())
}

impl VoiceSynthesizer for ElevenLabsSynthesizer {
    fn synthesize(&self, text: &str) -> Result<PathBuf, SynthesisError> {
        if text.trim().is_empty() {
            return Err(SynthesisError::EmptyText);
        }

        let output = &self.settings.output_path;

        let body = SpeechRequest {
            text,
            model_id: &self.settings.model_id,
        };

        tracing::debug!(voice = %self.settings.voice_id, chars = text.len(), "Requesting speech synthesis");

        let response = self
            .client
            .post(self.endpoint())
            .header("xi-api-key", self.api_key.as_str())
            .header(reqwest::header::ACCEPT, "audio/mpeg")
            .json(&body)
            .send()
            .map_err(|e| SynthesisError::Connection(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(SynthesisError::Service {
                status: status.as_u16(),
                body,
            });
        }

        let audio = response
            .bytes()
            .map_err(|e| SynthesisError::Connection(e.to_string()))?;
        write_audio(output, &audio)?;

        tracing::info!(path = %output.display(), bytes = audio.len(), "Speech written");
        self.playback.start(output.clone());

        Ok(output.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(output: PathBuf) -> VoiceSettings {
        VoiceSettings {
            voice_id: "voice123".to_string(),
            model_id: "eleven_turbo_v2".to_string(),
            output_format: "mp3_22050_32".to_string(),
            output_path: output,
            playback: false,
        }
    }

    #[test]
    fn test_endpoint_includes_voice_and_format() {
        let synth = ElevenLabsSynthesizer::new(
            "https://api.elevenlabs.io/",
            Zeroizing::new("sk_test".to_string()),
            Duration::from_secs(5),
            settings(PathBuf::from("out.mp3")),
        )
        .expect("client builds");
        assert_eq!(
            synth.endpoint(),
            "https://api.elevenlabs.io/v1/text-to-speech/voice123?output_format=mp3_22050_32"
        );
    }

    #[test]
    fn test_empty_text_rejected_before_network() {
        let synth = ElevenLabsSynthesizer::new(
            "http://127.0.0.1:9",
            Zeroizing::new("sk_test".to_string()),
            Duration::from_secs(5),
            settings(PathBuf::from("out.mp3")),
        )
        .expect("client builds");
        assert!(matches!(synth.synthesize("  "), Err(SynthesisError::EmptyText)));
    }

    #[test]
    fn test_ensure_parent_dir_creates_folder() {
        let dir = tempfile::tempdir().expect("temp dir");
        let target = dir.path().join("static").join("nested").join("final.mp3");
        ensure_parent_dir(&target).expect("creates");
        assert!(target.parent().map(Path::is_dir).unwrap_or(false));
        // Bare file names have no folder to create.
        ensure_parent_dir(Path::new("final.mp3")).expect("no-op");
    }

    #[test]
    fn test_speech_request_shape() {
        let json = serde_json::to_value(SpeechRequest {
            text: "hello",
            model_id: "eleven_turbo_v2",
        })
        .expect("serializes");
        assert_eq!(json["text"], "hello");
        assert_eq!(json["model_id"], "eleven_turbo_v2");
    }

    fn synthesizer(base_url: &str, output: PathBuf) -> ElevenLabsSynthesizer {
        ElevenLabsSynthesizer::new(
            base_url,
            Zeroizing::new("sk_test".to_string()),
            Duration::from_secs(5),
            settings(output),
        )
        .expect("client builds")
    }

    fn speech_path() -> mockito::Matcher {
        mockito::Matcher::Regex(r"^/v1/text-to-speech/voice123".to_string())
    }

    #[test]
    fn test_successful_synthesis_writes_audio_file() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", speech_path())
            .match_query(mockito::Matcher::UrlEncoded(
                "output_format".to_string(),
                "mp3_22050_32".to_string(),
            ))
            .match_header("xi-api-key", "sk_test")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "text": "Normal tissue.",
                "model_id": "eleven_turbo_v2"
            })))
            .with_status(200)
            .with_header("content-type", "audio/mpeg")
            .with_body(b"ID3-fake-mp3".as_slice())
            .create();

        let dir = tempfile::tempdir().expect("temp dir");
        let output = dir.path().join("static").join("final.mp3");
        let synth = synthesizer(&server.url(), output.clone());

        let written = synth.synthesize("Normal tissue.").expect("synthesizes");
        assert_eq!(written, output);
        assert_eq!(std::fs::read(&output).expect("audio on disk"), b"ID3-fake-mp3");
        mock.assert();
    }

    #[test]
    fn test_service_error_maps_status_and_body() {
        let mut server = mockito::Server::new();
        let _mock = server
            .mock("POST", speech_path())
            .with_status(500)
            .with_body("quota exceeded")
            .create();

        let dir = tempfile::tempdir().expect("temp dir");
        let output = dir.path().join("final.mp3");
        let synth = synthesizer(&server.url(), output.clone());

        match synth.synthesize("hello") {
            Err(SynthesisError::Service { status, body }) => {
                assert_eq!(status, 500);
                assert_eq!(body, "quota exceeded");
            }
            other => panic!("expected service error, got {other:?}"),
        }
        assert!(!output.exists());
    }
}
