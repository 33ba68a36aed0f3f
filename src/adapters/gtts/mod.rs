//! Google Translate TTS adapter: keyless implementation of `VoiceSynthesizer`.
//!
//! The `translate_tts` endpoint accepts at most [`MAX_CHUNK_CHARS`]
//! characters per request, so the text is split on word boundaries and the
//! returned MP3 segments are concatenated into one file. Used when no
//! ElevenLabs key is configured.

use std::path::PathBuf;
use std::time::Duration;

use crate::config::AppConfig;
use crate::ports::{SynthesisError, VoiceSynthesizer};

use super::elevenlabs::write_audio;
use super::playback::Playback;

/// Longest text accepted by one `translate_tts` request.
pub const MAX_CHUNK_CHARS: usize = 100;

const LANGUAGE: &str = "en";

/// Split `text` into request-sized pieces, breaking between words where
/// possible.
#[must_use]
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let mut word = word;
        // Words longer than a whole chunk are cut on char boundaries.
        while word.chars().count() > max_chars {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
            }
            let cut = word
                .char_indices()
                .nth(max_chars)
                .map_or(word.len(), |(i, _)| i);
            chunks.push(word[..cut].to_string());
            word = &word[cut..];
        }
        if word.is_empty() {
            continue;
        }

        let needed = if current.is_empty() {
            word.chars().count()
        } else {
            current.chars().count() + 1 + word.chars().count()
        };
        if needed > max_chars {
            chunks.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Keyless text-to-speech client.
pub struct GoogleTtsSynthesizer {
    base_url: String,
    client: reqwest::blocking::Client,
    output_path: PathBuf,
    playback: Playback,
}

impl GoogleTtsSynthesizer {
    /// # Errors
    /// Returns the underlying `reqwest` error if the client cannot be built.
    pub fn new(
        base_url: &str,
        timeout: Duration,
        output_path: PathBuf,
        playback: bool,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            output_path,
            playback: Playback::new(playback),
        })
    }

    /// # Errors
    /// Fails if the HTTP client cannot be built.
    pub fn from_config(config: &AppConfig) -> crate::Result<Self> {
        Ok(Self::new(
            &config.google_tts_base_url,
            config.http_timeout,
            config.audio_output_path.clone(),
            config.playback,
        )?)
    }

    /// Block until audio started by earlier calls has finished playing.
    pub fn wait_for_playback(&self) {
        self.playback.wait();
    }

    fn fetch_chunk(&self, index: usize, total: usize, chunk: &str) -> Result<Vec<u8>, SynthesisError> {
        let idx = index.to_string();
        let total_str = total.to_string();
        let textlen = chunk.chars().count().to_string();

        let response = self
            .client
            .get(format!("{}/translate_tts", self.base_url))
            .query(&[
                ("ie", "UTF-8"),
                ("q", chunk),
                ("tl", LANGUAGE),
                ("client", "tw-ob"),
                ("idx", idx.as_str()),
                ("total", total_str.as_str()),
                ("textlen", textlen.as_str()),
            ])
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
        let bytes = response
            .bytes()
            .map_err(|e| SynthesisError::Connection(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

impl VoiceSynthesizer for GoogleTtsSynthesizer {
    fn synthesize(&self, text: &str) -> Result<PathBuf, SynthesisError> {
        let chunks = chunk_text(text, MAX_CHUNK_CHARS);
        if chunks.is_empty() {
            return Err(SynthesisError::EmptyText);
        }

        tracing::debug!(chunks = chunks.len(), chars = text.len(), "Requesting keyless speech synthesis");

        let mut audio = Vec::new();
        for (i, chunk) in chunks.iter().enumerate() {
            audio.extend(self.fetch_chunk(i, chunks.len(), chunk)?);
        }

        write_audio(&self.output_path, &audio)?;
        tracing::info!(path = %self.output_path.display(), bytes = audio.len(), "Speech written");
        self.playback.start(self.output_path.clone());

        Ok(self.output_path.clone())
    }
}
