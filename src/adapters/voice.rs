//! Speech backend chosen once at startup.
//!
//! ElevenLabs is used when its key is configured; otherwise the keyless
//! Google Translate voice answers so a missing credential never stops the
//! assistant from speaking.

use std::path::PathBuf;

use crate::config::{AppConfig, ELEVENLABS_API_KEY_ENV};
use crate::ports::{SynthesisError, VoiceSynthesizer};

use super::elevenlabs::ElevenLabsSynthesizer;
use super::gtts::GoogleTtsSynthesizer;

pub enum VoiceBackend {
    ElevenLabs(ElevenLabsSynthesizer),
    Google(GoogleTtsSynthesizer),
}

impl VoiceBackend {
    /// # Errors
    /// Fails if the HTTP client cannot be built.
    pub fn from_config(config: &AppConfig) -> crate::Result<Self> {
        if config.elevenlabs_api_key.is_some() {
            return Ok(Self::ElevenLabs(ElevenLabsSynthesizer::from_config(config)?));
        }
        tracing::warn!("{ELEVENLABS_API_KEY_ENV} not set: falling back to keyless Google TTS");
        Ok(Self::Google(GoogleTtsSynthesizer::from_config(config)?))
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::ElevenLabs(_) => "elevenlabs",
            Self::Google(_) => "google-tts",
        }
    }

    /// Block until started playback has finished. Call before exiting.
    pub fn wait_for_playback(&self) {
        match self {
            Self::ElevenLabs(s) => s.wait_for_playback(),
            Self::Google(s) => s.wait_for_playback(),
        }
    }
}

impl VoiceSynthesizer for VoiceBackend {
    fn synthesize(&self, text: &str) -> Result<PathBuf, SynthesisError> {
        match self {
            Self::ElevenLabs(s) => s.synthesize(text),
            Self::Google(s) => s.synthesize(text),
        }
    }
}
