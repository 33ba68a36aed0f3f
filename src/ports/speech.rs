//! Speech port: Trait for speech-to-text.

use std::path::Path;

/// Errors that can occur during transcription.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TranscriptionError {
    #[error("Audio file unreadable: {0}")]
    UnreadableAudio(String),

    #[error("Cannot reach transcription service: {0}")]
    Connection(String),

    #[error("Transcription service returned {status}: {body}")]
    Service { status: u16, body: String },

    #[error("Invalid transcription response: {0}")]
    InvalidResponse(String),

    #[error("Transcription service not configured: set {0}")]
    NotConfigured(&'static str),
}

/// Trait for transcribing a recorded audio file.
pub trait Transcriber: Send + Sync {
    /// # Errors
    /// Returns `TranscriptionError` if the file cannot be read or the
    /// service call fails.
    fn transcribe(&self, audio: &Path, model_id: &str) -> Result<String, TranscriptionError>;
}
