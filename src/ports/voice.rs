//! Voice port: Trait for text-to-speech.

use std::path::PathBuf;

/// Errors that can occur during speech synthesis.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SynthesisError {
    #[error("Cannot reach synthesis service: {0}")]
    Connection(String),

    #[error("Synthesis service returned {status}: {body}")]
    Service { status: u16, body: String },

    #[error("Cannot write audio file: {0}")]
    Io(String),

    #[error("Nothing to synthesize")]
    EmptyText,
}

/// Trait for turning diagnosis text into a playable audio file.
///
/// Any local playback an implementation performs must be fire-and-forget:
/// it can neither block nor fail `synthesize`.
pub trait VoiceSynthesizer: Send + Sync {
    /// Synthesize `text` and return the path of the written audio file.
    ///
    /// # Errors
    /// Returns `SynthesisError` if the service call or the file write fails.
    fn synthesize(&self, text: &str) -> Result<PathBuf, SynthesisError>;
}
