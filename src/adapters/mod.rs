//! Adapters layer: Concrete implementations of ports.
//!
//! These modules contain the actual integration with external services:
//! - `groq`: Whisper transcription and vision-language reasoning
//! - `elevenlabs`: Speech synthesis (API key required)
//! - `gtts`: Keyless speech synthesis through Google Translate
//! - `voice`: Picks one of the two synthesizers at startup
//! - `onnx`: Local tissue classifier
//! - `playback`: Background local audio playback
//! - `sanitize`: Credential and PII filtering for logs

pub mod elevenlabs;
pub mod groq;
pub mod gtts;
pub mod onnx;
pub mod playback;
pub mod sanitize;
pub mod voice;
