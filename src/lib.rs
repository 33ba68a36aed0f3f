//! # Medivox
//!
//! Voice and image diagnostic assistant.
//!
//! A request carries an optional voice recording and an optional medical
//! image. The router decides which analysis applies (a three-category tissue
//! classifier, a vision-language model, or text-only reasoning), produces one
//! diagnosis text, and speaks it back.
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture:
//! - `domain`: Request types, modality detection, per-request state machine
//! - `ports`: Trait definitions for the external services
//! - `adapters`: Concrete implementations (Groq, ElevenLabs, Google TTS, ONNX Runtime)
//! - `application`: The diagnostic router
//! - `config`: Read-only process configuration

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

pub use application::DiagnosticRouter;
pub use domain::{DiagnosticOutcome, ImageRef, InputBundle};

/// Result type for Medivox operations
pub type Result<T> = std::result::Result<T, MedivoxError>;

/// Main error type for Medivox setup and I/O.
///
/// Request-time adapter failures never surface here; the router folds them
/// into a degraded [`DiagnosticOutcome`].
#[derive(Debug, thiserror::Error)]
pub enum MedivoxError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid input: {0}")]
    Validation(String),
}
