//! Reasoning port: Trait for the general vision-and-text model.

use crate::domain::ImageRef;

/// Errors that can occur while asking the reasoning service.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ReasoningError {
    #[error("Cannot reach reasoning service: {0}")]
    Connection(String),

    #[error("Reasoning request timed out after {0}s")]
    Timeout(u64),

    #[error("Reasoning service returned {status}: {body}")]
    Service { status: u16, body: String },

    #[error("Invalid reasoning response: {0}")]
    InvalidResponse(String),

    #[error("Image unreadable: {0}")]
    UnreadableImage(String),

    #[error("Reasoning service not configured: set {0}")]
    NotConfigured(&'static str),
}

/// Trait for the vision-language reasoning service.
///
/// Implementations receive the image as an optional argument; text-only
/// requests pass `None` rather than an empty handle.
pub trait Reasoner: Send + Sync {
    /// Produce a free-text diagnosis for the prompt and optional image.
    ///
    /// # Errors
    /// Returns `ReasoningError` on network, timeout or malformed-response
    /// failures.
    fn reason(
        &self,
        prompt: &str,
        image: Option<&ImageRef>,
        model_id: &str,
    ) -> Result<String, ReasoningError>;
}
