//! Ports layer: Trait definitions for external services.
//!
//! Following Hexagonal Architecture, these traits define the boundaries
//! between the router and the inference providers it calls.

mod classifier;
mod reasoner;
mod speech;
mod voice;

pub use classifier::{ClassifierError, ImageClassifier, RawClassification};
pub use reasoner::{Reasoner, ReasoningError};
pub use speech::{Transcriber, TranscriptionError};
pub use voice::{SynthesisError, VoiceSynthesizer};
