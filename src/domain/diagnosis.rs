//! Diagnosis result types.
//!
//! Represents the output of one routed request, whichever path produced it.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::RequestPhase;

/// Tissue category reported by the specialized classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    /// Healthy tissue
    Normal,
    /// Abnormal but non-cancerous
    Benign,
    /// Cancerous
    Malignant,
}

impl Category {
    /// Lower-case label as emitted by the trained model.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Benign => "benign",
            Self::Malignant => "malignant",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Normal => write!(f, "NORMAL"),
            Self::Benign => write!(f, "BENIGN"),
            Self::Malignant => write!(f, "MALIGNANT"),
        }
    }
}

/// Specialized-path result: the category plus the text read to the patient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationResult {
    category: Category,
    explanation: String,
}

impl ClassificationResult {
    #[must_use]
    pub fn new(category: Category, explanation: impl Into<String>) -> Self {
        Self {
            category,
            explanation: explanation.into(),
        }
    }

    #[must_use]
    pub fn category(&self) -> Category {
        self.category
    }

    #[must_use]
    pub fn explanation(&self) -> &str {
        &self.explanation
    }
}

/// Which branch of the routing policy produced the diagnosis text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoutePath {
    /// Tissue classifier on the uploaded image
    Specialized,
    /// Vision-language model with the patient's words and the image
    VisionWithSpeech,
    /// Vision-language model with the image only
    VisionOnly,
    /// Text-only reasoning over the transcript
    TextOnly,
    /// Specialized imaging requested but no image was supplied
    ImageRequired,
    /// Neither speech nor image was supplied
    NoInput,
    /// Transcription failed before routing could start
    Aborted,
}

impl std::fmt::Display for RoutePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Specialized => "specialized",
            Self::VisionWithSpeech => "vision+speech",
            Self::VisionOnly => "vision",
            Self::TextOnly => "text",
            Self::ImageRequired => "image-required",
            Self::NoInput => "no-input",
            Self::Aborted => "aborted",
        };
        write!(f, "{s}")
    }
}

/// Tagged reason a request degraded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureKind {
    /// Specialized imaging signalled without an image
    DetectionAmbiguity,
    Classifier,
    Reasoning,
    Transcription,
    Synthesis,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DetectionAmbiguity => write!(f, "DetectionAmbiguity"),
            Self::Classifier => write!(f, "ClassifierError"),
            Self::Reasoning => write!(f, "ReasoningError"),
            Self::Transcription => write!(f, "TranscriptionError"),
            Self::Synthesis => write!(f, "SynthesisError"),
        }
    }
}

/// Complete result of one request, handed back to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnosticOutcome {
    /// Correlation id used in logs
    pub request_id: String,

    /// What the patient said (or a display placeholder)
    pub transcript: String,

    /// Text that was (or would have been) spoken back
    pub diagnosis_text: String,

    /// Playable audio of `diagnosis_text`; `None` only if synthesis failed
    pub audio_path: Option<PathBuf>,

    /// Branch taken by the router
    pub route: RoutePath,

    /// Why the request degraded, if it did. Synthesis failures are reported
    /// only when nothing earlier failed.
    pub failure: Option<FailureKind>,

    /// Phases the request passed through, `Start` to `Done`
    pub phases: Vec<RequestPhase>,
}

impl DiagnosticOutcome {
    /// Whether the request completed on its happy path.
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        self.failure.is_some()
    }
}

/// Generate a random UUIDv4-formatted request id using a CSPRNG.
#[must_use]
pub fn request_id() -> String {
    use rand::Rng;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    let mut rng = ChaCha20Rng::from_entropy();
    let bytes: [u8; 16] = rng.gen();

    format!(
        "{:02x}{:02x}{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}{:02x}{:02x}{:02x}{:02x}",
        bytes[0], bytes[1], bytes[2], bytes[3],
        bytes[4], bytes[5],
        (bytes[6] & 0x0f) | 0x40, bytes[7],
        (bytes[8] & 0x3f) | 0x80, bytes[9],
        bytes[10], bytes[11], bytes[12], bytes[13], bytes[14], bytes[15]
    )
}
