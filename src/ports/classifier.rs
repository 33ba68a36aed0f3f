//! Classifier port: Trait for the three-category tissue classifier.
//!
//! This trait abstracts the model runtime (ONNX) from the router.

use crate::domain::{Category, ImageRef};

/// Errors that can occur while classifying an image.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ClassifierError {
    #[error("Image unreadable: {0}")]
    UnreadableImage(String),

    #[error("Classifier model not loaded: {0}")]
    ModelNotLoaded(String),

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("Unexpected model output: {0}")]
    InvalidOutput(String),
}

/// Category picked by the model together with its raw score vector.
#[derive(Debug, Clone, PartialEq)]
pub struct RawClassification {
    pub category: Category,

    /// One score per model output index
    pub scores: Vec<f32>,
}

/// Trait for the fixed-category image classifier.
pub trait ImageClassifier: Send + Sync {
    /// Classify the image into one of the three categories.
    ///
    /// # Errors
    /// Returns `ClassifierError::UnreadableImage` if the file cannot be
    /// decoded, or `ClassifierError::Inference` if the model fails.
    fn classify(&self, image: &ImageRef) -> Result<RawClassification, ClassifierError>;
}
