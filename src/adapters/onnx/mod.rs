//! ONNX adapter: Implementation of `ImageClassifier`.
//!
//! Runs the three-category tissue model exported from the training
//! pipeline. The model expects one `[1, 256, 256, 3]` float tensor (RGB,
//! scaled to `[0, 1]`) and returns one score per output index:
//!
//! | index | category  |
//! |-------|-----------|
//! | 0     | benign    |
//! | 1     | malignant |
//! | 2     | normal    |
//!
//! Inference requires the `onnx-classifier` feature. Without it, or when
//! the model file cannot be loaded, [`TissueClassifier`] stays constructible
//! and every `classify` call reports `ClassifierError::ModelNotLoaded`, which
//! the router turns into degraded output.

use std::path::Path;

use crate::domain::{Category, ImageRef};
use crate::ports::{ClassifierError, ImageClassifier, RawClassification};

/// Square input edge expected by the model.
pub const INPUT_SIZE: u32 = 256;

/// Output index → category, in model order.
pub const OUTPUT_LABELS: [Category; 3] = [Category::Benign, Category::Malignant, Category::Normal];

/// Decode, resize and scale an image into the model's NHWC layout.
///
/// # Errors
/// Returns `ClassifierError::UnreadableImage` if the file cannot be decoded.
pub fn preprocess(image: &ImageRef) -> Result<Vec<f32>, ClassifierError> {
    let decoded = image::open(image.path())
        .map_err(|e| ClassifierError::UnreadableImage(format!("{image}: {e}")))?;
    let rgb = decoded
        .resize_exact(INPUT_SIZE, INPUT_SIZE, image::imageops::FilterType::Nearest)
        .to_rgb8();
    Ok(rgb.into_raw().into_iter().map(|v| f32::from(v) / 255.0).collect())
}

/// Pick the highest-scoring category.
///
/// # Errors
/// Returns `ClassifierError::InvalidOutput` if the vector does not hold
/// exactly one finite score per category.
pub fn category_from_scores(scores: &[f32]) -> Result<RawClassification, ClassifierError> {
    if scores.len() != OUTPUT_LABELS.len() {
        return Err(ClassifierError::InvalidOutput(format!(
            "expected {} scores, got {}",
            OUTPUT_LABELS.len(),
            scores.len()
        )));
    }
    if scores.iter().any(|s| !s.is_finite()) {
        return Err(ClassifierError::InvalidOutput(format!("non-finite score in {scores:?}")));
    }

    let (best, _) = scores
        .iter()
        .enumerate()
        .fold((0usize, f32::MIN), |acc, (i, &s)| if s > acc.1 { (i, s) } else { acc });

    Ok(RawClassification {
        category: OUTPUT_LABELS[best],
        scores: scores.to_vec(),
    })
}

#[cfg(feature = "onnx-classifier")]
mod session {
    use super::{category_from_scores, preprocess, INPUT_SIZE};
    use crate::domain::ImageRef;
    use crate::ports::{ClassifierError, RawClassification};
    use ort::session::Session;
    use std::path::Path;
    use std::sync::Mutex;

    /// Loaded ONNX Runtime session.
    ///
    /// `Session::run` needs `&mut self`, so the session sits behind a Mutex
    /// to keep `classify(&self)`.
    pub struct OnnxSession {
        session: Mutex<Session>,
    }

    impl OnnxSession {
        pub fn load(model_path: &Path) -> Result<Self, ClassifierError> {
            if !model_path.exists() {
                return Err(ClassifierError::ModelNotLoaded(format!(
                    "{} not found",
                    model_path.display()
                )));
            }
            let session = Session::builder()
                .map_err(|e: ort::Error| ClassifierError::ModelNotLoaded(e.to_string()))?
                .with_intra_threads(2)
                .map_err(|e: ort::Error| ClassifierError::ModelNotLoaded(e.to_string()))?
                .commit_from_file(model_path)
                .map_err(|e: ort::Error| {
                    ClassifierError::ModelNotLoaded(format!("ONNX load failed: {e}"))
                })?;
            Ok(Self {
                session: Mutex::new(session),
            })
        }

        pub fn classify(&self, image: &ImageRef) -> Result<RawClassification, ClassifierError> {
            use ort::value::TensorRef;

            let input = preprocess(image)?;
            let edge = INPUT_SIZE as usize;
            let array = ndarray::Array4::from_shape_vec((1, edge, edge, 3), input)
                .map_err(|e| ClassifierError::Inference(e.to_string()))?;
            let tensor = TensorRef::from_array_view(&array)
                .map_err(|e| ClassifierError::Inference(e.to_string()))?;

            let mut session = self
                .session
                .lock()
                .map_err(|_| ClassifierError::Inference("Session lock poisoned".to_string()))?;
            let outputs = session
                .run(ort::inputs![tensor])
                .map_err(|e| ClassifierError::Inference(format!("ONNX inference failed: {e}")))?;
            let (_shape, scores) = outputs[0]
                .try_extract_tensor::<f32>()
                .map_err(|e| ClassifierError::InvalidOutput(e.to_string()))?;

            category_from_scores(scores)
        }
    }
}

/// The specialized tissue classifier, or the reason it is unavailable.
pub enum TissueClassifier {
    #[cfg(feature = "onnx-classifier")]
    Onnx(session::OnnxSession),
    Unavailable(String),
}

impl TissueClassifier {
    /// Load the model at `model_path`.
    ///
    /// Never fails: a missing model yields an `Unavailable` classifier so the
    /// rest of the assistant keeps working.
    #[must_use]
    pub fn load(model_path: &Path) -> Self {
        #[cfg(feature = "onnx-classifier")]
        {
            match session::OnnxSession::load(model_path) {
                Ok(s) => {
                    tracing::info!("Tissue classifier loaded from {}", model_path.display());
                    Self::Onnx(s)
                }
                Err(e) => {
                    tracing::warn!("Tissue classifier unavailable: {e}");
                    Self::Unavailable(e.to_string())
                }
            }
        }
        #[cfg(not(feature = "onnx-classifier"))]
        {
            tracing::warn!(
                model = %model_path.display(),
                "Tissue classifier unavailable: built without the onnx-classifier feature"
            );
            Self::Unavailable("built without the onnx-classifier feature".to_string())
        }
    }
}

impl ImageClassifier for TissueClassifier {
    fn classify(&self, image: &ImageRef) -> Result<RawClassification, ClassifierError> {
        match self {
            #[cfg(feature = "onnx-classifier")]
            Self::Onnx(session) => session.classify(image),
            Self::Unavailable(reason) => Err(ClassifierError::ModelNotLoaded(reason.clone())),
        }
    }
}
