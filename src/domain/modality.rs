//! Modality detection: which signals a request carries and whether it asks
//! for the specialized (hyperspectral) imaging path.

use serde::{Deserialize, Serialize};

use super::{ImageRef, InputBundle};

/// Phrases in the patient's speech that ask for the tissue classifier.
pub const TRIGGER_KEYWORDS: &[&str] = &["hsi", "hyperspectral imaging", "tissue"];

/// Image extensions that only the tissue classifier can read.
pub const SPECIALIZED_EXTENSIONS: &[&str] = &["mat", "npy", "hdr"];

/// Which inputs are present in a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Modality {
    None,
    AudioOnly,
    ImageOnly,
    AudioAndImage,
}

impl Modality {
    #[must_use]
    pub fn has_audio(self) -> bool {
        matches!(self, Self::AudioOnly | Self::AudioAndImage)
    }

    #[must_use]
    pub fn has_image(self) -> bool {
        matches!(self, Self::ImageOnly | Self::AudioAndImage)
    }
}

impl std::fmt::Display for Modality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => write!(f, "NONE"),
            Self::AudioOnly => write!(f, "AUDIO_ONLY"),
            Self::ImageOnly => write!(f, "IMAGE_ONLY"),
            Self::AudioAndImage => write!(f, "AUDIO_AND_IMAGE"),
        }
    }
}

/// Result of running the detector over one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModalitySignal {
    pub modality: Modality,
    pub is_specialized_imaging: bool,
}

/// Classify a transcript and an optional image into a [`ModalitySignal`].
///
/// The keyword match and the extension heuristic are OR-combined, so a
/// keyword alone flags specialized imaging even when no image was sent.
#[must_use]
pub fn detect(transcript: Option<&str>, image: Option<&ImageRef>) -> ModalitySignal {
    let transcript = transcript.map(str::trim).filter(|t| !t.is_empty());

    let modality = match (transcript.is_some(), image.is_some()) {
        (false, false) => Modality::None,
        (true, false) => Modality::AudioOnly,
        (false, true) => Modality::ImageOnly,
        (true, true) => Modality::AudioAndImage,
    };

    let by_keyword = transcript.is_some_and(contains_trigger_keyword);
    let by_format = image.is_some_and(is_specialized_format);

    ModalitySignal {
        modality,
        is_specialized_imaging: by_keyword || by_format,
    }
}

/// Convenience wrapper over [`detect`] for a whole bundle.
#[must_use]
pub fn detect_bundle(bundle: &InputBundle) -> ModalitySignal {
    detect(bundle.transcript(), bundle.image())
}

/// Case-insensitive scan for any trigger keyword.
#[must_use]
pub fn contains_trigger_keyword(transcript: &str) -> bool {
    let lowered = transcript.to_lowercase();
    TRIGGER_KEYWORDS.iter().any(|k| lowered.contains(k))
}

#[must_use]
pub fn is_specialized_format(image: &ImageRef) -> bool {
    image
        .extension()
        .is_some_and(|ext| SPECIALIZED_EXTENSIONS.contains(&ext.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modality_from_presence() {
        let img = ImageRef::new("photo.png");
        assert_eq!(detect(None, None).modality, Modality::None);
        assert_eq!(detect(Some("cough"), None).modality, Modality::AudioOnly);
        assert_eq!(detect(None, Some(&img)).modality, Modality::ImageOnly);
        assert_eq!(
            detect(Some("cough"), Some(&img)).modality,
            Modality::AudioAndImage
        );
    }

    #[test]
    fn test_blank_transcript_counts_as_absent() {
        let signal = detect(Some("  "), None);
        assert_eq!(signal.modality, Modality::None);
        assert!(!signal.is_specialized_imaging);
    }

    #[test]
    fn test_keyword_match_is_case_insensitive() {
        assert!(detect(Some("Please run HSI on this"), None).is_specialized_imaging);
        assert!(detect(Some("HyperSpectral Imaging scan"), None).is_specialized_imaging);
        assert!(detect(Some("I have a Tissue concern"), None).is_specialized_imaging);
        assert!(!detect(Some("my knee hurts"), None).is_specialized_imaging);
    }

    #[test]
    fn test_keyword_triggers_without_image() {
        let signal = detect(Some("tissue sample"), None);
        assert_eq!(signal.modality, Modality::AudioOnly);
        assert!(signal.is_specialized_imaging);
    }

    #[test]
    fn test_extension_heuristic() {
        for name in ["scan.hdr", "cube.MAT", "bands.npy"] {
            let img = ImageRef::new(name);
            assert!(detect(None, Some(&img)).is_specialized_imaging, "{name}");
        }
        let png = ImageRef::new("scan.png");
        assert!(!detect(None, Some(&png)).is_specialized_imaging);
        // Extension must match exactly, not as a suffix of another word.
        assert!(!is_specialized_format(&ImageRef::new("scan.format")));
    }

    #[test]
    fn test_keyword_with_ordinary_image() {
        let img = ImageRef::new("lump.png");
        let signal = detect(Some("I have a tissue concern"), Some(&img));
        assert_eq!(signal.modality, Modality::AudioAndImage);
        assert!(signal.is_specialized_imaging);
    }

    #[test]
    fn test_modality_accessors() {
        assert!(Modality::AudioAndImage.has_audio());
        assert!(Modality::AudioAndImage.has_image());
        assert!(!Modality::ImageOnly.has_audio());
        assert!(!Modality::AudioOnly.has_image());
        assert_eq!(Modality::ImageOnly.to_string(), "IMAGE_ONLY");
    }
}
