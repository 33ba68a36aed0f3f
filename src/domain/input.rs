//! Request input types.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Opaque handle to an uploaded image.
///
/// The router never opens the file itself; only adapters read its bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageRef {
    path: PathBuf,
}

impl ImageRef {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Lower-cased extension without the leading dot.
    #[must_use]
    pub fn extension(&self) -> Option<String> {
        self.path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
    }

    /// MIME type used when the image is inlined into a data URL.
    #[must_use]
    pub fn mime_type(&self) -> &'static str {
        match self.extension().as_deref() {
            Some("png") => "image/png",
            Some("gif") => "image/gif",
            Some("webp") => "image/webp",
            Some("bmp") => "image/bmp",
            Some("tif" | "tiff") => "image/tiff",
            // Vision endpoints accept JPEG as the common denominator.
            _ => "image/jpeg",
        }
    }
}

impl std::fmt::Display for ImageRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

/// Raw inputs of one diagnostic request.
///
/// Either field may be absent. A blank transcript is stored as `None` so the
/// router never has to distinguish "" from "no speech". Deserialized bundles
/// go through the same normalization as [`InputBundle::new`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BundleFields")]
pub struct InputBundle {
    transcript: Option<String>,
    image: Option<ImageRef>,
}

#[derive(Deserialize)]
struct BundleFields {
    #[serde(default)]
    transcript: Option<String>,
    #[serde(default)]
    image: Option<ImageRef>,
}

impl From<BundleFields> for InputBundle {
    fn from(fields: BundleFields) -> Self {
        Self::new(fields.transcript, fields.image)
    }
}

impl InputBundle {
    #[must_use]
    pub fn new(transcript: Option<String>, image: Option<ImageRef>) -> Self {
        let transcript = transcript
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());
        Self { transcript, image }
    }

    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_transcript(mut self, transcript: impl Into<String>) -> Self {
        let t = transcript.into();
        self.transcript = Some(t.trim().to_string()).filter(|t| !t.is_empty());
        self
    }

    #[must_use]
    pub fn with_image(mut self, image: ImageRef) -> Self {
        self.image = Some(image);
        self
    }

    #[must_use]
    pub fn transcript(&self) -> Option<&str> {
        self.transcript.as_deref()
    }

    #[must_use]
    pub fn image(&self) -> Option<&ImageRef> {
        self.image.as_ref()
    }
}
