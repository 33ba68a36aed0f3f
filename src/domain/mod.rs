//! Domain layer: Core request types and the modality detector.
//!
//! This module contains pure Rust types with no I/O. Everything here is
//! recomputed per request; nothing is retained between calls.

mod diagnosis;
mod input;
pub mod modality;
mod phase;

pub use diagnosis::{
    request_id, Category, ClassificationResult, DiagnosticOutcome, FailureKind, RoutePath,
};
pub use input::{ImageRef, InputBundle};
pub use modality::{Modality, ModalitySignal};
pub use phase::{RequestMachine, RequestPhase};
