//! Application layer: Use cases and services.
//!
//! This module wires the domain's decision policy to the ports.

mod router;

pub use router::{
    compose_prompt, explanation_for, replay_audio, DiagnosticRouter, RouterSettings,
    FAILURE_MESSAGE, IMAGE_REQUIRED_MESSAGE, NO_AUDIO_TRANSCRIPT, NO_INPUT_MESSAGE, SYSTEM_PROMPT,
};
