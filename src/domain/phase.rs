//! Per-request state machine.
//!
//! ```text
//! Start ─▶ [Transcribing] ─▶ Detecting ─▶ Classifying ─┐
//!                │                    ├─▶ Reasoning ───┤─▶ Synthesizing ─▶ Done
//!                │                    └─▶ Idle ────────┘        │
//!                └──────────▶ Error ◀── (Classifying | Reasoning | Synthesizing)
//!                               ├─▶ Synthesizing (on the error text)
//!                               └─▶ Done (when synthesis itself failed)
//! ```
//!
//! A machine is built fresh for every request and dropped with it.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestPhase {
    Start,
    Transcribing,
    Detecting,
    Classifying,
    Reasoning,
    Idle,
    Synthesizing,
    Error,
    Done,
}

impl RequestPhase {
    /// Whether `self → next` is a legal transition.
    #[must_use]
    pub fn can_transition(self, next: Self) -> bool {
        use RequestPhase::*;
        matches!(
            (self, next),
            (Start, Transcribing | Detecting)
                | (Transcribing, Detecting | Error)
                | (Detecting, Classifying | Reasoning | Idle)
                | (Classifying | Reasoning, Synthesizing | Error)
                | (Idle, Synthesizing)
                | (Synthesizing, Done | Error)
                | (Error, Synthesizing | Done)
        )
    }
}

impl std::fmt::Display for RequestPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Start => "START",
            Self::Transcribing => "TRANSCRIBING",
            Self::Detecting => "DETECTING",
            Self::Classifying => "CLASSIFYING",
            Self::Reasoning => "REASONING",
            Self::Idle => "IDLE",
            Self::Synthesizing => "SYNTHESIZING",
            Self::Error => "ERROR",
            Self::Done => "DONE",
        };
        write!(f, "{s}")
    }
}

/// Tracks the phases one request has passed through.
#[derive(Debug, Clone)]
pub struct RequestMachine {
    history: Vec<RequestPhase>,
}

impl Default for RequestMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestMachine {
    #[must_use]
    pub fn new() -> Self {
        Self {
            history: vec![RequestPhase::Start],
        }
    }

    #[must_use]
    pub fn current(&self) -> RequestPhase {
        self.history
            .last()
            .copied()
            .unwrap_or(RequestPhase::Start)
    }

    /// Move to `next`. Illegal transitions are logged and still recorded so
    /// the history shows exactly what happened.
    pub fn advance(&mut self, next: RequestPhase) {
        let from = self.current();
        if from.can_transition(next) {
            tracing::debug!(%from, to = %next, "Request phase");
        } else {
            tracing::error!(%from, to = %next, "Illegal request phase transition");
        }
        self.history.push(next);
    }

    #[must_use]
    pub fn into_history(self) -> Vec<RequestPhase> {
        self.history
    }

    #[must_use]
    pub fn history(&self) -> &[RequestPhase] {
        &self.history
    }
}
