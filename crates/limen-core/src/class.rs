//! Class-name handling for the three-stage transition class sets.
//!
//! Every phase of a transition applies classes in three stages: a `-from`
//! class present only for the first frame, an `-active` class present for
//! the whole phase, and a `-to` class swapped in after one rendered frame.
//! Default names derive from a configurable prefix, e.g. `fade-enter-from`.

use serde::{Deserialize, Serialize};

/// One phase family of a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionPhase {
    Enter,
    Leave,
    /// First-mount variant of enter with its own class set and hooks.
    Appear,
}

impl TransitionPhase {
    /// Class-name segment for this phase.
    pub fn segment(&self) -> &'static str {
        match self {
            TransitionPhase::Enter => "enter",
            TransitionPhase::Leave => "leave",
            TransitionPhase::Appear => "appear",
        }
    }
}

/// Resolved `{from, active, to}` class names for one phase.
///
/// Each field may hold several space-separated tokens; hosts receive one
/// token per class mutation (see [`class_tokens`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageClasses {
    pub from: String,
    pub active: String,
    pub to: String,
}

impl StageClasses {
    /// Default class triple for a phase under a naming prefix:
    /// `{name}-{phase}-from`, `{name}-{phase}-active`, `{name}-{phase}-to`.
    pub fn defaults(name: &str, phase: TransitionPhase) -> Self {
        let segment = phase.segment();
        Self {
            from: format!("{name}-{segment}-from"),
            active: format!("{name}-{segment}-active"),
            to: format!("{name}-{segment}-to"),
        }
    }
}

/// Split a space-separated class value into its tokens.
///
/// Configured class values may carry several tokens in one string the way
/// markup class attributes do; element mutations are applied per token.
pub fn class_tokens(value: &str) -> impl Iterator<Item = &str> {
    value.split_whitespace()
}
