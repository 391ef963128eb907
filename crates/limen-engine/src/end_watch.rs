//! Runtime half of CSS end detection.
//!
//! After the `-to` class swap, the machine samples the element's computed
//! timing (see [`limen_core::transition_info`]) and builds a watcher that
//! counts native end events of the winning kind until every declared
//! property has reported in. The timeout fallback timer is owned by the
//! machine; an [`EndWatcher`] is pure bookkeeping.

use limen_core::{ElementId, EndKind, TransitionInfo};

/// Outstanding end-event count for one phase wait.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndWatcher {
    element: ElementId,
    kind: EndKind,
    remaining: usize,
}

impl EndWatcher {
    /// Build a watcher from computed timing info, or `None` when the info
    /// describes no timed effect and the phase should settle immediately.
    pub fn from_info(element: ElementId, info: &TransitionInfo) -> Option<Self> {
        let kind = info.kind?;
        Some(Self { element, kind, remaining: info.property_count.max(1) })
    }

    /// Record one native end event. Returns `true` once the wait is
    /// satisfied. Events for other elements or the losing kind are ignored.
    pub fn note_end(&mut self, target: ElementId, kind: EndKind) -> bool {
        if target != self.element || kind != self.kind {
            return false;
        }
        self.remaining = self.remaining.saturating_sub(1);
        self.remaining == 0
    }

    pub fn kind(&self) -> EndKind {
        self.kind
    }

    pub fn remaining(&self) -> usize {
        self.remaining
    }
}
