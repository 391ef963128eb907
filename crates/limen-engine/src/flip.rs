//! Move-animation primitives: position bookkeeping and in-flight moves.
//!
//! A group animates reorders with the usual first/last/invert/play steps:
//! measure every tracked element before the tree changes, measure again
//! after, translate each moved element back to its old position with
//! transitions disabled, force one layout flush, then drop the translation
//! under a move class so the element transitions to its natural spot. The
//! orchestration lives in [`crate::group`]; this module keeps the pure
//! bookkeeping so it stays testable without a host.

use std::collections::HashMap;

use indexmap::IndexMap;
use limen_core::{ElementId, Rect};

use crate::host::ElementHandle;

/// Measure a set of elements into `(id, bounding box)` records.
pub fn measure(elements: &[ElementHandle]) -> Vec<(ElementId, Rect)> {
    elements.iter().map(|element| (element.id(), element.bounding_box())).collect()
}

/// Before/after bounding boxes for one move pass.
///
/// Each side is replaced wholesale per pass, never accumulated, so stale
/// entries cannot leak across passes.
#[derive(Debug, Default)]
pub struct PositionLedger {
    before: HashMap<ElementId, Rect>,
    after: HashMap<ElementId, Rect>,
}

impl PositionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the "before" measurements.
    pub fn load_before(&mut self, records: impl IntoIterator<Item = (ElementId, Rect)>) {
        self.before.clear();
        self.before.extend(records);
    }

    /// Replace the "after" measurements.
    pub fn load_after(&mut self, records: impl IntoIterator<Item = (ElementId, Rect)>) {
        self.after.clear();
        self.after.extend(records);
    }

    /// Translation that puts the element back at its old position, or
    /// `None` when it did not move or lacks a measurement on either side.
    pub fn inversion(&self, id: ElementId) -> Option<(f32, f32)> {
        let old = self.before.get(&id)?;
        let new = self.after.get(&id)?;
        let dx = old.left - new.left;
        let dy = old.top - new.top;
        (dx != 0.0 || dy != 0.0).then_some((dx, dy))
    }

    pub fn has_before(&self, id: ElementId) -> bool {
        self.before.contains_key(&id)
    }
}

struct MoveFlight {
    element: ElementHandle,
    move_class: String,
}

/// In-progress move animations, keyed by element.
///
/// Pure bookkeeping: callers apply the returned class removals themselves,
/// outside any state borrow.
#[derive(Default)]
pub struct MoveTracker {
    flights: IndexMap<ElementId, MoveFlight>,
}

impl MoveTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a move started under `move_class`.
    pub fn begin(&mut self, element: ElementHandle, move_class: String) {
        self.flights.insert(element.id(), MoveFlight { element, move_class });
    }

    /// Take every outstanding move for force-finishing. A new pass settles
    /// stale moves before measuring, so their transforms cannot pollute
    /// the new measurements.
    pub fn drain(&mut self) -> Vec<(ElementHandle, String)> {
        self.flights.drain(..).map(|(_, flight)| (flight.element, flight.move_class)).collect()
    }

    /// Settle the move finished by a native end event, if any.
    ///
    /// Only a `transform` transition ends a move; other properties on the
    /// same element are ignored, as are events bubbled from descendants.
    pub fn settle(
        &mut self,
        target: ElementId,
        property_name: &str,
    ) -> Option<(ElementHandle, String)> {
        if !property_name.ends_with("transform") {
            return None;
        }
        self.flights.shift_remove(&target).map(|flight| (flight.element, flight.move_class))
    }

    pub fn is_moving(&self, id: ElementId) -> bool {
        self.flights.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.flights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flights.is_empty()
    }
}
