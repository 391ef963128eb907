//! Host integration boundary.
//!
//! The engine never touches a real UI tree; everything it needs from the
//! embedder goes through [`HostElement`]. Hosts implement the trait over
//! their element handles and forward native end events into
//! [`TransitionMachine::notify_transition_end`](crate::TransitionMachine::notify_transition_end)
//! or [`GroupCoordinator::handle_transition_end`](crate::GroupCoordinator::handle_transition_end).
//!
//! All methods are synchronous and are only called from the thread that
//! pumps the scheduler. The engine never invokes a host method while
//! holding internal state borrows, so a host may call back into the engine
//! from any of these.

use std::rc::Rc;

use limen_core::{ElementId, Rect, TimingStyles, class_tokens};

/// Shared handle to one host element.
pub type ElementHandle = Rc<dyn HostElement>;

/// Surface the engine needs from one element of the host tree.
pub trait HostElement {
    /// Stable identity of this element; end events are routed by it.
    fn id(&self) -> ElementId;

    /// Add one class token.
    fn add_class(&self, class: &str);

    /// Remove one class token.
    fn remove_class(&self, class: &str);

    /// Current inline `display` value, `""` when unset.
    fn inline_display(&self) -> String;

    /// Set the inline `display` value; `""` clears it.
    fn set_inline_display(&self, value: &str);

    /// Current bounding box in CSS pixels.
    fn bounding_box(&self) -> Rect;

    /// Apply `transform: translate(dx, dy)` with a zero transition
    /// duration. The invert step of a move animation; must not itself
    /// trigger a transition.
    fn set_translation(&self, dx: f32, dy: f32);

    /// Clear the inline transform and transition duration set by
    /// [`set_translation`](HostElement::set_translation).
    fn clear_translation(&self);

    /// Force a synchronous layout flush, the way reading a layout-dependent
    /// property does.
    fn flush_layout(&self);

    /// Sample the computed transition/animation timing lists.
    fn timing_styles(&self) -> TimingStyles;

    /// Remove the element from the live tree. Called when a leave finishes
    /// under [`UnmountPolicy::Detach`](limen_core::UnmountPolicy::Detach).
    fn detach(&self);
}

/// Add every token of a space-separated class value.
pub fn add_classes(element: &ElementHandle, value: &str) {
    for token in class_tokens(value) {
        element.add_class(token);
    }
}

/// Remove every token of a space-separated class value.
pub fn remove_classes(element: &ElementHandle, value: &str) {
    for token in class_tokens(value) {
        element.remove_class(token);
    }
}
