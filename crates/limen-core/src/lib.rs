//! Data model for CSS class transition orchestration.
//!
//! Everything in this crate is plain data and pure functions; nothing here
//! touches a host tree or schedules work. The runtime lives in
//! `limen-engine` and builds on these types:
//!
//! - [`descriptor`] — per-element and per-group configuration, including
//!   the three-stage class-name resolution (`*-from` / `*-active` / `*-to`).
//! - [`children`] — keyed child mappings and the merge that lets leaving
//!   children hold their visual slot.
//! - [`timing`] — computed-style timing parsing and the transition-vs-
//!   animation end heuristic.
//! - [`element`] — element identity and geometry as reported by hosts.
//! - [`error`] — usage errors shared across the workspace.

pub mod children;
pub mod class;
pub mod descriptor;
pub mod element;
pub mod error;
pub mod timing;

pub use children::{ChildMapping, child_mapping_from_pairs, merge_mappings};
pub use class::{StageClasses, TransitionPhase, class_tokens};
pub use descriptor::{
    ChildOptions, ClassOverrides, GroupDescriptor, TransitionDescriptor, UnmountPolicy,
};
pub use element::{ElementId, Rect};
pub use error::{Result, UsageError};
pub use timing::{EndKind, TimingStyles, TransitionInfo, transition_info};
