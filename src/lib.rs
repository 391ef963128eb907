//! Limen: CSS class transition orchestration for host-rendered trees.
//!
//! This facade re-exports the public surface of the two workspace crates:
//!
//! - [`limen_core`] — pure data model: descriptors, class resolution, keyed
//!   child reconciliation, CSS timing discovery.
//! - [`limen_engine`] — the runtime: per-element transition machines, the
//!   group coordinator with FLIP move animation, and the host-pumped frame
//!   scheduler.
//!
//! Hosts embed the engine by implementing [`HostElement`] over their element
//! handles, pumping [`FrameScheduler::run_frame`] once per rendered frame,
//! and forwarding native `transitionend`/`animationend` events into the
//! machines or the group coordinator.

pub use limen_core::{
    ChildMapping, ChildOptions, ClassOverrides, ElementId, EndKind, GroupDescriptor, Rect, Result,
    StageClasses, TimingStyles, TransitionDescriptor, TransitionInfo, TransitionPhase,
    UnmountPolicy, UsageError, child_mapping_from_pairs, class_tokens, merge_mappings,
    transition_info,
};

pub use limen_engine::{
    ChildSpec, ElementHandle, FlightGuard, FlightState, FrameScheduler, GroupCoordinator,
    HostElement, RenderPlan, RenderSlot, SlotKind, TimerId, TransitionHooks, TransitionMachine,
    TransitionStage,
};
