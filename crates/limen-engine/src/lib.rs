//! Runtime engine for CSS class transition orchestration.
//!
//! The engine drives enter/leave/appear class lifecycles on host elements
//! without owning an event loop or a tree of its own:
//!
//! ```text
//!   host frame loop ──► FrameScheduler::run_frame(now)
//!                             │
//!                             ▼
//!   GroupCoordinator ──► TransitionMachine (one per element)
//!        │                    │
//!        │ move pass          │ class mutations, hooks
//!        ▼                    ▼
//!   PositionLedger       HostElement (embedder-implemented)
//! ```
//!
//! Hosts implement [`HostElement`] over their element handles, call the
//! machines (or the group coordinator) when visibility changes, pump the
//! scheduler once per rendered frame, and forward native `transitionend` /
//! `animationend` events back in.
//!
//! # Usage
//!
//! ```ignore
//! let scheduler = FrameScheduler::new();
//! let machine = TransitionMachine::new(
//!     TransitionDescriptor::new("fade"),
//!     TransitionHooks::new(),
//!     scheduler.clone(),
//! );
//! machine.mount(element.clone())?;
//! machine.request_visible(true);
//! // per rendered frame:
//! scheduler.run_frame(now_ms);
//! // on a native end event:
//! machine.notify_transition_end(element.id(), "opacity");
//! ```

pub mod end_watch;
pub mod flight;
pub mod flip;
pub mod group;
pub mod hooks;
pub mod host;
pub mod scheduler;
pub mod transition;

pub use end_watch::EndWatcher;
pub use flight::{FlightGuard, FlightState};
pub use flip::{MoveTracker, PositionLedger, measure};
pub use group::{ChildSpec, GroupCoordinator, RenderPlan, RenderSlot, SlotKind};
pub use hooks::{HookFn, TransitionHooks};
pub use host::{ElementHandle, HostElement, add_classes, remove_classes};
pub use scheduler::{FrameScheduler, TimerId};
pub use transition::{TransitionMachine, TransitionStage};
