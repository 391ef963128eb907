//! Per-element transition state machine.
//!
//! One machine drives one element through the class lifecycle:
//!
//! ```text
//!                 request_visible(true)
//!          ┌────────────────────────────────┐
//!          │                                ▼
//!       absent ◄── leave settles ──── leaving ◄───┐
//!          │                             ▲        │ pre-empt
//!          │ mount                       │        │
//!          ▼                             │        │
//!      entering ── end/timeout ──► entered ── request_visible(false)
//! ```
//!
//! A phase applies `{from, active}` classes, waits one rendered frame,
//! swaps `from` for `to`, then waits on end detection before removing the
//! classes and firing the "after" hook. The machine talks to the host only
//! between borrows of its own state, so hooks and host callbacks are free
//! to call back into it; stale frame callbacks and timers recognize
//! themselves by flight serial and drop out.

use std::cell::RefCell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use limen_core::{
    ElementId, EndKind, Result, StageClasses, TransitionDescriptor, TransitionPhase, UnmountPolicy,
    UsageError, transition_info,
};

use crate::end_watch::EndWatcher;
use crate::flight::FlightGuard;
use crate::group::GroupLink;
use crate::hooks::{HookFn, TransitionHooks};
use crate::host::{ElementHandle, add_classes, remove_classes};
use crate::scheduler::{FrameScheduler, TimerId};

/// Current position of an element in its transition lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionStage {
    /// Not visible: never shown, hidden, or detached.
    Absent,
    /// Enter classes are mid-application.
    Entering {
        /// First-mount variant using the appear class set and hooks.
        appearing: bool,
    },
    /// Enter finished; the element is at rest and visible.
    Entered,
    /// Leave classes are mid-application.
    Leaving,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FlightDirection {
    Enter { appearing: bool },
    Leave,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum SettleOutcome {
    Completed,
    Cancelled,
}

/// One phase in flight. Classes are frozen at phase start; hooks resolve
/// at dispatch time so a replaced hooks struct is observed mid-flight.
struct ActiveFlight {
    serial: u64,
    direction: FlightDirection,
    guard: FlightGuard,
    classes: StageClasses,
    /// Whether the `-from` → `-to` swap has happened yet.
    swapped: bool,
    watcher: Option<EndWatcher>,
    timer: Option<TimerId>,
}

struct MachineInner {
    descriptor: TransitionDescriptor,
    hooks: TransitionHooks,
    scheduler: FrameScheduler,
    element: Option<ElementHandle>,
    stage: TransitionStage,
    /// Last visibility the embedder asked for.
    requested: bool,
    /// Set once the first mount has been evaluated; appear never applies
    /// again afterwards.
    shown_once: bool,
    /// Inline display captured before hiding, restored on re-enter.
    saved_display: Option<String>,
    flight: Option<ActiveFlight>,
    next_serial: u64,
    group: Option<GroupLink>,
}

impl MachineInner {
    /// True while the current flight can still settle. A cancelled flight
    /// leaves its stage behind for the pre-emptor to overwrite, so the
    /// stage alone does not prove a phase is running.
    fn phase_underway(&self) -> bool {
        matches!(&self.flight, Some(flight) if flight.guard.is_pending())
    }
}

/// Per-element controller for the enter/leave/appear class lifecycle.
///
/// Cloning yields another handle to the same machine.
#[derive(Clone)]
pub struct TransitionMachine {
    inner: Rc<RefCell<MachineInner>>,
}

impl TransitionMachine {
    pub fn new(
        descriptor: TransitionDescriptor,
        hooks: TransitionHooks,
        scheduler: FrameScheduler,
    ) -> Self {
        Self::build(descriptor, hooks, scheduler, None)
    }

    pub(crate) fn with_group(
        descriptor: TransitionDescriptor,
        hooks: TransitionHooks,
        scheduler: FrameScheduler,
        link: GroupLink,
    ) -> Self {
        Self::build(descriptor, hooks, scheduler, Some(link))
    }

    fn build(
        descriptor: TransitionDescriptor,
        hooks: TransitionHooks,
        scheduler: FrameScheduler,
        group: Option<GroupLink>,
    ) -> Self {
        Self {
            inner: Rc::new(RefCell::new(MachineInner {
                descriptor,
                hooks,
                scheduler,
                element: None,
                stage: TransitionStage::Absent,
                requested: false,
                shown_once: false,
                saved_display: None,
                flight: None,
                next_serial: 1,
                group,
            })),
        }
    }

    /// Bind a host element to this machine.
    ///
    /// Re-mounting the same element is a no-op; mounting a different one
    /// while bound is a usage error. If visibility was requested before
    /// the mount, the pending enter starts now — on the element's first
    /// mount that is where the appear rules are evaluated.
    pub fn mount(&self, element: ElementHandle) -> Result<()> {
        let (enter, hide, link) = {
            let mut m = self.inner.borrow_mut();
            if let Some(current) = &m.element {
                if current.id() == element.id() {
                    return Ok(());
                }
                return Err(UsageError::AlreadyBound { current: current.id() });
            }
            m.element = Some(element.clone());
            debug!(element = %element.id(), "element mounted");
            if m.requested {
                (true, false, m.group.clone())
            } else {
                // first mount passes unshown; appear will not apply later
                m.shown_once = true;
                let hide = matches!(m.descriptor.unmount, UnmountPolicy::Hide);
                (false, hide, m.group.clone())
            }
        };
        if let Some(link) = &link {
            link.register(element.clone());
        }
        if enter {
            try_enter(&self.inner);
        } else if hide {
            let current = element.inline_display();
            self.inner.borrow_mut().saved_display = Some(current);
            element.set_inline_display("none");
        }
        Ok(())
    }

    /// Unbind the current element, cancelling any flight.
    ///
    /// For hosts that tear the element down themselves; a leave under the
    /// detach policy unbinds on its own.
    pub fn unmount(&self) {
        let pending = {
            let m = self.inner.borrow();
            matches!(&m.flight, Some(flight) if flight.guard.is_pending())
        };
        if pending {
            settle_flight(&self.inner, SettleOutcome::Cancelled);
        }
        let unregister = {
            let mut m = self.inner.borrow_mut();
            let Some(element) = m.element.take() else { return };
            m.stage = TransitionStage::Absent;
            debug!(element = %element.id(), "element unmounted");
            m.group.clone().map(|link| (link, element.id()))
        };
        if let Some((link, id)) = unregister {
            link.unregister(id);
        }
    }

    /// Ask for the element to be visible or not.
    ///
    /// Idempotent per value; flipping the value mid-flight pre-empts the
    /// opposite phase (its "cancelled" hook fires instead of "after").
    pub fn request_visible(&self, visible: bool) {
        {
            let mut m = self.inner.borrow_mut();
            if m.requested == visible {
                return;
            }
            m.requested = visible;
        }
        if visible {
            try_enter(&self.inner);
        } else {
            try_leave(&self.inner);
        }
    }

    /// Replace the configuration snapshot.
    ///
    /// The next phase decision observes the new value; classes already
    /// applied by an in-flight phase keep their original names.
    pub fn set_descriptor(&self, descriptor: TransitionDescriptor) {
        self.inner.borrow_mut().descriptor = descriptor;
    }

    pub fn descriptor(&self) -> TransitionDescriptor {
        self.inner.borrow().descriptor.clone()
    }

    /// Replace the hook set. In-flight phases resolve hooks at dispatch
    /// time, so the replacement is observed immediately.
    pub fn set_hooks(&self, hooks: TransitionHooks) {
        self.inner.borrow_mut().hooks = hooks;
    }

    /// Native `transitionend` for `property_name` on `target`.
    pub fn notify_transition_end(&self, target: ElementId, property_name: &str) {
        trace!(%target, property = property_name, "transition end");
        note_end(&self.inner, target, EndKind::Transition);
    }

    /// Native `animationend` for `animation_name` on `target`.
    pub fn notify_animation_end(&self, target: ElementId, animation_name: &str) {
        trace!(%target, animation = animation_name, "animation end");
        note_end(&self.inner, target, EndKind::Animation);
    }

    pub fn stage(&self) -> TransitionStage {
        self.inner.borrow().stage
    }

    pub fn is_mounted(&self) -> bool {
        self.inner.borrow().element.is_some()
    }

    pub fn element_id(&self) -> Option<ElementId> {
        self.inner.borrow().element.as_ref().map(|element| element.id())
    }
}

/// Everything a phase launch needs outside the state borrow.
struct LaunchPlan {
    element: ElementHandle,
    classes: StageClasses,
    before: Option<HookFn>,
    during: Option<HookFn>,
    restore_display: Option<String>,
    serial: u64,
    scheduler: FrameScheduler,
}

fn try_enter(inner: &Rc<RefCell<MachineInner>>) {
    let leave_in_flight = {
        let m = inner.borrow();
        matches!(
            &m.flight,
            Some(flight)
                if matches!(flight.direction, FlightDirection::Leave) && flight.guard.is_pending()
        )
    };
    if leave_in_flight {
        settle_flight(inner, SettleOutcome::Cancelled);
    }

    let plan = {
        let mut m = inner.borrow_mut();
        if !m.requested {
            return; // a hook reversed the request mid-dispatch
        }
        let Some(element) = m.element.clone() else {
            return; // takes effect at mount
        };
        // a stale Entering left by a cancelled flight does not gate a relaunch
        if m.stage == TransitionStage::Entered
            || (matches!(m.stage, TransitionStage::Entering { .. }) && m.phase_underway())
        {
            return;
        }
        let first = !m.shown_once;
        m.shown_once = true;
        if first && !m.descriptor.appear {
            m.stage = TransitionStage::Entered;
            debug!(element = %element.id(), "first mount without appear, shown directly");
            return;
        }
        let appearing =
            first && m.group.as_ref().map_or(true, |link| link.appear_window());
        let phase = if appearing { TransitionPhase::Appear } else { TransitionPhase::Enter };
        let classes = m.descriptor.stage_classes(phase);
        let hooks = m.hooks.phase_hooks(phase, m.descriptor.custom_appear);
        let serial = m.next_serial;
        m.next_serial += 1;
        m.flight = Some(ActiveFlight {
            serial,
            direction: FlightDirection::Enter { appearing },
            guard: FlightGuard::new(),
            classes: classes.clone(),
            swapped: false,
            watcher: None,
            timer: None,
        });
        m.stage = TransitionStage::Entering { appearing };
        let restore_display = matches!(m.descriptor.unmount, UnmountPolicy::Hide)
            .then(|| m.saved_display.clone().unwrap_or_default());
        debug!(element = %element.id(), ?phase, "phase started");
        LaunchPlan {
            element,
            classes,
            before: hooks.before,
            during: hooks.during,
            restore_display,
            serial,
            scheduler: m.scheduler.clone(),
        }
    };
    launch_phase(inner, plan);
}

fn try_leave(inner: &Rc<RefCell<MachineInner>>) {
    let enter_in_flight = {
        let m = inner.borrow();
        matches!(
            &m.flight,
            Some(flight)
                if matches!(flight.direction, FlightDirection::Enter { .. })
                    && flight.guard.is_pending()
        )
    };
    if enter_in_flight {
        settle_flight(inner, SettleOutcome::Cancelled);
    }

    let plan = {
        let mut m = inner.borrow_mut();
        if m.requested {
            return; // a hook reversed the request mid-dispatch
        }
        let Some(element) = m.element.clone() else {
            return;
        };
        // a stale Leaving left by a cancelled flight does not gate a relaunch
        if m.stage == TransitionStage::Absent
            || (m.stage == TransitionStage::Leaving && m.phase_underway())
        {
            return;
        }
        let classes = m.descriptor.stage_classes(TransitionPhase::Leave);
        let hooks = m.hooks.phase_hooks(TransitionPhase::Leave, m.descriptor.custom_appear);
        let serial = m.next_serial;
        m.next_serial += 1;
        m.flight = Some(ActiveFlight {
            serial,
            direction: FlightDirection::Leave,
            guard: FlightGuard::new(),
            classes: classes.clone(),
            swapped: false,
            watcher: None,
            timer: None,
        });
        m.stage = TransitionStage::Leaving;
        debug!(element = %element.id(), phase = ?TransitionPhase::Leave, "phase started");
        LaunchPlan {
            element,
            classes,
            before: hooks.before,
            during: hooks.during,
            restore_display: None,
            serial,
            scheduler: m.scheduler.clone(),
        }
    };
    launch_phase(inner, plan);
}

/// Apply the first stage of a phase and queue the class swap.
///
/// Hooks may re-enter the machine; after each one the flight is checked
/// and the launch abandoned if it was pre-empted.
fn launch_phase(inner: &Rc<RefCell<MachineInner>>, plan: LaunchPlan) {
    if let Some(before) = &plan.before {
        before(&plan.element);
        if !flight_is_live(inner, plan.serial) {
            return;
        }
    }
    if let Some(display) = &plan.restore_display {
        plan.element.set_inline_display(display);
    }
    add_classes(&plan.element, &plan.classes.from);
    add_classes(&plan.element, &plan.classes.active);
    if let Some(during) = &plan.during {
        during(&plan.element);
        if !flight_is_live(inner, plan.serial) {
            return;
        }
    }
    let weak = Rc::downgrade(inner);
    let serial = plan.serial;
    plan.scheduler.schedule_next_frame(move || {
        if let Some(inner) = weak.upgrade() {
            perform_swap(&inner, serial);
        }
    });
}

fn perform_swap(inner: &Rc<RefCell<MachineInner>>, serial: u64) {
    let swap = {
        let mut m = inner.borrow_mut();
        let element = m.element.clone();
        match (&mut m.flight, element) {
            (Some(flight), Some(element))
                if flight.serial == serial && flight.guard.is_pending() =>
            {
                flight.swapped = true;
                Some((element, flight.classes.from.clone(), flight.classes.to.clone()))
            }
            _ => None,
        }
    };
    let Some((element, from, to)) = swap else { return };
    remove_classes(&element, &from);
    add_classes(&element, &to);
    trace!(element = %element.id(), "stage classes swapped");
    begin_end_watch(inner, serial);
}

/// Sample computed timing and either settle immediately (no timed effect)
/// or arm the watcher plus its timeout fallback.
fn begin_end_watch(inner: &Rc<RefCell<MachineInner>>, serial: u64) {
    let probe = {
        let m = inner.borrow();
        match (&m.flight, &m.element) {
            (Some(flight), Some(element))
                if flight.serial == serial && flight.guard.is_pending() =>
            {
                Some((element.clone(), m.descriptor.expected, m.scheduler.clone()))
            }
            _ => None,
        }
    };
    let Some((element, expected, scheduler)) = probe else { return };

    let info = transition_info(&element.timing_styles(), expected);
    let Some(watcher) = EndWatcher::from_info(element.id(), &info) else {
        debug!(element = %element.id(), "no timed effect declared, settling now");
        settle_flight(inner, SettleOutcome::Completed);
        return;
    };

    let weak = Rc::downgrade(inner);
    let timer = scheduler.schedule_timeout(info.timeout_ms + 1, move || {
        let Some(inner) = weak.upgrade() else { return };
        if flight_is_live(&inner, serial) {
            debug!("end events missing at deadline, settling by timeout");
            settle_flight(&inner, SettleOutcome::Completed);
        }
    });

    let mut m = inner.borrow_mut();
    match &mut m.flight {
        Some(flight) if flight.serial == serial && flight.guard.is_pending() => {
            flight.watcher = Some(watcher);
            flight.timer = Some(timer);
        }
        _ => m.scheduler.cancel_timeout(timer),
    }
}

fn note_end(inner: &Rc<RefCell<MachineInner>>, target: ElementId, kind: EndKind) {
    let satisfied = {
        let mut m = inner.borrow_mut();
        let Some(flight) = &mut m.flight else { return };
        if !flight.guard.is_pending() {
            return;
        }
        let Some(watcher) = &mut flight.watcher else { return };
        watcher.note_end(target, kind)
    };
    if satisfied {
        settle_flight(inner, SettleOutcome::Completed);
    }
}

fn flight_is_live(inner: &Rc<RefCell<MachineInner>>, serial: u64) -> bool {
    let m = inner.borrow();
    matches!(&m.flight, Some(flight) if flight.serial == serial && flight.guard.is_pending())
}

struct SettlePlan {
    element: ElementHandle,
    remove: [String; 2],
    after: Option<HookFn>,
    cancelled: Option<HookFn>,
    outcome: SettleOutcome,
    leave_policy: Option<(UnmountPolicy, Option<GroupLink>)>,
}

/// Settle the current flight exactly once: remove its classes, apply the
/// leave policy, fire the "after" or "cancelled" hook.
fn settle_flight(inner: &Rc<RefCell<MachineInner>>, outcome: SettleOutcome) {
    let plan = {
        let mut m = inner.borrow_mut();
        let Some(mut flight) = m.flight.take() else { return };
        let won = match outcome {
            SettleOutcome::Completed => flight.guard.fire(),
            SettleOutcome::Cancelled => flight.guard.cancel(),
        };
        if !won {
            m.flight = Some(flight);
            return;
        }
        if let Some(timer) = flight.timer.take() {
            m.scheduler.cancel_timeout(timer);
        }
        let Some(element) = m.element.clone() else {
            warn!("flight settled without a bound element");
            return;
        };
        let phase = match flight.direction {
            FlightDirection::Enter { appearing: true } => TransitionPhase::Appear,
            FlightDirection::Enter { appearing: false } => TransitionPhase::Enter,
            FlightDirection::Leave => TransitionPhase::Leave,
        };
        let hooks = m.hooks.phase_hooks(phase, m.descriptor.custom_appear);
        let remove = if flight.swapped {
            [flight.classes.to.clone(), flight.classes.active.clone()]
        } else {
            [flight.classes.from.clone(), flight.classes.active.clone()]
        };
        let leave_policy = match (flight.direction, outcome) {
            (FlightDirection::Leave, SettleOutcome::Completed) => {
                m.stage = TransitionStage::Absent;
                Some((m.descriptor.unmount, m.group.clone()))
            }
            (FlightDirection::Enter { .. }, SettleOutcome::Completed) => {
                m.stage = TransitionStage::Entered;
                None
            }
            // pre-emptor or unmount decides the stage
            (_, SettleOutcome::Cancelled) => None,
        };
        debug!(
            element = %element.id(),
            ?phase,
            cancelled = outcome == SettleOutcome::Cancelled,
            "phase settled"
        );
        SettlePlan {
            element,
            remove,
            after: hooks.after,
            cancelled: hooks.cancelled,
            outcome,
            leave_policy,
        }
    };

    remove_classes(&plan.element, &plan.remove[0]);
    remove_classes(&plan.element, &plan.remove[1]);
    match plan.outcome {
        SettleOutcome::Completed => {
            if let Some((policy, group)) = plan.leave_policy {
                if let Some(link) = &group {
                    link.unregister(plan.element.id());
                }
                match policy {
                    UnmountPolicy::Hide => {
                        let current = plan.element.inline_display();
                        inner.borrow_mut().saved_display = Some(current);
                        plan.element.set_inline_display("none");
                    }
                    UnmountPolicy::Detach => {
                        plan.element.detach();
                        inner.borrow_mut().element = None;
                    }
                }
            }
            if let Some(after) = &plan.after {
                after(&plan.element);
            }
        }
        SettleOutcome::Cancelled => {
            if let Some(cancelled) = &plan.cancelled {
                cancelled(&plan.element);
            }
        }
    }
}
