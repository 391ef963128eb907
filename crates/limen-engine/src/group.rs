//! Group coordination: keyed reconciliation, child machines, the move pass.
//!
//! A group owns one [`TransitionMachine`](crate::TransitionMachine) per
//! keyed child and reconciles each render pass against the previous one:
//! children present in both passes are retained, children only in the new
//! pass animate in, and children only in the old pass keep their visual
//! slot while they animate out. Retained children that changed position
//! get a FLIP move animation.
//!
//! Render protocol, three calls per pass:
//!
//! ```ignore
//! group.snapshot_positions();                    // before mutating the tree
//! let plan = group.apply_children(children)?;    // reconcile
//! // arrange host elements following plan.order ...
//! group.commit();                                // drive transitions + moves
//! ```
//!
//! `apply_children` only reconciles; nothing observable happens to any
//! element until `commit`. Native end events go through
//! [`GroupCoordinator::handle_transition_end`], which routes them to both
//! the child machines and any in-flight moves.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use limen_core::{
    ChildMapping, ChildOptions, ElementId, GroupDescriptor, Result, TransitionDescriptor,
    child_mapping_from_pairs, merge_mappings,
};

use crate::flip::{MoveTracker, PositionLedger, measure};
use crate::hooks::{TransitionHooks, chain};
use crate::host::{ElementHandle, add_classes, remove_classes};
use crate::scheduler::FrameScheduler;
use crate::transition::{TransitionMachine, TransitionStage};

/// One keyed child supplied to a render pass.
pub struct ChildSpec {
    pub key: String,
    pub element: ElementHandle,
    pub options: ChildOptions,
    pub hooks: Option<TransitionHooks>,
}

impl ChildSpec {
    pub fn new(key: impl Into<String>, element: ElementHandle) -> Self {
        Self { key: key.into(), element, options: ChildOptions::default(), hooks: None }
    }

    pub fn with_options(mut self, options: ChildOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_hooks(mut self, hooks: TransitionHooks) -> Self {
        self.hooks = Some(hooks);
        self
    }
}

/// How a slot in the merged render order came to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotKind {
    /// Entering this pass.
    New,
    /// Present in both passes.
    Retained,
    /// Gone from the new pass but holding its slot while leaving.
    Leaving,
}

/// One entry of the merged render order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderSlot {
    pub key: String,
    pub element: ElementId,
    pub kind: SlotKind,
}

/// Outcome of reconciling one render pass: the definitive order for the
/// host tree, leaving children included at their old slots.
#[derive(Debug, Clone)]
pub struct RenderPlan {
    pub order: Vec<RenderSlot>,
}

struct ChildEntry {
    machine: TransitionMachine,
    element: ElementHandle,
    leaving: bool,
}

enum PendingOp {
    /// Bind and show a child created this pass.
    Mount { key: String },
    /// Push current config into a retained child and keep it shown.
    Refresh { key: String, descriptor: TransitionDescriptor, hooks: TransitionHooks },
    /// Start a leave for a child gone from the new pass.
    Leave { key: String },
    /// Unbind a machine whose element was swapped out from under it.
    Retire { machine: TransitionMachine },
}

pub(crate) struct GroupInner {
    descriptor: GroupDescriptor,
    scheduler: FrameScheduler,
    children: IndexMap<String, ChildEntry>,
    /// Elements participating in move measurements.
    tracked: Vec<ElementHandle>,
    /// Registered this pass; merged into `tracked` after the move pass so
    /// fresh children are never measured against boxes they did not have.
    pending_track: Vec<ElementHandle>,
    ledger: PositionLedger,
    moves: MoveTracker,
    /// True until the first commit finishes; children mounted inside the
    /// window may use their appear phase.
    appear_window: bool,
    pending_ops: Vec<PendingOp>,
}

/// Weak handle from a child machine back to its group.
#[derive(Clone)]
pub(crate) struct GroupLink {
    inner: Weak<RefCell<GroupInner>>,
}

impl GroupLink {
    pub(crate) fn appear_window(&self) -> bool {
        self.inner.upgrade().map_or(true, |group| group.borrow().appear_window)
    }

    pub(crate) fn register(&self, element: ElementHandle) {
        if let Some(group) = self.inner.upgrade() {
            group.borrow_mut().pending_track.push(element);
        }
    }

    pub(crate) fn unregister(&self, id: ElementId) {
        if let Some(group) = self.inner.upgrade() {
            let mut g = group.borrow_mut();
            g.tracked.retain(|element| element.id() != id);
            g.pending_track.retain(|element| element.id() != id);
        }
    }
}

/// Coordinator for a keyed collection of transitioned children.
///
/// Cloning yields another handle to the same group.
#[derive(Clone)]
pub struct GroupCoordinator {
    inner: Rc<RefCell<GroupInner>>,
}

impl GroupCoordinator {
    pub fn new(descriptor: GroupDescriptor, scheduler: FrameScheduler) -> Self {
        Self {
            inner: Rc::new(RefCell::new(GroupInner {
                descriptor,
                scheduler,
                children: IndexMap::new(),
                tracked: Vec::new(),
                pending_track: Vec::new(),
                ledger: PositionLedger::new(),
                moves: MoveTracker::new(),
                appear_window: true,
                pending_ops: Vec::new(),
            })),
        }
    }

    /// Replace the group configuration; children pick it up next pass.
    pub fn set_descriptor(&self, descriptor: GroupDescriptor) {
        self.inner.borrow_mut().descriptor = descriptor;
    }

    pub fn descriptor(&self) -> GroupDescriptor {
        self.inner.borrow().descriptor.clone()
    }

    /// Whether the group is still before its first commit.
    pub fn in_appear_window(&self) -> bool {
        self.inner.borrow().appear_window
    }

    /// Record the current bounding boxes of every tracked child.
    ///
    /// Call before the host mutates the tree for a new pass; the move pass
    /// compares against these. A no-op while nothing is tracked.
    pub fn snapshot_positions(&self) {
        let tracked = { self.inner.borrow().tracked.clone() };
        let records = measure(&tracked);
        self.inner.borrow_mut().ledger.load_before(records);
    }

    /// Reconcile a render pass against the previous one.
    ///
    /// Validates keys, merges the orders so leaving children hold their
    /// slots, creates machines for new children and marks leavers — but
    /// drives nothing: element effects start at [`commit`](Self::commit).
    /// On a key error the group is left untouched.
    pub fn apply_children(&self, children: Vec<ChildSpec>) -> Result<RenderPlan> {
        let mut next =
            child_mapping_from_pairs(children.into_iter().map(|child| (child.key.clone(), child)))?;

        let link = GroupLink { inner: Rc::downgrade(&self.inner) };
        let mut g = self.inner.borrow_mut();
        let g = &mut *g;

        let prev_keys: ChildMapping<()> = g.children.keys().map(|key| (key.clone(), ())).collect();
        let next_keys: ChildMapping<()> = next.keys().map(|key| (key.clone(), ())).collect();
        let merged = merge_mappings(&prev_keys, &next_keys);

        let mut table = IndexMap::with_capacity(merged.len());
        let mut ops = Vec::new();
        let mut order = Vec::with_capacity(merged.len());

        for key in merged.keys() {
            match (g.children.shift_remove(key), next.shift_remove(key)) {
                (Some(mut entry), Some(spec)) => {
                    if entry.element.id() == spec.element.id() {
                        entry.leaving = false;
                        let descriptor = spec.options.resolve(&g.descriptor);
                        let hooks = child_hooks(spec.hooks, key, &link);
                        ops.push(PendingOp::Refresh { key: key.clone(), descriptor, hooks });
                        order.push(RenderSlot {
                            key: key.clone(),
                            element: entry.element.id(),
                            kind: SlotKind::Retained,
                        });
                        table.insert(key.clone(), entry);
                    } else {
                        warn!(
                            key = %key,
                            old = %entry.element.id(),
                            new = %spec.element.id(),
                            "child element replaced, restarting its transition"
                        );
                        ops.push(PendingOp::Retire { machine: entry.machine.clone() });
                        let fresh = build_child(g, &link, key, &spec);
                        ops.push(PendingOp::Mount { key: key.clone() });
                        order.push(RenderSlot {
                            key: key.clone(),
                            element: spec.element.id(),
                            kind: SlotKind::New,
                        });
                        table.insert(key.clone(), fresh);
                    }
                }
                (Some(mut entry), None) => {
                    if !entry.leaving {
                        entry.leaving = true;
                        ops.push(PendingOp::Leave { key: key.clone() });
                    }
                    order.push(RenderSlot {
                        key: key.clone(),
                        element: entry.element.id(),
                        kind: SlotKind::Leaving,
                    });
                    table.insert(key.clone(), entry);
                }
                (None, Some(spec)) => {
                    let entry = build_child(g, &link, key, &spec);
                    ops.push(PendingOp::Mount { key: key.clone() });
                    order.push(RenderSlot {
                        key: key.clone(),
                        element: spec.element.id(),
                        kind: SlotKind::New,
                    });
                    table.insert(key.clone(), entry);
                }
                (None, None) => {}
            }
        }

        g.children = table;
        g.pending_ops = ops;
        Ok(RenderPlan { order })
    }

    /// Drive the reconciled pass: mount and show new children, refresh
    /// retained ones, start leaves, then run the move pass.
    pub fn commit(&self) {
        let ops = std::mem::take(&mut self.inner.borrow_mut().pending_ops);
        for op in ops {
            match op {
                PendingOp::Retire { machine } => machine.unmount(),
                PendingOp::Mount { key } => {
                    let fetched = {
                        let g = self.inner.borrow();
                        g.children
                            .get(&key)
                            .map(|entry| (entry.machine.clone(), entry.element.clone()))
                    };
                    let Some((machine, element)) = fetched else { continue };
                    // visibility first: the mount evaluates the pending
                    // request, which is where appear rules apply
                    machine.request_visible(true);
                    if let Err(err) = machine.mount(element) {
                        warn!(key = %key, ?err, "child mount failed");
                    }
                }
                PendingOp::Refresh { key, descriptor, hooks } => {
                    let fetched = {
                        let g = self.inner.borrow();
                        g.children.get(&key).map(|entry| entry.machine.clone())
                    };
                    let Some(machine) = fetched else { continue };
                    machine.set_descriptor(descriptor);
                    machine.set_hooks(hooks);
                    machine.request_visible(true);
                }
                PendingOp::Leave { key } => {
                    let fetched = {
                        let g = self.inner.borrow();
                        g.children.get(&key).map(|entry| entry.machine.clone())
                    };
                    let Some(machine) = fetched else { continue };
                    machine.request_visible(false);
                }
            }
        }
        run_move_pass(&self.inner);
    }

    /// Native `transitionend` on `target`; routed to the child machine and
    /// to any in-flight move on the element.
    pub fn handle_transition_end(&self, target: ElementId, property_name: &str) {
        let machine = {
            let g = self.inner.borrow();
            g.children
                .values()
                .find(|entry| entry.element.id() == target)
                .map(|entry| entry.machine.clone())
        };
        match &machine {
            Some(machine) => machine.notify_transition_end(target, property_name),
            None => trace!(%target, "transition end for untracked element"),
        }

        let settled = self.inner.borrow_mut().moves.settle(target, property_name);
        if let Some((element, class)) = settled {
            remove_classes(&element, &class);
            trace!(element = %target, "move animation finished");
        }
    }

    /// Native `animationend` on `target`; moves only ever ride transitions,
    /// so this routes to the child machine alone.
    pub fn handle_animation_end(&self, target: ElementId, animation_name: &str) {
        let machine = {
            let g = self.inner.borrow();
            g.children
                .values()
                .find(|entry| entry.element.id() == target)
                .map(|entry| entry.machine.clone())
        };
        match &machine {
            Some(machine) => machine.notify_animation_end(target, animation_name),
            None => trace!(%target, "animation end for untracked element"),
        }
    }

    /// Current table view: merged order with leavers flagged.
    pub fn render_order(&self) -> Vec<RenderSlot> {
        let g = self.inner.borrow();
        g.children
            .iter()
            .map(|(key, entry)| RenderSlot {
                key: key.clone(),
                element: entry.element.id(),
                kind: if entry.leaving { SlotKind::Leaving } else { SlotKind::Retained },
            })
            .collect()
    }

    /// Lifecycle stage of one child, by key.
    pub fn child_stage(&self, key: &str) -> Option<TransitionStage> {
        let machine = {
            let g = self.inner.borrow();
            g.children.get(key).map(|entry| entry.machine.clone())
        };
        machine.map(|machine| machine.stage())
    }

    pub fn len(&self) -> usize {
        self.inner.borrow().children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.borrow().children.is_empty()
    }
}

fn build_child(g: &GroupInner, link: &GroupLink, key: &str, spec: &ChildSpec) -> ChildEntry {
    let mut descriptor = spec.options.resolve(&g.descriptor);
    if !g.appear_window {
        // children added to a live group always animate in
        descriptor.appear = true;
    }
    let hooks = child_hooks(spec.hooks.clone(), key, link);
    let machine =
        TransitionMachine::with_group(descriptor, hooks, g.scheduler.clone(), link.clone());
    ChildEntry { machine, element: spec.element.clone(), leaving: false }
}

/// Chain the group's purge onto the child's own after-leave hook, so a
/// finished leave removes the child from the table.
fn child_hooks(user: Option<TransitionHooks>, key: &str, link: &GroupLink) -> TransitionHooks {
    let mut hooks = user.unwrap_or_default();
    let group = link.inner.clone();
    let key = key.to_string();
    hooks.after_leave = Some(chain(hooks.after_leave.take(), move |_element| {
        purge_child(&group, &key);
    }));
    hooks
}

fn purge_child(group: &Weak<RefCell<GroupInner>>, key: &str) {
    let Some(inner) = group.upgrade() else { return };
    let removed = inner.borrow_mut().children.shift_remove(key).is_some();
    if removed {
        debug!(key = %key, "child left the group");
    }
}

/// First/last/invert/play over the tracked elements.
///
/// Stale moves from the previous pass are force-finished first so their
/// transforms cannot pollute the new measurements; the translation clear
/// and move class go on under a single forced layout flush in between.
fn run_move_pass(inner: &Rc<RefCell<GroupInner>>) {
    let (first, enabled, move_class, tracked) = {
        let mut g = inner.borrow_mut();
        let first = g.appear_window;
        g.appear_window = false;
        (
            first,
            g.descriptor.move_transition,
            g.descriptor.resolved_move_class(),
            g.tracked.clone(),
        )
    };
    // the first commit has nothing measured yet: just absorb registrations
    if first {
        merge_pending(inner);
        return;
    }

    let stale = { inner.borrow_mut().moves.drain() };
    for (element, class) in stale {
        remove_classes(&element, &class);
    }
    if !enabled {
        merge_pending(inner);
        return;
    }

    let after = measure(&tracked);
    let movers: Vec<(ElementHandle, f32, f32)> = {
        let mut g = inner.borrow_mut();
        g.ledger.load_after(after);
        tracked
            .iter()
            .filter_map(|element| {
                g.ledger.inversion(element.id()).map(|(dx, dy)| (element.clone(), dx, dy))
            })
            .collect()
    };

    for (element, dx, dy) in &movers {
        element.set_translation(*dx, *dy);
    }
    // one synchronous reflow commits every inverted transform
    if let Some((element, _, _)) = movers.first() {
        element.flush_layout();
    }
    for (element, _, _) in &movers {
        add_classes(element, &move_class);
        element.clear_translation();
    }

    if !movers.is_empty() {
        debug!(count = movers.len(), class = %move_class, "move animations started");
        let mut g = inner.borrow_mut();
        for (element, _, _) in &movers {
            g.moves.begin(element.clone(), move_class.clone());
        }
    }
    merge_pending(inner);
}

fn merge_pending(inner: &Rc<RefCell<GroupInner>>) {
    let mut g = inner.borrow_mut();
    let g = &mut *g;
    for element in g.pending_track.drain(..) {
        if !g.tracked.iter().any(|tracked| tracked.id() == element.id()) {
            g.tracked.push(element);
        }
    }
}
