//! Lifecycle hook configuration.
//!
//! Hooks are optional callbacks fired at the edges of each phase: before
//! the first classes go on, right after they are applied, after the phase
//! settles, and when a phase is cancelled by a pre-emption. Appear hooks
//! fall back to the enter hooks unless the descriptor's `custom_appear`
//! flag is set, in which case unset appear hooks simply stay unset.

use std::fmt;
use std::rc::Rc;

use limen_core::TransitionPhase;

use crate::host::ElementHandle;

/// Callback invoked with the element a lifecycle edge applies to.
pub type HookFn = Rc<dyn Fn(&ElementHandle)>;

/// Optional lifecycle callbacks for one managed element.
#[derive(Clone, Default)]
pub struct TransitionHooks {
    pub before_enter: Option<HookFn>,
    pub enter: Option<HookFn>,
    pub after_enter: Option<HookFn>,
    pub enter_cancelled: Option<HookFn>,
    pub before_leave: Option<HookFn>,
    pub leave: Option<HookFn>,
    pub after_leave: Option<HookFn>,
    pub leave_cancelled: Option<HookFn>,
    pub before_appear: Option<HookFn>,
    pub appear: Option<HookFn>,
    pub after_appear: Option<HookFn>,
    pub appear_cancelled: Option<HookFn>,
}

impl TransitionHooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_before_enter(mut self, hook: impl Fn(&ElementHandle) + 'static) -> Self {
        self.before_enter = Some(Rc::new(hook));
        self
    }

    pub fn with_enter(mut self, hook: impl Fn(&ElementHandle) + 'static) -> Self {
        self.enter = Some(Rc::new(hook));
        self
    }

    pub fn with_after_enter(mut self, hook: impl Fn(&ElementHandle) + 'static) -> Self {
        self.after_enter = Some(Rc::new(hook));
        self
    }

    pub fn with_enter_cancelled(mut self, hook: impl Fn(&ElementHandle) + 'static) -> Self {
        self.enter_cancelled = Some(Rc::new(hook));
        self
    }

    pub fn with_before_leave(mut self, hook: impl Fn(&ElementHandle) + 'static) -> Self {
        self.before_leave = Some(Rc::new(hook));
        self
    }

    pub fn with_leave(mut self, hook: impl Fn(&ElementHandle) + 'static) -> Self {
        self.leave = Some(Rc::new(hook));
        self
    }

    pub fn with_after_leave(mut self, hook: impl Fn(&ElementHandle) + 'static) -> Self {
        self.after_leave = Some(Rc::new(hook));
        self
    }

    pub fn with_leave_cancelled(mut self, hook: impl Fn(&ElementHandle) + 'static) -> Self {
        self.leave_cancelled = Some(Rc::new(hook));
        self
    }

    pub fn with_before_appear(mut self, hook: impl Fn(&ElementHandle) + 'static) -> Self {
        self.before_appear = Some(Rc::new(hook));
        self
    }

    pub fn with_appear(mut self, hook: impl Fn(&ElementHandle) + 'static) -> Self {
        self.appear = Some(Rc::new(hook));
        self
    }

    pub fn with_after_appear(mut self, hook: impl Fn(&ElementHandle) + 'static) -> Self {
        self.after_appear = Some(Rc::new(hook));
        self
    }

    pub fn with_appear_cancelled(mut self, hook: impl Fn(&ElementHandle) + 'static) -> Self {
        self.appear_cancelled = Some(Rc::new(hook));
        self
    }

    /// Resolved callbacks for one phase, appear fallback applied.
    pub(crate) fn phase_hooks(&self, phase: TransitionPhase, custom_appear: bool) -> PhaseHooks {
        match phase {
            TransitionPhase::Enter => PhaseHooks {
                before: self.before_enter.clone(),
                during: self.enter.clone(),
                after: self.after_enter.clone(),
                cancelled: self.enter_cancelled.clone(),
            },
            TransitionPhase::Leave => PhaseHooks {
                before: self.before_leave.clone(),
                during: self.leave.clone(),
                after: self.after_leave.clone(),
                cancelled: self.leave_cancelled.clone(),
            },
            TransitionPhase::Appear => {
                let pick = |appear: &Option<HookFn>, enter: &Option<HookFn>| {
                    appear.clone().or_else(|| if custom_appear { None } else { enter.clone() })
                };
                PhaseHooks {
                    before: pick(&self.before_appear, &self.before_enter),
                    during: pick(&self.appear, &self.enter),
                    after: pick(&self.after_appear, &self.after_enter),
                    cancelled: pick(&self.appear_cancelled, &self.enter_cancelled),
                }
            }
        }
    }
}

impl fmt::Debug for TransitionHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let set: Vec<&str> = [
            ("before_enter", self.before_enter.is_some()),
            ("enter", self.enter.is_some()),
            ("after_enter", self.after_enter.is_some()),
            ("enter_cancelled", self.enter_cancelled.is_some()),
            ("before_leave", self.before_leave.is_some()),
            ("leave", self.leave.is_some()),
            ("after_leave", self.after_leave.is_some()),
            ("leave_cancelled", self.leave_cancelled.is_some()),
            ("before_appear", self.before_appear.is_some()),
            ("appear", self.appear.is_some()),
            ("after_appear", self.after_appear.is_some()),
            ("appear_cancelled", self.appear_cancelled.is_some()),
        ]
        .into_iter()
        .filter_map(|(name, present)| present.then_some(name))
        .collect();
        f.debug_tuple("TransitionHooks").field(&set).finish()
    }
}

/// Callbacks resolved for one concrete phase run.
#[derive(Clone, Default)]
pub(crate) struct PhaseHooks {
    pub(crate) before: Option<HookFn>,
    pub(crate) during: Option<HookFn>,
    pub(crate) after: Option<HookFn>,
    pub(crate) cancelled: Option<HookFn>,
}

/// Compose an optional hook with a trailing callback into one hook.
pub(crate) fn chain(first: Option<HookFn>, second: impl Fn(&ElementHandle) + 'static) -> HookFn {
    Rc::new(move |element| {
        if let Some(first) = &first {
            first(element);
        }
        second(element);
    })
}
