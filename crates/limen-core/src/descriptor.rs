//! Configuration descriptors for managed elements and groups.
//!
//! A [`TransitionDescriptor`] is the full per-element configuration
//! snapshot; the engine reads it at each phase decision, so replacing it
//! mid-flight affects the next decision without disturbing classes already
//! applied. [`GroupDescriptor`] and [`ChildOptions`] cover the group layer:
//! children inherit the group's naming prefix and appear flag unless they
//! specify their own.

use serde::{Deserialize, Serialize};
use static_assertions::assert_impl_all;

use crate::class::{StageClasses, TransitionPhase};
use crate::timing::EndKind;

/// What happens to an element once its leave finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnmountPolicy {
    /// Detach the element from the live tree.
    #[default]
    Detach,
    /// Keep the element mounted with `display: none`, restoring the saved
    /// inline display on the next enter.
    Hide,
}

/// Explicit class-name overrides for the nine stage classes.
///
/// Unset entries derive defaults from the descriptor's naming prefix.
/// Appear entries additionally fall back to the resolved enter entries
/// unless `custom_appear` is set on the descriptor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassOverrides {
    pub enter_from: Option<String>,
    pub enter_active: Option<String>,
    pub enter_to: Option<String>,
    pub appear_from: Option<String>,
    pub appear_active: Option<String>,
    pub appear_to: Option<String>,
    pub leave_from: Option<String>,
    pub leave_active: Option<String>,
    pub leave_to: Option<String>,
}

/// Per-element transition configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransitionDescriptor {
    /// Naming prefix for derived class names.
    pub name: String,
    /// Allow a transition on the element's first mount.
    pub appear: bool,
    /// Use distinct `{name}-appear-*` classes and appear hooks instead of
    /// falling back to the enter ones.
    pub custom_appear: bool,
    /// Policy applied when a leave completes.
    pub unmount: UnmountPolicy,
    /// Restrict end detection to one timing kind instead of auto-detecting.
    pub expected: Option<EndKind>,
    #[serde(flatten)]
    pub classes: ClassOverrides,
}

impl Default for TransitionDescriptor {
    fn default() -> Self {
        Self {
            name: "transition".to_string(),
            appear: false,
            custom_appear: false,
            unmount: UnmountPolicy::default(),
            expected: None,
            classes: ClassOverrides::default(),
        }
    }
}

impl TransitionDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), ..Self::default() }
    }

    pub fn with_appear(mut self, appear: bool) -> Self {
        self.appear = appear;
        self
    }

    pub fn with_custom_appear(mut self, custom_appear: bool) -> Self {
        self.custom_appear = custom_appear;
        self
    }

    pub fn with_unmount(mut self, policy: UnmountPolicy) -> Self {
        self.unmount = policy;
        self
    }

    pub fn with_expected(mut self, kind: EndKind) -> Self {
        self.expected = Some(kind);
        self
    }

    pub fn with_classes(mut self, classes: ClassOverrides) -> Self {
        self.classes = classes;
        self
    }

    /// Resolved `{from, active, to}` class names for a phase.
    ///
    /// Explicit overrides win over derived defaults. Appear classes fall
    /// back to the resolved enter classes, unless `custom_appear` is set,
    /// in which case unset appear classes derive `{name}-appear-*` names.
    pub fn stage_classes(&self, phase: TransitionPhase) -> StageClasses {
        let defaults = StageClasses::defaults(&self.name, phase);
        match phase {
            TransitionPhase::Enter => StageClasses {
                from: self.classes.enter_from.clone().unwrap_or(defaults.from),
                active: self.classes.enter_active.clone().unwrap_or(defaults.active),
                to: self.classes.enter_to.clone().unwrap_or(defaults.to),
            },
            TransitionPhase::Leave => StageClasses {
                from: self.classes.leave_from.clone().unwrap_or(defaults.from),
                active: self.classes.leave_active.clone().unwrap_or(defaults.active),
                to: self.classes.leave_to.clone().unwrap_or(defaults.to),
            },
            TransitionPhase::Appear => {
                let fallback = if self.custom_appear {
                    defaults
                } else {
                    self.stage_classes(TransitionPhase::Enter)
                };
                StageClasses {
                    from: self.classes.appear_from.clone().unwrap_or(fallback.from),
                    active: self.classes.appear_active.clone().unwrap_or(fallback.active),
                    to: self.classes.appear_to.clone().unwrap_or(fallback.to),
                }
            }
        }
    }
}

/// Per-group configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupDescriptor {
    /// Default naming prefix inherited by children.
    pub name: String,
    /// Default appear flag inherited by children.
    pub appear: bool,
    /// Animate position changes of retained children.
    pub move_transition: bool,
    /// Class applied to a child while its move animation plays; unset
    /// derives `{name}-move`.
    pub move_class: Option<String>,
}

impl Default for GroupDescriptor {
    fn default() -> Self {
        Self {
            name: "transition".to_string(),
            appear: false,
            move_transition: true,
            move_class: None,
        }
    }
}

impl GroupDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), ..Self::default() }
    }

    pub fn with_appear(mut self, appear: bool) -> Self {
        self.appear = appear;
        self
    }

    pub fn with_move_transition(mut self, enabled: bool) -> Self {
        self.move_transition = enabled;
        self
    }

    pub fn with_move_class(mut self, class: impl Into<String>) -> Self {
        self.move_class = Some(class.into());
        self
    }

    /// Resolved move class for this group.
    pub fn resolved_move_class(&self) -> String {
        self.move_class.clone().unwrap_or_else(|| format!("{}-move", self.name))
    }
}

/// Per-child overrides layered over a group's defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChildOptions {
    /// Overrides the group's naming prefix for this child.
    pub name: Option<String>,
    /// Overrides the group's appear default for this child.
    pub appear: Option<bool>,
    pub custom_appear: bool,
    pub unmount: UnmountPolicy,
    pub expected: Option<EndKind>,
    #[serde(flatten)]
    pub classes: ClassOverrides,
}

impl ChildOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_appear(mut self, appear: bool) -> Self {
        self.appear = Some(appear);
        self
    }

    pub fn with_unmount(mut self, policy: UnmountPolicy) -> Self {
        self.unmount = policy;
        self
    }

    /// Merge these options over a group's defaults into a full descriptor.
    pub fn resolve(&self, group: &GroupDescriptor) -> TransitionDescriptor {
        TransitionDescriptor {
            name: self.name.clone().unwrap_or_else(|| group.name.clone()),
            appear: self.appear.unwrap_or(group.appear),
            custom_appear: self.custom_appear,
            unmount: self.unmount,
            expected: self.expected,
            classes: self.classes.clone(),
        }
    }
}

assert_impl_all!(TransitionDescriptor: Clone, Send, Sync);
assert_impl_all!(GroupDescriptor: Clone, Send, Sync);
