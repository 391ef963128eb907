mod common;

use anyhow::Result;
use common::{MockElement, count_of, hook_log, log_hook, logged};
use limen_core::{ElementId, EndKind, TimingStyles, TransitionDescriptor, UnmountPolicy, UsageError};
use limen_engine::{
    FrameScheduler, HostElement, TransitionHooks, TransitionMachine, TransitionStage,
};

#[test]
fn test_enter_applies_the_three_stage_class_sequence() -> Result<()> {
    let scheduler = FrameScheduler::new();
    let element = MockElement::new(1);
    element.set_timing(TimingStyles::transition("0s", "0.1s"));
    let machine = TransitionMachine::new(
        TransitionDescriptor::new("fade"),
        TransitionHooks::new(),
        scheduler.clone(),
    );

    machine.mount(element.handle())?;
    machine.request_visible(true);
    assert_eq!(element.classes(), vec!["fade-enter-from", "fade-enter-active"]);
    assert_eq!(machine.stage(), TransitionStage::Entering { appearing: false });

    // the swap waits one full rendered frame
    scheduler.run_frame(0);
    assert!(element.has_class("fade-enter-from"), "swap must not happen on the first pump");
    scheduler.run_frame(16);
    assert!(!element.has_class("fade-enter-from"));
    assert!(element.has_class("fade-enter-active"));
    assert!(element.has_class("fade-enter-to"));

    machine.notify_transition_end(ElementId(1), "opacity");
    assert!(element.classes().is_empty(), "settling removes every stage class");
    assert_eq!(machine.stage(), TransitionStage::Entered);
    assert!(!scheduler.has_pending_work(), "the timeout fallback is cancelled on settle");
    Ok(())
}

#[test]
fn test_leave_detaches_under_the_detach_policy() -> Result<()> {
    let scheduler = FrameScheduler::new();
    let element = MockElement::new(1);
    element.set_timing(TimingStyles::transition("0s", "0.1s"));
    let log = hook_log();
    let hooks = TransitionHooks::new().with_after_leave(log_hook(&log, "after_leave"));
    let machine =
        TransitionMachine::new(TransitionDescriptor::new("fade"), hooks, scheduler.clone());

    machine.mount(element.handle())?;
    machine.request_visible(true);
    scheduler.run_frame(0);
    scheduler.run_frame(16);
    machine.notify_transition_end(ElementId(1), "opacity");

    machine.request_visible(false);
    assert_eq!(element.classes(), vec!["fade-leave-from", "fade-leave-active"]);
    assert_eq!(machine.stage(), TransitionStage::Leaving);

    scheduler.run_frame(32);
    scheduler.run_frame(48);
    machine.notify_transition_end(ElementId(1), "opacity");
    assert!(element.classes().is_empty());
    assert_eq!(machine.stage(), TransitionStage::Absent);
    assert!(element.is_detached());
    assert!(!machine.is_mounted(), "a detached leave unbinds the element");
    assert_eq!(logged(&log), vec!["after_leave"]);
    Ok(())
}

#[test]
fn test_hide_policy_saves_and_restores_inline_display() -> Result<()> {
    let scheduler = FrameScheduler::new();
    let element = MockElement::new(1);
    element.set_inline_display("flex");
    let machine = TransitionMachine::new(
        TransitionDescriptor::new("fade").with_unmount(UnmountPolicy::Hide),
        TransitionHooks::new(),
        scheduler.clone(),
    );

    // mounting hidden hides immediately and saves the inline value
    machine.mount(element.handle())?;
    assert_eq!(element.display(), "none");

    machine.request_visible(true);
    assert_eq!(element.display(), "flex", "display is restored before enter classes");
    scheduler.run_frame(0);
    scheduler.run_frame(16); // no timed effect: settles at the swap
    assert_eq!(machine.stage(), TransitionStage::Entered);

    machine.request_visible(false);
    scheduler.run_frame(32);
    scheduler.run_frame(48);
    assert_eq!(element.display(), "none");
    assert_eq!(machine.stage(), TransitionStage::Absent);
    assert!(machine.is_mounted(), "hide keeps the element bound");
    assert!(!element.is_detached());

    machine.request_visible(true);
    assert_eq!(element.display(), "flex");
    Ok(())
}

#[test]
fn test_hooks_fire_in_lifecycle_order_around_class_mutations() -> Result<()> {
    let scheduler = FrameScheduler::new();
    let element = MockElement::new(1);
    element.set_timing(TimingStyles::transition("0s", "0.2s"));
    let log = hook_log();

    let probe = element.clone();
    let hooks = TransitionHooks::new()
        .with_before_enter({
            let log = log.clone();
            move |_| {
                assert!(probe.classes().is_empty(), "before-hook runs ahead of any class");
                log.borrow_mut().push("before_enter");
            }
        })
        .with_enter({
            let probe = element.clone();
            let log = log.clone();
            move |_| {
                assert!(probe.has_class("fade-enter-from"), "during-hook sees the from class");
                assert!(probe.has_class("fade-enter-active"));
                log.borrow_mut().push("enter");
            }
        })
        .with_after_enter(log_hook(&log, "after_enter"));
    let machine =
        TransitionMachine::new(TransitionDescriptor::new("fade"), hooks, scheduler.clone());

    machine.mount(element.handle())?;
    machine.request_visible(true);
    scheduler.run_frame(0);
    scheduler.run_frame(16);
    machine.notify_transition_end(ElementId(1), "opacity");
    assert_eq!(logged(&log), vec!["before_enter", "enter", "after_enter"]);
    Ok(())
}

#[test]
fn test_repeated_requests_are_idempotent() -> Result<()> {
    let scheduler = FrameScheduler::new();
    let element = MockElement::new(1);
    element.set_timing(TimingStyles::transition("0s", "0.5s"));
    let log = hook_log();
    let hooks = TransitionHooks::new().with_before_enter(log_hook(&log, "before_enter"));
    let machine =
        TransitionMachine::new(TransitionDescriptor::new("fade"), hooks, scheduler.clone());

    machine.mount(element.handle())?;
    machine.request_visible(true);
    let classes = element.classes();
    machine.request_visible(true);
    machine.request_visible(true);
    assert_eq!(element.classes(), classes, "repeat requests touch nothing");
    assert_eq!(count_of(&log, "before_enter"), 1);
    Ok(())
}

#[test]
fn test_preemption_after_swap_fires_cancelled_exactly_once() -> Result<()> {
    let scheduler = FrameScheduler::new();
    let element = MockElement::new(1);
    element.set_timing(TimingStyles::transition("0s", "1s"));
    let log = hook_log();
    let hooks = TransitionHooks::new()
        .with_enter_cancelled(log_hook(&log, "enter_cancelled"))
        .with_after_enter(log_hook(&log, "after_enter"))
        .with_after_leave(log_hook(&log, "after_leave"));
    let machine =
        TransitionMachine::new(TransitionDescriptor::new("fade"), hooks, scheduler.clone());

    machine.mount(element.handle())?;
    machine.request_visible(true);
    scheduler.run_frame(0);
    scheduler.run_frame(16);
    assert!(element.has_class("fade-enter-to"));

    machine.request_visible(false);
    assert_eq!(count_of(&log, "enter_cancelled"), 1);
    assert!(!element.has_class("fade-enter-to"), "cancelled enter classes come off");
    assert!(element.has_class("fade-leave-from"));
    assert_eq!(machine.stage(), TransitionStage::Leaving);

    scheduler.run_frame(32);
    scheduler.run_frame(48);
    machine.notify_transition_end(ElementId(1), "opacity");
    assert_eq!(count_of(&log, "enter_cancelled"), 1, "cancellation reports once");
    assert_eq!(count_of(&log, "after_enter"), 0);
    assert_eq!(count_of(&log, "after_leave"), 1);
    Ok(())
}

#[test]
fn test_preemption_before_swap_discards_the_stale_frame_callback() -> Result<()> {
    let scheduler = FrameScheduler::new();
    let element = MockElement::new(1);
    element.set_timing(TimingStyles::transition("0s", "1s"));
    let machine = TransitionMachine::new(
        TransitionDescriptor::new("fade"),
        TransitionHooks::new(),
        scheduler.clone(),
    );

    machine.mount(element.handle())?;
    machine.request_visible(true);
    machine.request_visible(false); // flip before any frame ran

    scheduler.run_frame(0);
    scheduler.run_frame(16);
    assert!(!element.has_class("fade-enter-to"), "the stale enter swap must not run");
    assert!(element.has_class("fade-leave-active"));
    assert!(element.has_class("fade-leave-to"));
    Ok(())
}

#[test]
fn test_reentering_during_leave_cancels_it() -> Result<()> {
    let scheduler = FrameScheduler::new();
    let element = MockElement::new(1);
    element.set_timing(TimingStyles::transition("0s", "1s"));
    let log = hook_log();
    let hooks = TransitionHooks::new()
        .with_leave_cancelled(log_hook(&log, "leave_cancelled"))
        .with_after_leave(log_hook(&log, "after_leave"));
    let machine =
        TransitionMachine::new(TransitionDescriptor::new("fade"), hooks, scheduler.clone());

    machine.mount(element.handle())?;
    machine.request_visible(true);
    scheduler.run_frame(0);
    scheduler.run_frame(16);
    machine.notify_transition_end(ElementId(1), "opacity");

    machine.request_visible(false);
    scheduler.run_frame(32);
    scheduler.run_frame(48);
    assert!(element.has_class("fade-leave-to"));

    machine.request_visible(true);
    assert_eq!(logged(&log), vec!["leave_cancelled"]);
    assert!(element.has_class("fade-enter-from"));
    assert!(!element.has_class("fade-leave-to"));

    scheduler.run_frame(64);
    scheduler.run_frame(80);
    machine.notify_transition_end(ElementId(1), "opacity");
    assert_eq!(machine.stage(), TransitionStage::Entered);
    assert_eq!(count_of(&log, "after_leave"), 0, "a cancelled leave never completes");
    Ok(())
}

#[test]
fn test_cancelled_hook_rerequesting_hide_relaunches_the_leave() -> Result<()> {
    let scheduler = FrameScheduler::new();
    let element = MockElement::new(1);
    element.set_timing(TimingStyles::transition("0s", "0.1s"));
    let machine = TransitionMachine::new(
        TransitionDescriptor::new("fade"),
        TransitionHooks::new(),
        scheduler.clone(),
    );
    let log = hook_log();
    machine.set_hooks(
        TransitionHooks::new()
            .with_before_leave(log_hook(&log, "before_leave"))
            .with_leave_cancelled({
                let log = log.clone();
                let machine = machine.clone();
                move |_| {
                    log.borrow_mut().push("leave_cancelled");
                    machine.request_visible(false);
                }
            })
            .with_after_leave(log_hook(&log, "after_leave")),
    );

    machine.request_visible(true);
    machine.mount(element.handle())?; // first mount without appear: shown directly
    machine.request_visible(false);
    assert_eq!(machine.stage(), TransitionStage::Leaving);

    // pre-empt; the cancelled hook immediately asks to hide again
    machine.request_visible(true);
    assert_eq!(machine.stage(), TransitionStage::Leaving, "the hook's request wins");
    assert_eq!(element.classes(), vec!["fade-leave-from", "fade-leave-active"]);
    assert!(scheduler.has_pending_work(), "the relaunched leave keeps its swap pending");
    assert_eq!(logged(&log), vec!["before_leave", "leave_cancelled", "before_leave"]);

    scheduler.run_frame(0);
    scheduler.run_frame(16);
    machine.notify_transition_end(ElementId(1), "opacity");
    assert_eq!(machine.stage(), TransitionStage::Absent);
    assert!(element.is_detached(), "the re-requested leave runs to completion");
    assert_eq!(
        logged(&log),
        vec!["before_leave", "leave_cancelled", "before_leave", "after_leave"]
    );
    Ok(())
}

#[test]
fn test_cancelled_hook_rerequesting_show_relaunches_the_enter() -> Result<()> {
    let scheduler = FrameScheduler::new();
    let element = MockElement::new(1);
    element.set_timing(TimingStyles::transition("0s", "0.1s"));
    let machine = TransitionMachine::new(
        TransitionDescriptor::new("fade"),
        TransitionHooks::new(),
        scheduler.clone(),
    );
    let log = hook_log();
    machine.set_hooks(
        TransitionHooks::new()
            .with_before_enter(log_hook(&log, "before_enter"))
            .with_enter_cancelled({
                let log = log.clone();
                let machine = machine.clone();
                move |_| {
                    log.borrow_mut().push("enter_cancelled");
                    machine.request_visible(true);
                }
            })
            .with_after_enter(log_hook(&log, "after_enter")),
    );

    machine.mount(element.handle())?;
    machine.request_visible(true);
    assert_eq!(machine.stage(), TransitionStage::Entering { appearing: false });

    // pre-empt; the cancelled hook immediately asks to show again
    machine.request_visible(false);
    assert_eq!(
        machine.stage(),
        TransitionStage::Entering { appearing: false },
        "the hook's request wins"
    );
    assert_eq!(element.classes(), vec!["fade-enter-from", "fade-enter-active"]);
    assert_eq!(logged(&log), vec!["before_enter", "enter_cancelled", "before_enter"]);

    scheduler.run_frame(0);
    scheduler.run_frame(16);
    machine.notify_transition_end(ElementId(1), "opacity");
    assert_eq!(machine.stage(), TransitionStage::Entered);
    assert!(element.classes().is_empty());
    assert_eq!(
        logged(&log),
        vec!["before_enter", "enter_cancelled", "before_enter", "after_enter"]
    );
    Ok(())
}

#[test]
fn test_appear_defaults_to_enter_classes_and_hooks() -> Result<()> {
    let scheduler = FrameScheduler::new();
    let element = MockElement::new(1);
    let log = hook_log();
    let hooks = TransitionHooks::new()
        .with_before_enter(log_hook(&log, "before_enter"))
        .with_after_enter(log_hook(&log, "after_enter"));
    let machine = TransitionMachine::new(
        TransitionDescriptor::new("fade").with_appear(true),
        hooks,
        scheduler.clone(),
    );

    // visibility requested ahead of the mount: the first mount appears
    machine.request_visible(true);
    machine.mount(element.handle())?;
    assert_eq!(machine.stage(), TransitionStage::Entering { appearing: true });
    assert_eq!(element.classes(), vec!["fade-enter-from", "fade-enter-active"]);
    assert_eq!(logged(&log), vec!["before_enter"]);

    scheduler.run_frame(0);
    scheduler.run_frame(16);
    assert_eq!(machine.stage(), TransitionStage::Entered);
    assert_eq!(logged(&log), vec!["before_enter", "after_enter"]);
    Ok(())
}

#[test]
fn test_custom_appear_uses_appear_names_and_suppresses_enter_hooks() -> Result<()> {
    let scheduler = FrameScheduler::new();
    let element = MockElement::new(1);
    let log = hook_log();
    let hooks = TransitionHooks::new()
        .with_before_enter(log_hook(&log, "before_enter"))
        .with_before_appear(log_hook(&log, "before_appear"));
    let machine = TransitionMachine::new(
        TransitionDescriptor::new("fade").with_appear(true).with_custom_appear(true),
        hooks,
        scheduler.clone(),
    );

    machine.request_visible(true);
    machine.mount(element.handle())?;
    assert_eq!(element.classes(), vec!["fade-appear-from", "fade-appear-active"]);
    assert_eq!(logged(&log), vec!["before_appear"]);
    Ok(())
}

#[test]
fn test_first_mount_without_appear_shows_directly() -> Result<()> {
    let scheduler = FrameScheduler::new();
    let element = MockElement::new(1);
    element.set_timing(TimingStyles::transition("0s", "1s"));
    let log = hook_log();
    let hooks = TransitionHooks::new().with_before_enter(log_hook(&log, "before_enter"));
    let machine =
        TransitionMachine::new(TransitionDescriptor::new("fade"), hooks, scheduler.clone());

    machine.request_visible(true);
    machine.mount(element.handle())?;
    assert_eq!(machine.stage(), TransitionStage::Entered);
    assert!(element.classes().is_empty(), "no classes on a skipped first mount");
    assert!(logged(&log).is_empty(), "no hooks on a skipped first mount");
    assert!(!scheduler.has_pending_work());
    Ok(())
}

#[test]
fn test_timeout_fallback_settles_without_end_events() -> Result<()> {
    let scheduler = FrameScheduler::new();
    let element = MockElement::new(1);
    element.set_timing(TimingStyles::transition("0s", "0.1s"));
    let machine = TransitionMachine::new(
        TransitionDescriptor::new("fade"),
        TransitionHooks::new(),
        scheduler.clone(),
    );

    machine.mount(element.handle())?;
    machine.request_visible(true);
    scheduler.run_frame(0);
    scheduler.run_frame(16); // swap at t=16, deadline 16 + 100 + 1
    scheduler.run_frame(116);
    assert_eq!(machine.stage(), TransitionStage::Entering { appearing: false });
    scheduler.run_frame(117);
    assert_eq!(machine.stage(), TransitionStage::Entered);
    assert!(element.classes().is_empty());
    Ok(())
}

#[test]
fn test_zero_duration_settles_on_the_swap_frame() -> Result<()> {
    let scheduler = FrameScheduler::new();
    let element = MockElement::new(1);
    let machine = TransitionMachine::new(
        TransitionDescriptor::new("fade"),
        TransitionHooks::new(),
        scheduler.clone(),
    );

    machine.mount(element.handle())?;
    machine.request_visible(true);
    scheduler.run_frame(0);
    scheduler.run_frame(16);
    assert_eq!(machine.stage(), TransitionStage::Entered);
    assert!(element.classes().is_empty());
    assert!(!scheduler.has_pending_work(), "nothing to wait for without timed effects");
    Ok(())
}

#[test]
fn test_expected_kind_ignores_the_other_kinds_events() -> Result<()> {
    let scheduler = FrameScheduler::new();
    let element = MockElement::new(1);
    element.set_timing(TimingStyles {
        transition_delays: "0s".into(),
        transition_durations: "0.2s".into(),
        animation_delays: "0s".into(),
        animation_durations: "0.9s".into(),
    });
    let machine = TransitionMachine::new(
        TransitionDescriptor::new("fade").with_expected(EndKind::Animation),
        TransitionHooks::new(),
        scheduler.clone(),
    );

    machine.mount(element.handle())?;
    machine.request_visible(true);
    scheduler.run_frame(0);
    scheduler.run_frame(16);

    machine.notify_transition_end(ElementId(1), "opacity");
    assert_eq!(
        machine.stage(),
        TransitionStage::Entering { appearing: false },
        "transition events must not settle an animation wait"
    );
    machine.notify_animation_end(ElementId(1), "pulse");
    assert_eq!(machine.stage(), TransitionStage::Entered);
    Ok(())
}

#[test]
fn test_multiple_properties_need_that_many_end_events() -> Result<()> {
    let scheduler = FrameScheduler::new();
    let element = MockElement::new(1);
    element.set_timing(TimingStyles::transition("0s, 0s", "0.1s, 0.3s"));
    let machine = TransitionMachine::new(
        TransitionDescriptor::new("fade"),
        TransitionHooks::new(),
        scheduler.clone(),
    );

    machine.mount(element.handle())?;
    machine.request_visible(true);
    scheduler.run_frame(0);
    scheduler.run_frame(16);

    machine.notify_transition_end(ElementId(1), "opacity");
    assert_eq!(machine.stage(), TransitionStage::Entering { appearing: false });
    machine.notify_transition_end(ElementId(1), "transform");
    assert_eq!(machine.stage(), TransitionStage::Entered);
    Ok(())
}

#[test]
fn test_end_events_for_other_elements_are_ignored() -> Result<()> {
    let scheduler = FrameScheduler::new();
    let element = MockElement::new(1);
    element.set_timing(TimingStyles::transition("0s", "0.1s"));
    let machine = TransitionMachine::new(
        TransitionDescriptor::new("fade"),
        TransitionHooks::new(),
        scheduler.clone(),
    );

    machine.mount(element.handle())?;
    machine.request_visible(true);
    scheduler.run_frame(0);
    scheduler.run_frame(16);

    machine.notify_transition_end(ElementId(99), "opacity");
    assert_eq!(
        machine.stage(),
        TransitionStage::Entering { appearing: false },
        "a bubbled event from another element must not settle the phase"
    );
    Ok(())
}

#[test]
fn test_mounting_a_second_element_is_an_error() -> Result<()> {
    let scheduler = FrameScheduler::new();
    let first = MockElement::new(1);
    let second = MockElement::new(2);
    let machine = TransitionMachine::new(
        TransitionDescriptor::new("fade"),
        TransitionHooks::new(),
        scheduler.clone(),
    );

    machine.mount(first.handle())?;
    assert_eq!(
        machine.mount(second.handle()),
        Err(UsageError::AlreadyBound { current: ElementId(1) })
    );
    assert!(machine.mount(first.handle()).is_ok(), "re-mounting the same element is a no-op");
    Ok(())
}

#[test]
fn test_unmount_cancels_the_flight_and_unbinds() -> Result<()> {
    let scheduler = FrameScheduler::new();
    let element = MockElement::new(1);
    element.set_timing(TimingStyles::transition("0s", "1s"));
    let log = hook_log();
    let hooks = TransitionHooks::new().with_enter_cancelled(log_hook(&log, "enter_cancelled"));
    let machine =
        TransitionMachine::new(TransitionDescriptor::new("fade"), hooks, scheduler.clone());

    machine.mount(element.handle())?;
    machine.request_visible(true);
    scheduler.run_frame(0);
    scheduler.run_frame(16);

    machine.unmount();
    assert_eq!(logged(&log), vec!["enter_cancelled"]);
    assert!(element.classes().is_empty());
    assert_eq!(machine.stage(), TransitionStage::Absent);
    assert!(!machine.is_mounted());

    // pumping after the unmount must not resurrect anything
    scheduler.run_frame(32);
    scheduler.run_frame(48);
    assert!(element.classes().is_empty());
    Ok(())
}

#[test]
fn test_enter_after_detach_waits_for_a_remount() -> Result<()> {
    let scheduler = FrameScheduler::new();
    let element = MockElement::new(1);
    let machine = TransitionMachine::new(
        TransitionDescriptor::new("fade"),
        TransitionHooks::new(),
        scheduler.clone(),
    );

    machine.mount(element.handle())?;
    machine.request_visible(true);
    scheduler.run_frame(0);
    scheduler.run_frame(16);
    machine.request_visible(false);
    scheduler.run_frame(32);
    scheduler.run_frame(48);
    assert!(!machine.is_mounted());

    machine.request_visible(true);
    assert_eq!(machine.stage(), TransitionStage::Absent, "nothing to show yet");

    let replacement = MockElement::new(2);
    machine.mount(replacement.handle())?;
    assert_eq!(
        machine.stage(),
        TransitionStage::Entering { appearing: false },
        "a re-mount after a completed leave enters, it does not appear"
    );
    assert!(replacement.has_class("fade-enter-from"));
    Ok(())
}
