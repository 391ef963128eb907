//! Cooperative frame and timer scheduling.
//!
//! The engine owns no event loop. Hosts call [`FrameScheduler::run_frame`]
//! once per rendered frame with the current time in milliseconds; queued
//! frame callbacks and due timers run inside that call. Work queued while a
//! frame is running lands in the *next* frame, matching
//! request-animation-frame semantics — which is exactly what the class
//! swap relies on: a callback queued two frames ahead runs after the host
//! has committed the styles of the frame in between.
//!
//! Cloning a scheduler clones a handle to the same queue.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

/// Identifier for a scheduled timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(u64);

type Callback = Box<dyn FnOnce()>;

struct Timer {
    id: TimerId,
    deadline_ms: u64,
    callback: Callback,
}

#[derive(Default)]
struct SchedulerInner {
    frame_queue: VecDeque<Callback>,
    timers: Vec<Timer>,
    now_ms: u64,
    next_timer: u64,
}

/// Host-pumped queue of frame callbacks and millisecond timers.
#[derive(Clone, Default)]
pub struct FrameScheduler {
    inner: Rc<RefCell<SchedulerInner>>,
}

impl FrameScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a callback for the next frame pump.
    pub fn schedule_frame(&self, callback: impl FnOnce() + 'static) {
        self.inner.borrow_mut().frame_queue.push_back(Box::new(callback));
    }

    /// Queue a callback for the frame after next.
    ///
    /// One full rendered frame passes between scheduling and execution, so
    /// styles applied before the call are committed by the time it runs.
    pub fn schedule_next_frame(&self, callback: impl FnOnce() + 'static) {
        let chained = self.clone();
        self.schedule_frame(move || chained.schedule_frame(callback));
    }

    /// Schedule a callback `delay_ms` after the most recent frame time.
    pub fn schedule_timeout(&self, delay_ms: u64, callback: impl FnOnce() + 'static) -> TimerId {
        let mut inner = self.inner.borrow_mut();
        inner.next_timer += 1;
        let id = TimerId(inner.next_timer);
        let deadline_ms = inner.now_ms.saturating_add(delay_ms);
        inner.timers.push(Timer { id, deadline_ms, callback: Box::new(callback) });
        id
    }

    /// Drop a pending timer. Unknown or already-fired ids are ignored.
    pub fn cancel_timeout(&self, id: TimerId) {
        self.inner.borrow_mut().timers.retain(|timer| timer.id != id);
    }

    /// Run one frame: all previously queued frame callbacks, then every
    /// timer whose deadline is at or before `now_ms`.
    ///
    /// Both sets are snapshotted up front; callbacks scheduled during the
    /// pump wait for the next one. `now_ms` must not go backwards.
    pub fn run_frame(&self, now_ms: u64) {
        let callbacks = {
            let mut inner = self.inner.borrow_mut();
            inner.now_ms = now_ms;
            std::mem::take(&mut inner.frame_queue)
        };
        for callback in callbacks {
            callback();
        }

        let due = {
            let mut inner = self.inner.borrow_mut();
            let mut due = Vec::new();
            let mut remaining = Vec::with_capacity(inner.timers.len());
            for timer in inner.timers.drain(..) {
                if timer.deadline_ms <= now_ms {
                    due.push(timer);
                } else {
                    remaining.push(timer);
                }
            }
            inner.timers = remaining;
            due.sort_by_key(|timer| timer.deadline_ms);
            due
        };
        for timer in due {
            (timer.callback)();
        }
    }

    /// Whether any frame callback or timer is still queued.
    pub fn has_pending_work(&self) -> bool {
        let inner = self.inner.borrow();
        !inner.frame_queue.is_empty() || !inner.timers.is_empty()
    }

    /// Earliest timer deadline, for hosts that idle between frames.
    pub fn next_deadline_ms(&self) -> Option<u64> {
        self.inner.borrow().timers.iter().map(|timer| timer.deadline_ms).min()
    }
}

impl fmt::Debug for FrameScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("FrameScheduler")
            .field("frame_queue", &inner.frame_queue.len())
            .field("timers", &inner.timers.len())
            .field("now_ms", &inner.now_ms)
            .finish()
    }
}
