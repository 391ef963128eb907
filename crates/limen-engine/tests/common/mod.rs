#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use limen_core::{ElementId, Rect, TimingStyles};
use limen_engine::{ElementHandle, HostElement};

/// Recording fake for one host element.
pub struct MockElement {
    id: ElementId,
    classes: RefCell<Vec<String>>,
    display: RefCell<String>,
    bounds: Cell<Rect>,
    timing: RefCell<TimingStyles>,
    translation: Cell<Option<(f32, f32)>>,
    last_translation: Cell<Option<(f32, f32)>>,
    detached: Cell<bool>,
    layout_flushes: Cell<u32>,
}

impl MockElement {
    pub fn new(id: u64) -> Rc<Self> {
        Rc::new(Self {
            id: ElementId(id),
            classes: RefCell::new(Vec::new()),
            display: RefCell::new(String::new()),
            bounds: Cell::new(Rect::default()),
            timing: RefCell::new(TimingStyles::default()),
            translation: Cell::new(None),
            last_translation: Cell::new(None),
            detached: Cell::new(false),
            layout_flushes: Cell::new(0),
        })
    }

    pub fn handle(self: &Rc<Self>) -> ElementHandle {
        self.clone()
    }

    pub fn set_timing(&self, timing: TimingStyles) {
        *self.timing.borrow_mut() = timing;
    }

    pub fn place(&self, left: f32, top: f32) {
        self.bounds.set(Rect::new(left, top, 100.0, 20.0));
    }

    pub fn classes(&self) -> Vec<String> {
        self.classes.borrow().clone()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.borrow().iter().any(|c| c == class)
    }

    pub fn display(&self) -> String {
        self.display.borrow().clone()
    }

    pub fn translation(&self) -> Option<(f32, f32)> {
        self.translation.get()
    }

    /// Last translation applied, surviving the clear that plays a move.
    pub fn last_translation(&self) -> Option<(f32, f32)> {
        self.last_translation.get()
    }

    pub fn is_detached(&self) -> bool {
        self.detached.get()
    }

    pub fn layout_flushes(&self) -> u32 {
        self.layout_flushes.get()
    }
}

impl HostElement for MockElement {
    fn id(&self) -> ElementId {
        self.id
    }

    fn add_class(&self, class: &str) {
        let mut classes = self.classes.borrow_mut();
        if !classes.iter().any(|c| c == class) {
            classes.push(class.to_string());
        }
    }

    fn remove_class(&self, class: &str) {
        self.classes.borrow_mut().retain(|c| c != class);
    }

    fn inline_display(&self) -> String {
        self.display.borrow().clone()
    }

    fn set_inline_display(&self, value: &str) {
        *self.display.borrow_mut() = value.to_string();
    }

    fn bounding_box(&self) -> Rect {
        self.bounds.get()
    }

    fn set_translation(&self, dx: f32, dy: f32) {
        self.translation.set(Some((dx, dy)));
        self.last_translation.set(Some((dx, dy)));
    }

    fn clear_translation(&self) {
        self.translation.set(None);
    }

    fn flush_layout(&self) {
        self.layout_flushes.set(self.layout_flushes.get() + 1);
    }

    fn timing_styles(&self) -> TimingStyles {
        self.timing.borrow().clone()
    }

    fn detach(&self) {
        self.detached.set(true);
    }
}

/// Shared hook-call journal.
pub type HookLog = Rc<RefCell<Vec<&'static str>>>;

pub fn hook_log() -> HookLog {
    Rc::new(RefCell::new(Vec::new()))
}

/// A hook closure that records its firing under `name`.
pub fn log_hook(log: &HookLog, name: &'static str) -> impl Fn(&ElementHandle) + 'static {
    let log = log.clone();
    move |_| log.borrow_mut().push(name)
}

pub fn logged(log: &HookLog) -> Vec<&'static str> {
    log.borrow().clone()
}

pub fn count_of(log: &HookLog, name: &str) -> usize {
    log.borrow().iter().filter(|entry| **entry == name).count()
}
