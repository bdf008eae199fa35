#![forbid(unsafe_code)]

//! The page: tree, focus, event dispatch, scroll lock, and timers.
//!
//! # Dispatch Model
//!
//! - **Keydown** goes to every document listener in registration order. A
//!   listener unregistered during dispatch does not run afterwards in the
//!   same dispatch. If no listener called `prevent_default`, Tab and
//!   Shift+Tab then run native sequential navigation.
//! - **Click** bubbles from the target through its ancestors up to the body,
//!   calling each node's click handler with the original target and the
//!   handler's own node. The path is fixed when dispatch starts.
//!
//! # Native Sequential Navigation
//!
//! Candidates are the connected elements the page's [`FocusPolicy`] marks as
//! focusable, in document order. Navigation starts from the active element's
//! position in the document (focused or not, so a `tabindex="-1"` container
//! still anchors the search). Moving past either end leaves the document:
//! the active element becomes `None` (the body).
//!
//! # Failure Modes
//!
//! | Operation | Cause | Behavior |
//! |-----------|-------|----------|
//! | `focus` | Node dead, detached, or not focusable | Returns `false`, focus unchanged |
//! | `click` | Target detached | No handlers run |
//! | `remove_node` | Removes the active element | Active becomes `None` |
//!
//! Holding a borrow from [`Page::tree`] across a dispatch or timer pump
//! panics, like any `RefCell` double borrow. Use the convenience methods
//! from handlers.

use std::cell::{Cell, Ref, RefCell, RefMut};
use std::fmt;
use std::rc::{Rc, Weak};
use std::time::Duration;

use ahash::AHashMap;
use veil_a11y::{FocusPolicy, is_programmatically_focusable};

use crate::event::{ClickEvent, KeyCode, KeyEvent, KeyEventKind, KeyboardEvent, Modifiers};
use crate::guard::{ListenerGuard, ListenerId, ScrollLockGuard};
use crate::timer::{Clock, ManualClock, TimerHandle, TimerId, TimerQueue};
use crate::tree::{NodeId, Tree};

/// Document-level keydown listener.
pub type KeyListener = Rc<dyn Fn(&Page, &mut KeyboardEvent)>;

/// Per-node click handler.
pub type ClickHandler = Rc<dyn Fn(&Page, &ClickEvent)>;

/// Direction of sequential navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NavDirection {
    Forward,
    Backward,
}

pub(crate) struct PageInner {
    tree: RefCell<Tree>,
    listeners: RefCell<Vec<(ListenerId, KeyListener)>>,
    next_listener: Cell<u64>,
    click_handlers: RefCell<AHashMap<NodeId, ClickHandler>>,
    active: Cell<Option<NodeId>>,
    scroll_holds: Cell<usize>,
    pub(crate) timers: RefCell<TimerQueue>,
    clock: Box<dyn Clock>,
    policy: FocusPolicy,
}

impl PageInner {
    pub(crate) fn has_listener(&self, id: ListenerId) -> bool {
        self.listeners.borrow().iter().any(|(lid, _)| *lid == id)
    }

    pub(crate) fn remove_listener(&self, id: ListenerId) -> bool {
        // Drop the closure after the borrow ends; it may own guards whose
        // own drop re-enters the registry.
        let removed = {
            let mut listeners = self.listeners.borrow_mut();
            listeners
                .iter()
                .position(|(lid, _)| *lid == id)
                .map(|pos| listeners.remove(pos))
        };
        let found = removed.is_some();
        drop(removed);
        if found {
            trace_event!(listener = id.0, "keydown listener removed");
        }
        found
    }

    pub(crate) fn release_scroll(&self) {
        let holds = self.scroll_holds.get();
        if holds == 0 {
            return;
        }
        self.scroll_holds.set(holds - 1);
        if holds == 1 {
            self.set_body_overflow("unset");
            trace_event!("page scroll unlocked");
        }
    }

    pub(crate) fn cancel_timer(&self, id: TimerId) {
        let callback = self.timers.borrow_mut().cancel(id);
        if callback.is_some() {
            trace_event!(timer = ?id, "timer cancelled");
        }
    }

    fn set_body_overflow(&self, value: &str) {
        // Mirror only; the hold counter is authoritative. Skip if a caller
        // is holding the tree.
        if let Ok(mut tree) = self.tree.try_borrow_mut() {
            let body = tree.body();
            tree.set_attr(body, "style", format!("overflow: {value}"));
        }
    }
}

/// Shared handle to a page. Clones refer to the same page.
#[derive(Clone)]
pub struct Page {
    inner: Rc<PageInner>,
}

impl Default for Page {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Page")
            .field("listeners", &self.listener_count())
            .field("active", &self.active_element())
            .field("scroll_locked", &self.is_scroll_locked())
            .field("pending_timers", &self.pending_timers())
            .finish()
    }
}

impl Page {
    /// A page with a [`ManualClock`] and the interactive focus policy.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(ManualClock::new(), FocusPolicy::interactive())
    }

    /// A page driven by `clock`.
    #[must_use]
    pub fn with_clock(clock: impl Clock + 'static) -> Self {
        Self::with_config(clock, FocusPolicy::interactive())
    }

    #[must_use]
    pub fn with_config(clock: impl Clock + 'static, policy: FocusPolicy) -> Self {
        Self {
            inner: Rc::new(PageInner {
                tree: RefCell::new(Tree::new()),
                listeners: RefCell::new(Vec::new()),
                next_listener: Cell::new(0),
                click_handlers: RefCell::new(AHashMap::new()),
                active: Cell::new(None),
                scroll_holds: Cell::new(0),
                timers: RefCell::new(TimerQueue::default()),
                clock: Box::new(clock),
                policy,
            }),
        }
    }

    fn weak(&self) -> Weak<PageInner> {
        Rc::downgrade(&self.inner)
    }

    /// Whether two handles refer to the same page.
    pub fn ptr_eq(&self, other: &Page) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn focus_policy(&self) -> &FocusPolicy {
        &self.inner.policy
    }

    // -- tree ---------------------------------------------------------------

    /// Borrow the tree.
    pub fn tree(&self) -> Ref<'_, Tree> {
        self.inner.tree.borrow()
    }

    /// Borrow the tree mutably. Prefer [`Page::remove_node`] for removals so
    /// focus and click handlers stay consistent.
    pub fn tree_mut(&self) -> RefMut<'_, Tree> {
        self.inner.tree.borrow_mut()
    }

    pub fn body(&self) -> NodeId {
        self.tree().body()
    }

    pub fn create_element(&self, tag: &str) -> NodeId {
        self.tree_mut().create_element(tag)
    }

    pub fn create_text(&self, text: impl Into<String>) -> NodeId {
        self.tree_mut().create_text(text)
    }

    pub fn append_child(&self, parent: NodeId, child: NodeId) -> bool {
        self.tree_mut().append_child(parent, child)
    }

    pub fn set_attr(&self, id: NodeId, name: &str, value: impl Into<String>) -> bool {
        self.tree_mut().set_attr(id, name, value)
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<String> {
        self.tree().attr(id, name).map(str::to_owned)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.tree().contains(id)
    }

    pub fn is_connected(&self, id: NodeId) -> bool {
        self.tree().is_connected(id)
    }

    /// Destroy a node and its subtree, dropping their click handlers and
    /// blurring if the active element was inside.
    pub fn remove_node(&self, id: NodeId) -> usize {
        let removed = self.tree_mut().remove(id);
        if removed.is_empty() {
            return 0;
        }
        let dropped: Vec<ClickHandler> = {
            let mut handlers = self.inner.click_handlers.borrow_mut();
            removed.iter().filter_map(|dead| handlers.remove(dead)).collect()
        };
        drop(dropped);
        if let Some(active) = self.inner.active.get()
            && removed.contains(&active)
        {
            self.inner.active.set(None);
        }
        removed.len()
    }

    /// Connected focusable descendants of `root`, in document order.
    pub fn focusable_within(&self, root: NodeId) -> Vec<NodeId> {
        let tree = self.tree();
        if !tree.is_connected(root) {
            return Vec::new();
        }
        tree.focusable_descendants(root, &self.inner.policy)
    }

    // -- focus --------------------------------------------------------------

    /// The focused element, or `None` when focus is on the body.
    pub fn active_element(&self) -> Option<NodeId> {
        self.inner.active.get()
    }

    /// Move focus to `id`. Refused for dead, detached, or unfocusable nodes.
    pub fn focus(&self, id: NodeId) -> bool {
        let ok = {
            let tree = self.tree();
            tree.is_connected(id)
                && tree
                    .get(id)
                    .is_some_and(|n| n.is_element() && is_programmatically_focusable(n))
        };
        if ok {
            self.inner.active.set(Some(id));
            trace_event!(node = id.index(), "focus moved");
        }
        ok
    }

    pub fn blur(&self) {
        self.inner.active.set(None);
    }

    /// Run native sequential navigation and return the new active element.
    pub fn navigate(&self, direction: NavDirection) -> Option<NodeId> {
        let next = {
            let tree = self.tree();
            let order = tree.descendants(tree.body());
            let candidate = |id: &&NodeId| {
                tree.get(**id)
                    .is_some_and(|n| n.is_element() && self.inner.policy.is_focusable(n))
            };
            let anchor = self
                .active_element()
                .and_then(|active| order.iter().position(|&id| id == active));
            let found = match (direction, anchor) {
                (NavDirection::Forward, None) => order.iter().find(candidate),
                (NavDirection::Backward, None) => order.iter().rev().find(candidate),
                (NavDirection::Forward, Some(pos)) => order[pos + 1..].iter().find(candidate),
                (NavDirection::Backward, Some(pos)) => order[..pos].iter().rev().find(candidate),
            };
            found.copied()
        };
        self.inner.active.set(next);
        next
    }

    // -- keyboard -----------------------------------------------------------

    /// Register a document-level keydown listener.
    pub fn add_key_listener(
        &self,
        listener: impl Fn(&Page, &mut KeyboardEvent) + 'static,
    ) -> ListenerGuard {
        let id = ListenerId(self.inner.next_listener.get());
        self.inner.next_listener.set(id.0 + 1);
        self.inner
            .listeners
            .borrow_mut()
            .push((id, Rc::new(listener)));
        trace_event!(listener = id.0, "keydown listener added");
        ListenerGuard::new(self.weak(), id)
    }

    pub fn listener_count(&self) -> usize {
        self.inner.listeners.borrow().len()
    }

    /// Dispatch a keydown and run the default action unless prevented.
    ///
    /// Release events are not keydowns and are returned untouched.
    pub fn dispatch_key(&self, key: KeyEvent) -> KeyboardEvent {
        let mut event = KeyboardEvent::new(key);
        if key.kind == KeyEventKind::Release {
            return event;
        }
        let ids: Vec<ListenerId> = self
            .inner
            .listeners
            .borrow()
            .iter()
            .map(|(id, _)| *id)
            .collect();
        for id in ids {
            let listener = self
                .inner
                .listeners
                .borrow()
                .iter()
                .find(|(lid, _)| *lid == id)
                .map(|(_, listener)| Rc::clone(listener));
            if let Some(listener) = listener {
                listener(self, &mut event);
            }
        }
        if !event.is_default_prevented() && key.is_tab() {
            let direction = if key.is_backward_tab() {
                NavDirection::Backward
            } else {
                NavDirection::Forward
            };
            self.navigate(direction);
        }
        event
    }

    /// Press and dispatch a key without modifiers.
    pub fn press(&self, code: KeyCode) -> KeyboardEvent {
        self.dispatch_key(KeyEvent::new(code))
    }

    pub fn press_with(&self, code: KeyCode, modifiers: Modifiers) -> KeyboardEvent {
        self.dispatch_key(KeyEvent::new(code).with_modifiers(modifiers))
    }

    // -- pointer ------------------------------------------------------------

    /// Install (or replace) the click handler of `node`.
    pub fn set_click_handler(
        &self,
        node: NodeId,
        handler: impl Fn(&Page, &ClickEvent) + 'static,
    ) -> bool {
        if !self.contains(node) {
            return false;
        }
        let previous = self
            .inner
            .click_handlers
            .borrow_mut()
            .insert(node, Rc::new(handler));
        drop(previous);
        true
    }

    pub fn clear_click_handler(&self, node: NodeId) -> bool {
        let handler = self.inner.click_handlers.borrow_mut().remove(&node);
        handler.is_some()
    }

    /// Click `target` and bubble. Returns how many handlers ran.
    pub fn click(&self, target: NodeId) -> usize {
        let path: Vec<NodeId> = {
            let tree = self.tree();
            if !tree.is_connected(target) {
                return 0;
            }
            std::iter::successors(Some(target), |&id| tree.parent(id)).collect()
        };
        let mut ran = 0;
        for node in path {
            let handler = self.inner.click_handlers.borrow().get(&node).cloned();
            if let Some(handler) = handler {
                handler(
                    self,
                    &ClickEvent {
                        target,
                        current_target: node,
                    },
                );
                ran += 1;
            }
        }
        ran
    }

    // -- scroll lock --------------------------------------------------------

    /// Take a hold on the page scroll lock.
    pub fn lock_scroll(&self) -> ScrollLockGuard {
        let holds = self.inner.scroll_holds.get();
        self.inner.scroll_holds.set(holds + 1);
        if holds == 0 {
            self.inner.set_body_overflow("hidden");
            trace_event!("page scroll locked");
        }
        ScrollLockGuard::new(self.weak())
    }

    pub fn is_scroll_locked(&self) -> bool {
        self.inner.scroll_holds.get() > 0
    }

    pub fn scroll_holds(&self) -> usize {
        self.inner.scroll_holds.get()
    }

    // -- timers -------------------------------------------------------------

    /// Current clock reading.
    pub fn now(&self) -> Duration {
        self.inner.clock.now()
    }

    /// Schedule `callback` to run once `delay` has elapsed.
    ///
    /// Dropping the returned handle cancels the timer.
    pub fn set_timeout(
        &self,
        delay: Duration,
        callback: impl FnOnce(&Page) + 'static,
    ) -> TimerHandle {
        let deadline = self.now().saturating_add(delay);
        let id = self
            .inner
            .timers
            .borrow_mut()
            .schedule(deadline, Box::new(callback));
        trace_event!(timer = ?id, delay_ms = delay.as_millis() as u64, "timer scheduled");
        TimerHandle::new(self.weak(), id)
    }

    pub fn pending_timers(&self) -> usize {
        self.inner.timers.borrow().len()
    }

    /// Deadline of the earliest pending timer.
    pub fn next_deadline(&self) -> Option<Duration> {
        self.inner.timers.borrow().next_deadline()
    }

    /// Fire every timer due at the current clock reading. Returns how many
    /// fired.
    pub fn run_due_timers(&self) -> usize {
        let watermark = self.inner.timers.borrow().watermark();
        let mut fired = 0;
        loop {
            let now = self.now();
            let due = self.inner.timers.borrow_mut().pop_due(now, watermark);
            let Some((_id, callback)) = due else {
                break;
            };
            trace_event!(timer = ?_id, "timer fired");
            callback(self);
            fired += 1;
        }
        fired
    }

    /// Advance the clock by `by` (manual clocks only) and fire due timers.
    pub fn advance(&self, by: Duration) -> usize {
        self.inner.clock.advance(by);
        self.run_due_timers()
    }
}
