#![forbid(unsafe_code)]

//! One open-to-close lifetime of a modal.
//!
//! A [`ModalSession`] owns everything the modal takes from the page while it
//! is open: the document keydown listener, a scroll-lock hold, and the
//! deferred initial-focus timer.
//!
//! # Lifecycle Guarantees
//!
//! 1. **Ordered setup** - `begin` registers the listener, then locks scroll,
//!    then schedules initial focus after the fade duration.
//!
//! 2. **Cleanup on drop** - dropping the session cancels the focus timer
//!    before anything else, then unregisters the listener and releases the
//!    scroll hold. This runs on every exit path, including unwinding.
//!
//! 3. **One listener** - a session registers exactly one listener and
//!    removes exactly that one.
//!
//! # Failure Modes
//!
//! | Condition | Behavior |
//! |-----------|----------|
//! | Dialog root gone when focus fires | Focus step skipped, phase stays `Opening` |
//! | Session dropped before focus fires | Timer cancelled, callback never runs |

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use veil_core::{ListenerGuard, NodeId, Page, ScrollLockGuard, TimerHandle};

use super::config::ModalConfig;
use super::dismiss::DismissPolicy;
use super::trap::FocusTrap;

/// Host callback asking for the modal to close.
pub type CloseCallback = Rc<dyn Fn()>;

/// Observable phase of a modal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ModalPhase {
    /// Nothing mounted, nothing registered.
    #[default]
    Closed,
    /// Mounted with listener and scroll lock in place; initial focus pending.
    Opening,
    /// Initial focus applied.
    Open,
}

impl ModalPhase {
    pub fn is_open(self) -> bool {
        !matches!(self, Self::Closed)
    }
}

/// Resources held while a modal is open.
pub struct ModalSession {
    root: NodeId,
    phase: Rc<Cell<ModalPhase>>,
    focus_timer: Option<TimerHandle>,
    listener: Option<ListenerGuard>,
    scroll: Option<ScrollLockGuard>,
}

impl ModalSession {
    /// Start a session for the dialog at `root`.
    ///
    /// The keydown listener captures `close_on_esc` now; a different value
    /// needs a new session.
    pub fn begin(page: &Page, root: NodeId, config: &ModalConfig, on_close: CloseCallback) -> Self {
        let trap = FocusTrap::new(root);
        let policy = DismissPolicy::from_config(config);
        let listener = page.add_key_listener(move |page, event| {
            if let Some(_reason) = policy.on_key(event.key()) {
                debug_event!(reason = _reason.as_str(), "modal dismissal requested");
                on_close();
            }
            trap.handle_key(page, event);
        });
        let scroll = page.lock_scroll();

        let phase = Rc::new(Cell::new(ModalPhase::Opening));
        let focus_phase = Rc::clone(&phase);
        let focus_timer = page.set_timeout(config.fade_duration, move |page| {
            if let Some(_focused) = trap.focus_initial(page) {
                focus_phase.set(ModalPhase::Open);
                trace_event!(node = _focused.index(), "initial focus applied");
            }
        });

        debug_event!(
            root = root.index(),
            fade_ms = u64::try_from(config.fade_duration.as_millis()).unwrap_or(u64::MAX),
            close_on_esc = config.close_on_esc,
            "modal session opened"
        );

        Self {
            root,
            phase,
            focus_timer: Some(focus_timer),
            listener: Some(listener),
            scroll: Some(scroll),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn phase(&self) -> ModalPhase {
        self.phase.get()
    }

    /// Whether the initial-focus step has yet to run.
    pub fn is_focus_pending(&self) -> bool {
        self.focus_timer
            .as_ref()
            .is_some_and(TimerHandle::is_pending)
    }

    /// Whether this session's listener is still registered.
    pub fn is_listening(&self) -> bool {
        self.listener
            .as_ref()
            .is_some_and(ListenerGuard::is_registered)
    }

    /// Whether this session holds a scroll lock.
    pub fn holds_scroll_lock(&self) -> bool {
        self.scroll.as_ref().is_some_and(ScrollLockGuard::is_held)
    }
}

impl fmt::Debug for ModalSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModalSession")
            .field("root", &self.root)
            .field("phase", &self.phase.get())
            .field("focus_pending", &self.is_focus_pending())
            .field("listening", &self.is_listening())
            .finish()
    }
}

impl Drop for ModalSession {
    fn drop(&mut self) {
        // Timer before listener and scroll hold.
        drop(self.focus_timer.take());
        drop(self.listener.take());
        drop(self.scroll.take());
        self.phase.set(ModalPhase::Closed);
        debug_event!(root = self.root.index(), "modal session closed");
    }
}
