#![forbid(unsafe_code)]

//! Host model for Veil.
//!
//! Veil's overlay logic needs a handful of host capabilities: a tree of
//! elements with attributes, a document-level keydown stream, bubbling click
//! handlers, a focus pointer, a page scroll lock, and delayed callbacks. This
//! crate provides a small deterministic implementation of all of them behind
//! [`Page`], so the overlay can run headless (tests, fuzzing, the demo) and a
//! real binding only has to mirror the same surface.
//!
//! # Architecture
//!
//! `Page` is a cheap `Rc` handle. Everything that must be released on
//! teardown is handed out as an RAII guard holding a `Weak` reference back
//! to the page:
//!
//! - [`ListenerGuard`] unregisters a keydown listener.
//! - [`ScrollLockGuard`] releases one hold on the scroll lock.
//! - [`TimerHandle`] cancels a pending timer.
//!
//! Dropping the page before its guards is fine: the guards become no-ops.

macro_rules! trace_event {
    ($($arg:tt)*) => {
        #[cfg(feature = "tracing")]
        tracing::trace!($($arg)*);
    };
}

pub mod event;
pub mod guard;
pub mod page;
pub mod timer;
pub mod tree;

pub use event::{ClickEvent, KeyCode, KeyEvent, KeyEventKind, KeyboardEvent, Modifiers};
pub use guard::{ListenerGuard, ListenerId, ScrollLockGuard};
pub use page::{ClickHandler, KeyListener, NavDirection, Page};
pub use timer::{Clock, ManualClock, SystemClock, TimerHandle, TimerId};
pub use tree::{Node, NodeId, NodeKind, Tree};
