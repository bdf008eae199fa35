#![forbid(unsafe_code)]

//! RAII guards for page-wide resources.
//!
//! # Lifecycle Guarantees
//!
//! 1. **Release on drop** - every guard gives back exactly what it took when
//!    dropped, whether by scope exit, `?`, or panic unwinding (unless
//!    `panic = "abort"`).
//!
//! 2. **Release is idempotent** - explicit release followed by drop releases
//!    once.
//!
//! 3. **Page may go first** - guards hold a `Weak` reference; if the page is
//!    already gone, release is a no-op.

use std::fmt;
use std::rc::Weak;

use crate::page::PageInner;

/// Identifier of a registered keydown listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub(crate) u64);

/// Keeps a keydown listener registered. Dropping it unregisters.
#[must_use = "dropping the guard unregisters the listener immediately"]
pub struct ListenerGuard {
    page: Weak<PageInner>,
    id: ListenerId,
}

impl ListenerGuard {
    pub(crate) fn new(page: Weak<PageInner>, id: ListenerId) -> Self {
        Self { page, id }
    }

    pub fn id(&self) -> ListenerId {
        self.id
    }

    /// Whether the listener is still in the page's registry.
    pub fn is_registered(&self) -> bool {
        self.page
            .upgrade()
            .is_some_and(|inner| inner.has_listener(self.id))
    }
}

impl fmt::Debug for ListenerGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerGuard")
            .field("id", &self.id)
            .field("registered", &self.is_registered())
            .finish()
    }
}

impl Drop for ListenerGuard {
    fn drop(&mut self) {
        if let Some(inner) = self.page.upgrade() {
            inner.remove_listener(self.id);
        }
    }
}

/// One hold on the page scroll lock.
///
/// The lock is reference counted: the page stays unscrollable while at
/// least one guard is held.
#[must_use = "dropping the guard releases the scroll lock immediately"]
pub struct ScrollLockGuard {
    page: Weak<PageInner>,
    held: bool,
}

impl ScrollLockGuard {
    pub(crate) fn new(page: Weak<PageInner>) -> Self {
        Self { page, held: true }
    }

    pub fn is_held(&self) -> bool {
        self.held
    }

    /// Give the hold back now. Later calls and the eventual drop do nothing.
    pub fn release(&mut self) {
        if !self.held {
            return;
        }
        self.held = false;
        if let Some(inner) = self.page.upgrade() {
            inner.release_scroll();
        }
    }
}

impl fmt::Debug for ScrollLockGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScrollLockGuard")
            .field("held", &self.held)
            .finish()
    }
}

impl Drop for ScrollLockGuard {
    fn drop(&mut self) {
        self.release();
    }
}
