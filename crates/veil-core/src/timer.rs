#![forbid(unsafe_code)]

//! Clocks and the host-driven timer queue.
//!
//! Timers never fire on their own. The host pumps them with
//! [`Page::run_due_timers`] (or [`Page::advance`] on a [`ManualClock`]), so
//! tests can step time deterministically and a real host can drive the pump
//! from its event loop.
//!
//! # Invariants
//!
//! 1. Due timers fire in deadline order; ties fire in scheduling order.
//! 2. A cancelled timer never fires, even if it was already due.
//! 3. A single pump only fires timers that existed when the pump started, so
//!    a callback that reschedules itself with a zero delay cannot spin the
//!    pump forever.

use std::cell::Cell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::{Rc, Weak};
use std::time::Duration;

use ahash::AHashMap;

use crate::page::{Page, PageInner};

/// Source of "now" for the timer queue, as an offset from the clock's epoch.
pub trait Clock {
    fn now(&self) -> Duration;

    /// Move the clock forward. Clocks that follow real time ignore this and
    /// return `false`.
    fn advance(&self, _by: Duration) -> bool {
        false
    }
}

/// A clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<Duration>>,
}

impl ManualClock {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, now: Duration) {
        self.now.set(now);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.now.get()
    }

    fn advance(&self, by: Duration) -> bool {
        self.now.set(self.now.get().saturating_add(by));
        true
    }
}

/// Wall-clock time since construction.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    epoch: web_time::Instant,
}

impl SystemClock {
    #[must_use]
    pub fn new() -> Self {
        Self {
            epoch: web_time::Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.epoch.elapsed()
    }
}

/// Identifier of a scheduled timer. Monotonic; doubles as scheduling order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

pub(crate) type TimerCallback = Box<dyn FnOnce(&Page)>;

#[derive(Default)]
pub(crate) struct TimerQueue {
    next_id: u64,
    due: BTreeMap<(Duration, TimerId), TimerCallback>,
    deadlines: AHashMap<TimerId, Duration>,
}

impl TimerQueue {
    pub(crate) fn schedule(&mut self, deadline: Duration, callback: TimerCallback) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.due.insert((deadline, id), callback);
        self.deadlines.insert(id, deadline);
        id
    }

    /// Unschedule a timer, handing its callback back so the caller can drop
    /// it outside any borrow.
    pub(crate) fn cancel(&mut self, id: TimerId) -> Option<TimerCallback> {
        let deadline = self.deadlines.remove(&id)?;
        self.due.remove(&(deadline, id))
    }

    pub(crate) fn is_pending(&self, id: TimerId) -> bool {
        self.deadlines.contains_key(&id)
    }

    pub(crate) fn len(&self) -> usize {
        self.deadlines.len()
    }

    /// Id the next scheduled timer will get.
    pub(crate) fn watermark(&self) -> TimerId {
        TimerId(self.next_id)
    }

    pub(crate) fn next_deadline(&self) -> Option<Duration> {
        self.due.keys().next().map(|(deadline, _)| *deadline)
    }

    /// Remove the earliest timer due at `now` that was scheduled before
    /// `watermark`.
    pub(crate) fn pop_due(
        &mut self,
        now: Duration,
        watermark: TimerId,
    ) -> Option<(TimerId, TimerCallback)> {
        let key = self
            .due
            .keys()
            .take_while(|(deadline, _)| *deadline <= now)
            .find(|(_, id)| *id < watermark)
            .copied()?;
        self.deadlines.remove(&key.1);
        self.due.remove(&key).map(|callback| (key.1, callback))
    }
}

/// Handle to a scheduled timer. Dropping it cancels the timer.
pub struct TimerHandle {
    page: Weak<PageInner>,
    id: TimerId,
}

impl TimerHandle {
    pub(crate) fn new(page: Weak<PageInner>, id: TimerId) -> Self {
        Self { page, id }
    }

    pub fn id(&self) -> TimerId {
        self.id
    }

    /// Whether the timer is still waiting to fire.
    pub fn is_pending(&self) -> bool {
        self.page
            .upgrade()
            .is_some_and(|inner| inner.timers.borrow().is_pending(self.id))
    }

    /// Cancel explicitly. Equivalent to dropping the handle.
    pub fn cancel(self) {
        drop(self);
    }
}

impl fmt::Debug for TimerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimerHandle")
            .field("id", &self.id)
            .field("pending", &self.is_pending())
            .finish()
    }
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        if let Some(inner) = self.page.upgrade() {
            inner.cancel_timer(self.id);
        }
    }
}
