#![forbid(unsafe_code)]

//! Focus trap: circular Tab navigation within the dialog.
//!
//! The trap only steps in at the edges. Tab on the last focusable element
//! wraps to the first, Shift+Tab on the first wraps to the last, and every
//! other Tab is left to the page's native navigation, which already moves
//! in document order within the dialog. Focus on the dialog itself, or on
//! an element inside it that is not in the set, wraps only when no set
//! member lies ahead in the direction of travel.
//!
//! # Invariants
//!
//! - The focusable set is recomputed on every query; content that changes
//!   while the dialog is open is picked up on the next Tab.
//! - With an empty set every Tab is suppressed, so focus stays put.
//!
//! # Failure Modes
//!
//! | Condition | Behavior |
//! |-----------|----------|
//! | Root detached or destroyed | `TrapOutcome::Ignored`, event untouched |
//! | Focus outside the dialog | `TrapOutcome::PassThrough` |

use veil_core::{KeyboardEvent, NodeId, Page};

/// Focusable elements under the dialog root, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FocusableSet {
    nodes: Vec<NodeId>,
}

impl FocusableSet {
    pub fn first(&self) -> Option<NodeId> {
        self.nodes.first().copied()
    }

    pub fn last(&self) -> Option<NodeId> {
        self.nodes.last().copied()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.iter().copied()
    }

    pub fn as_slice(&self) -> &[NodeId] {
        &self.nodes
    }
}

/// What the trap did with a keydown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrapOutcome {
    /// Not a Tab, or the root is gone.
    Ignored,
    /// Tab suppressed with nothing to focus.
    Suppressed,
    /// Tab suppressed and focus wrapped to this node.
    Wrapped(NodeId),
    /// Native navigation proceeds.
    PassThrough,
}

/// Focus trap bound to a dialog root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FocusTrap {
    root: NodeId,
}

impl FocusTrap {
    pub fn new(root: NodeId) -> Self {
        Self { root }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Current focusable set. Empty if the root is detached.
    pub fn focusable(&self, page: &Page) -> FocusableSet {
        FocusableSet {
            nodes: page.focusable_within(self.root),
        }
    }

    /// Apply the trap to a keydown.
    pub fn handle_key(&self, page: &Page, event: &mut KeyboardEvent) -> TrapOutcome {
        let key = *event.key();
        if !key.is_tab() || !page.is_connected(self.root) {
            return TrapOutcome::Ignored;
        }
        let set = self.focusable(page);
        let (Some(first), Some(last)) = (set.first(), set.last()) else {
            event.prevent_default();
            trace_event!(root = self.root.index(), "tab suppressed, nothing focusable");
            return TrapOutcome::Suppressed;
        };
        let backward = key.is_backward_tab();
        let target = match page.active_element() {
            Some(active) if set.contains(active) => {
                let edge = if backward { first } else { last };
                (active == edge).then_some(if backward { last } else { first })
            }
            Some(active) if page.tree().is_inclusive_ancestor(self.root, active) => {
                self.wrap_from_unlisted(page, &set, active, backward)
            }
            _ => None,
        };
        match target {
            Some(target) => {
                event.prevent_default();
                page.focus(target);
                trace_event!(
                    root = self.root.index(),
                    target = target.index(),
                    backward,
                    "focus wrapped"
                );
                TrapOutcome::Wrapped(target)
            }
            None => TrapOutcome::PassThrough,
        }
    }

    /// Wrap target for focus on the root or on an element outside the set:
    /// wrap only if no member lies ahead in the direction of travel.
    fn wrap_from_unlisted(
        &self,
        page: &Page,
        set: &FocusableSet,
        active: NodeId,
        backward: bool,
    ) -> Option<NodeId> {
        let order = page.tree().descendants(self.root);
        let pos = order.iter().position(|&id| id == active);
        let (before, after) = match pos {
            Some(pos) => (&order[..pos], &order[pos + 1..]),
            None => (&order[..0], &order[..]),
        };
        let (ahead, wrap) = if backward {
            (before, set.last())
        } else {
            (after, set.first())
        };
        if ahead.iter().any(|&id| set.contains(id)) {
            None
        } else {
            wrap
        }
    }

    /// Move focus to the first focusable element, or to the root when there
    /// is none. Returns the focused node; `None` if the root is detached.
    pub fn focus_initial(&self, page: &Page) -> Option<NodeId> {
        if !page.is_connected(self.root) {
            return None;
        }
        let target = self.focusable(page).first().unwrap_or(self.root);
        page.focus(target).then_some(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use veil_core::{KeyCode, KeyEvent, Modifiers};

    fn setup(buttons: usize) -> (Page, NodeId, Vec<NodeId>) {
        let page = Page::new();
        let body = page.body();
        let root = page.create_element("div");
        page.set_attr(root, "tabindex", "-1");
        page.append_child(body, root);
        let nodes = (0..buttons)
            .map(|_| {
                let b = page.create_element("button");
                page.append_child(root, b);
                b
            })
            .collect();
        (page, root, nodes)
    }

    fn tab(page: &Page, trap: &FocusTrap, shift: bool) -> (TrapOutcome, KeyboardEvent) {
        let key = if shift {
            KeyEvent::new(KeyCode::Tab).with_modifiers(Modifiers::SHIFT)
        } else {
            KeyEvent::new(KeyCode::Tab)
        };
        let mut event = KeyboardEvent::new(key);
        let outcome = trap.handle_key(page, &mut event);
        (outcome, event)
    }

    #[test]
    fn wraps_at_both_edges() {
        let (page, root, nodes) = setup(3);
        let trap = FocusTrap::new(root);
        page.focus(nodes[2]);
        let (outcome, event) = tab(&page, &trap, false);
        assert_eq!(outcome, TrapOutcome::Wrapped(nodes[0]));
        assert!(event.is_default_prevented());
        assert_eq!(page.active_element(), Some(nodes[0]));

        let (outcome, _) = tab(&page, &trap, true);
        assert_eq!(outcome, TrapOutcome::Wrapped(nodes[2]));
        assert_eq!(page.active_element(), Some(nodes[2]));
    }

    #[test]
    fn middle_positions_pass_through() {
        let (page, root, nodes) = setup(3);
        let trap = FocusTrap::new(root);
        page.focus(nodes[1]);
        let (outcome, event) = tab(&page, &trap, false);
        assert_eq!(outcome, TrapOutcome::PassThrough);
        assert!(!event.is_default_prevented());
        assert_eq!(page.active_element(), Some(nodes[1]));
    }

    #[test]
    fn single_element_stays_pinned() {
        let (page, root, nodes) = setup(1);
        let trap = FocusTrap::new(root);
        page.focus(nodes[0]);
        assert_eq!(tab(&page, &trap, false).0, TrapOutcome::Wrapped(nodes[0]));
        assert_eq!(tab(&page, &trap, true).0, TrapOutcome::Wrapped(nodes[0]));
        assert_eq!(page.active_element(), Some(nodes[0]));
    }

    #[test]
    fn empty_set_suppresses() {
        let (page, root, _) = setup(0);
        let trap = FocusTrap::new(root);
        page.focus(root);
        let (outcome, event) = tab(&page, &trap, false);
        assert_eq!(outcome, TrapOutcome::Suppressed);
        assert!(event.is_default_prevented());
        assert_eq!(page.active_element(), Some(root));
    }

    #[test]
    fn shift_tab_from_root_wraps_to_last() {
        let (page, root, nodes) = setup(2);
        let trap = FocusTrap::new(root);
        page.focus(root);
        assert_eq!(tab(&page, &trap, true).0, TrapOutcome::Wrapped(nodes[1]));
        page.focus(root);
        assert_eq!(tab(&page, &trap, false).0, TrapOutcome::PassThrough);
    }

    #[test]
    fn unlisted_element_after_last_wraps_forward() {
        let (page, root, nodes) = setup(2);
        let tail = page.create_element("span");
        page.set_attr(tail, "tabindex", "-1");
        page.append_child(root, tail);
        let trap = FocusTrap::new(root);
        page.focus(tail);
        assert_eq!(tab(&page, &trap, false).0, TrapOutcome::Wrapped(nodes[0]));
        page.focus(tail);
        assert_eq!(tab(&page, &trap, true).0, TrapOutcome::PassThrough);
    }

    #[test]
    fn back_tab_counts_as_shift_tab() {
        let (page, root, nodes) = setup(2);
        let trap = FocusTrap::new(root);
        page.focus(nodes[0]);
        let mut event = KeyboardEvent::new(KeyEvent::new(KeyCode::BackTab));
        assert_eq!(
            trap.handle_key(&page, &mut event),
            TrapOutcome::Wrapped(nodes[1])
        );
    }

    #[test]
    fn non_tab_and_detached_root_are_ignored() {
        let (page, root, nodes) = setup(2);
        let trap = FocusTrap::new(root);
        page.focus(nodes[1]);
        let mut event = KeyboardEvent::new(KeyEvent::new(KeyCode::Enter));
        assert_eq!(trap.handle_key(&page, &mut event), TrapOutcome::Ignored);

        page.tree_mut().detach(root);
        let (outcome, event) = tab(&page, &trap, false);
        assert_eq!(outcome, TrapOutcome::Ignored);
        assert!(!event.is_default_prevented());
        assert_eq!(trap.focus_initial(&page), None);
    }

    #[test]
    fn focus_initial_prefers_first_then_root() {
        let (page, root, nodes) = setup(2);
        let trap = FocusTrap::new(root);
        assert_eq!(trap.focus_initial(&page), Some(nodes[0]));

        let (page, root, _) = setup(0);
        let trap = FocusTrap::new(root);
        assert_eq!(trap.focus_initial(&page), Some(root));
        assert_eq!(page.active_element(), Some(root));
    }

    #[test]
    fn set_skips_negative_tabindex_and_disabled() {
        let (page, root, nodes) = setup(3);
        page.set_attr(nodes[0], "tabindex", "-1");
        page.set_attr(nodes[1], "disabled", "");
        let set = FocusTrap::new(root).focusable(&page);
        assert_eq!(set.as_slice(), &[nodes[2]]);
        assert!(!set.contains(root));
    }

    proptest! {
        #[test]
        fn only_edges_are_intercepted(count in 1usize..12, pos in 0usize..12, shift in any::<bool>()) {
            let pos = pos % count;
            let (page, root, nodes) = setup(count);
            let trap = FocusTrap::new(root);
            page.focus(nodes[pos]);
            let (outcome, event) = tab(&page, &trap, shift);
            let edge = if shift { 0 } else { count - 1 };
            if pos == edge {
                let target = if shift { nodes[count - 1] } else { nodes[0] };
                prop_assert_eq!(outcome, TrapOutcome::Wrapped(target));
                prop_assert!(event.is_default_prevented());
                prop_assert_eq!(page.active_element(), Some(target));
            } else {
                prop_assert_eq!(outcome, TrapOutcome::PassThrough);
                prop_assert!(!event.is_default_prevented());
                prop_assert_eq!(page.active_element(), Some(nodes[pos]));
            }
        }
    }
}
