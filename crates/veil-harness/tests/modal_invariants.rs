#![forbid(unsafe_code)]

//! Property tests for the modal lifecycle and focus trap.
//!
//! # Invariants
//!
//! 1. **Containment**: once initial focus is applied, no sequence of Tab,
//!    Shift+Tab, or BackTab moves focus outside the dialog.
//! 2. **Single registration**: across any toggle sequence the page holds at
//!    most one listener, and scroll lock and listener track the open flag.
//! 3. **Idempotent reopen**: close then open looks exactly like a first open.
//! 4. **Bounded arena**: repeated open/close cycles reuse node slots.
//!
//! Run: `cargo test -p veil-harness --test modal_invariants`

use proptest::prelude::*;
use veil_core::{KeyEvent, Page};
use veil_harness::{
    Buttons, advance_ms, any_key, append, focus_within, focused_label, modal_with, nav_key,
    open_and_settle,
};
use veil_widgets::{ModalConfig, ModalPhase};

#[derive(Debug, Clone, Copy)]
enum Step {
    Toggle(bool),
    Advance(u64),
    Key(KeyEvent),
    SetEsc(bool),
}

fn step() -> impl Strategy<Value = Step> {
    prop_oneof![
        3 => any::<bool>().prop_map(Step::Toggle),
        2 => (0u64..400).prop_map(Step::Advance),
        2 => any_key().prop_map(Step::Key),
        1 => any::<bool>().prop_map(Step::SetEsc),
    ]
}

/// A page with two buttons in the body, outside any dialog.
fn page_with_surroundings() -> Page {
    let page = Page::new();
    for label in ["Before", "After"] {
        append(&page, page.body(), "button", &[], Some(label));
    }
    page
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #[test]
    fn tab_sequences_never_leave_the_dialog(
        count in 0usize..6,
        close_button in any::<bool>(),
        keys in prop::collection::vec(nav_key(), 0..40),
    ) {
        let page = page_with_surroundings();
        let config = ModalConfig::default().show_close_button(close_button);
        let (mut modal, _) = modal_with(&page, config, Buttons::numbered(count));
        open_and_settle(&mut modal);
        let dialog = modal.dialog().expect("dialog");

        for key in keys {
            page.dispatch_key(key);
            prop_assert!(page.active_element().is_some());
            prop_assert!(focus_within(&page, dialog), "focus escaped after {:?}", key);
        }
    }

    #[test]
    fn toggles_keep_registrations_in_sync(steps in prop::collection::vec(step(), 0..60)) {
        let page = page_with_surroundings();
        let (mut modal, _) = modal_with(&page, ModalConfig::default(), Buttons::numbered(2));
        for step in steps {
            match step {
                Step::Toggle(open) => modal.set_open(open),
                Step::Advance(ms) => {
                    advance_ms(&page, ms);
                }
                Step::Key(key) => {
                    page.dispatch_key(key);
                }
                Step::SetEsc(close) => {
                    let config = modal.current_config().clone().close_on_esc(close);
                    modal.set_config(config);
                }
            }
            let open = modal.is_open();
            prop_assert!(page.listener_count() <= 1);
            prop_assert_eq!(page.listener_count(), usize::from(open));
            prop_assert_eq!(page.is_scroll_locked(), open);
            prop_assert_eq!(page.scroll_holds(), usize::from(open));
            prop_assert!(page.pending_timers() <= 1);
            prop_assert_eq!(modal.dialog().is_some(), open);
            if !open {
                prop_assert_eq!(modal.phase(), ModalPhase::Closed);
                prop_assert_eq!(page.pending_timers(), 0);
            }
        }
    }
}

// =============================================================================
// Scenarios
// =============================================================================

#[test]
fn reopen_behaves_like_first_open() {
    let page = page_with_surroundings();
    let (mut modal, _) = modal_with(&page, ModalConfig::default(), Buttons::numbered(1));
    modal.set_open(true);
    let first = page.tree().outline(modal.overlay().expect("overlay"));
    advance_ms(&page, 300);
    let first_focus = focused_label(&page);

    modal.set_open(false);
    assert_eq!(page.listener_count(), 0);
    assert!(!page.is_scroll_locked());

    modal.set_open(true);
    assert_eq!(page.listener_count(), 1);
    assert_eq!(page.scroll_holds(), 1);
    let second = page.tree().outline(modal.overlay().expect("overlay"));
    assert_eq!(first, second);
    advance_ms(&page, 300);
    assert_eq!(focused_label(&page), first_focus);
}

#[test]
fn close_before_focus_fires_leaves_no_timer() {
    let page = page_with_surroundings();
    let outside = page.tree().children(page.body())[0];
    page.focus(outside);
    let (mut modal, _) = modal_with(&page, ModalConfig::default(), Buttons::numbered(2));
    modal.set_open(true);
    advance_ms(&page, 100);
    modal.set_open(false);
    assert_eq!(page.pending_timers(), 0);
    advance_ms(&page, 500);
    assert_eq!(page.active_element(), Some(outside));
}

#[test]
fn two_modals_share_the_scroll_lock() {
    let page = Page::new();
    let (mut first, _) = modal_with(&page, ModalConfig::default(), Buttons::default());
    let (mut second, _) = modal_with(&page, ModalConfig::default(), Buttons::default());
    first.set_open(true);
    second.set_open(true);
    assert_eq!(page.scroll_holds(), 2);
    first.set_open(false);
    assert!(page.is_scroll_locked());
    assert_eq!(
        page.attr(page.body(), "style").as_deref(),
        Some("overflow: hidden")
    );
    second.set_open(false);
    assert_eq!(
        page.attr(page.body(), "style").as_deref(),
        Some("overflow: unset")
    );
}

#[test]
fn open_close_cycles_reuse_node_slots() {
    let page = page_with_surroundings();
    let (mut modal, _) = modal_with(&page, ModalConfig::default(), Buttons::numbered(3));
    open_and_settle(&mut modal);
    modal.set_open(false);
    let slots = page.tree().slot_count();
    let live = page.tree().live_count();

    for _ in 0..20 {
        open_and_settle(&mut modal);
        modal.set_children(Buttons::numbered(3));
        modal.set_open(false);
    }
    assert_eq!(page.tree().slot_count(), slots);
    assert_eq!(page.tree().live_count(), live);
}
