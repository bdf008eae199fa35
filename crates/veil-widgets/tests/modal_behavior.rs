#![forbid(unsafe_code)]

//! Integration tests: modal rendering, dismissal, and focus trap.
//!
//! # Invariants
//!
//! 1. **Closed is inert**: no content, no listener, no scroll lock.
//! 2. **One channel**: every dismissal goes through the close callback and
//!    never changes the open state by itself.
//! 3. **Trap**: Tab and Shift+Tab wrap inside the dialog.
//!
//! Run: `cargo test -p veil-widgets --test modal_behavior`

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use veil_core::{KeyCode, KeyEvent, KeyEventKind, Modifiers, NodeId, Page};
use veil_widgets::{Modal, ModalConfig, ModalPhase, text};

// =============================================================================
// Test Utilities
// =============================================================================

fn counter() -> (Rc<Cell<usize>>, impl Fn() + 'static) {
    let count = Rc::new(Cell::new(0));
    let c = Rc::clone(&count);
    (count, move || c.set(c.get() + 1))
}

fn content_div(page: &Page, parent: NodeId) {
    let div = page.create_element("div");
    let t = page.create_text("Modal Content");
    page.append_child(div, t);
    page.append_child(parent, div);
}

fn two_buttons(page: &Page, parent: NodeId) {
    for label in ["Button 1", "Button 2"] {
        let b = page.create_element("button");
        let t = page.create_text(label);
        page.append_child(b, t);
        page.append_child(parent, b);
    }
}

fn open_modal(page: &Page, config: ModalConfig) -> (Modal, Rc<Cell<usize>>) {
    let (count, on_close) = counter();
    let mut modal = Modal::new(page, on_close)
        .config(config)
        .children(content_div);
    modal.set_open(true);
    (modal, count)
}

fn by_text(page: &Page, text: &str) -> NodeId {
    page.tree()
        .find_by_text(text)
        .unwrap_or_else(|| panic!("no element with text {text:?}"))
}

// =============================================================================
// Rendering
// =============================================================================

#[test]
fn renders_dialog_when_open() {
    let page = Page::new();
    let (modal, _) = open_modal(&page, ModalConfig::default());
    let tree = page.tree();
    assert!(tree.find_by_text("Modal Content").is_some());
    let dialog = tree.find_by_attr("role", "dialog").expect("dialog");
    assert_eq!(Some(dialog), modal.dialog());
    assert_eq!(tree.attr(dialog, "aria-modal"), Some("true"));
}

#[test]
fn renders_nothing_when_closed() {
    let page = Page::new();
    let (count, on_close) = counter();
    let mut modal = Modal::new(&page, on_close).children(content_div);
    modal.set_open(false);
    assert!(page.tree().find_by_text("Modal Content").is_none());
    assert!(page.tree().find_by_attr("aria-label", "Close Modal").is_none());
    assert_eq!(page.listener_count(), 0);
    page.press(KeyCode::Escape);
    assert_eq!(count.get(), 0);
}

#[test]
fn overlay_is_last_child_of_body() {
    let page = Page::new();
    let host = page.create_element("main");
    page.append_child(page.body(), host);
    let (modal, _) = open_modal(&page, ModalConfig::default());
    let overlay = modal.overlay().expect("overlay");
    assert_eq!(page.tree().parent(overlay), Some(page.body()));
    assert_eq!(page.tree().children(page.body()), &[host, overlay]);
}

#[test]
fn empty_aria_references_are_omitted() {
    let page = Page::new();
    let config = ModalConfig::default()
        .aria_labelledby(Some(""))
        .aria_describedby(None::<String>);
    let (modal, _) = open_modal(&page, config);
    let dialog = modal.dialog().expect("dialog");
    assert_eq!(page.attr(dialog, "aria-labelledby"), None);
    assert_eq!(page.attr(dialog, "aria-describedby"), None);
}

#[test]
fn non_empty_aria_references_pass_through_unchanged() {
    let page = Page::new();
    let config = ModalConfig::default()
        .aria_labelledby(Some(" heading "))
        .aria_describedby(Some("  "));
    let (modal, _) = open_modal(&page, config);
    let dialog = modal.dialog().expect("dialog");
    assert_eq!(
        page.attr(dialog, "aria-labelledby").as_deref(),
        Some(" heading ")
    );
    assert_eq!(page.attr(dialog, "aria-describedby").as_deref(), Some("  "));
}

#[test]
fn custom_classes_and_duration_are_applied() {
    let page = Page::new();
    let config = ModalConfig::default()
        .overlay_class("backdrop-dark")
        .modal_class("wide")
        .fade_duration(Duration::from_millis(120));
    let (modal, _) = open_modal(&page, config);
    let overlay = modal.overlay().expect("overlay");
    let dialog = modal.dialog().expect("dialog");
    assert_eq!(
        page.attr(overlay, "class").as_deref(),
        Some("modal-overlay visible backdrop-dark")
    );
    assert_eq!(
        page.attr(dialog, "class").as_deref(),
        Some("modal-content visible wide")
    );
    assert_eq!(
        page.attr(overlay, "style").as_deref(),
        Some("transition-duration: 120ms")
    );
}

#[test]
fn hidden_close_button_is_not_rendered() {
    let page = Page::new();
    let (modal, _) = open_modal(&page, ModalConfig::default().show_close_button(false));
    assert!(modal.close_button().is_none());
    assert!(page.tree().find_by_attr("aria-label", "Close Modal").is_none());
}

#[test]
fn spinner_slot_replaces_children() {
    let page = Page::new();
    let (count, on_close) = counter();
    let mut modal = Modal::new(&page, on_close)
        .config(ModalConfig::default().show_spinner(true))
        .children(content_div)
        .spinner(text("Please wait"));
    modal.set_open(true);
    assert!(page.tree().find_by_text("Modal Content").is_none());
    assert!(page.tree().text_content(modal.dialog().expect("dialog")).contains("Please wait"));
    assert_eq!(count.get(), 0);
}

// =============================================================================
// Dismissal
// =============================================================================

#[test]
fn close_button_calls_on_close() {
    let page = Page::new();
    let (_modal, count) = open_modal(&page, ModalConfig::default());
    let button = page
        .tree()
        .find_by_attr("aria-label", "Close Modal")
        .expect("close button");
    page.click(button);
    assert_eq!(count.get(), 1);
}

#[test]
fn clicking_close_icon_bubbles_to_close_button() {
    let page = Page::new();
    let (modal, count) = open_modal(&page, ModalConfig::default());
    let button = modal.close_button().expect("close button");
    let icon = page.tree().children(button)[0];
    page.click(icon);
    assert_eq!(count.get(), 1);
}

#[test]
fn overlay_click_calls_on_close() {
    let page = Page::new();
    let (modal, count) = open_modal(&page, ModalConfig::default());
    let dialog = modal.dialog().expect("dialog");
    let overlay = page.tree().parent(dialog).expect("overlay");
    page.click(overlay);
    assert_eq!(count.get(), 1);
}

#[test]
fn content_click_does_not_close() {
    let page = Page::new();
    let (modal, count) = open_modal(&page, ModalConfig::default());
    page.click(by_text(&page, "Modal Content"));
    page.click(modal.dialog().expect("dialog"));
    assert_eq!(count.get(), 0);
}

#[test]
fn overlay_click_ignored_when_disabled() {
    let page = Page::new();
    let (modal, count) = open_modal(
        &page,
        ModalConfig::default().close_on_overlay_click(false),
    );
    page.click(modal.overlay().expect("overlay"));
    assert_eq!(count.get(), 0);
}

#[test]
fn escape_calls_on_close_once_per_press() {
    let page = Page::new();
    let (modal, count) = open_modal(&page, ModalConfig::default());
    let event = page.press(KeyCode::Escape);
    assert_eq!(count.get(), 1);
    assert!(!event.is_default_prevented());
    page.dispatch_key(KeyEvent::new(KeyCode::Escape).with_kind(KeyEventKind::Release));
    assert_eq!(count.get(), 1);
    page.press(KeyCode::Escape);
    assert_eq!(count.get(), 2);
    assert!(modal.is_open());
}

#[test]
fn escape_ignored_when_disabled() {
    let page = Page::new();
    let (_modal, count) = open_modal(&page, ModalConfig::default().close_on_esc(false));
    page.press(KeyCode::Escape);
    assert_eq!(count.get(), 0);
}

#[test]
fn host_can_close_from_the_callback() {
    let page = Page::new();
    let slot: Rc<std::cell::RefCell<Option<Modal>>> = Rc::new(std::cell::RefCell::new(None));
    let host = Rc::clone(&slot);
    let modal = Modal::new(&page, move || {
        if let Some(modal) = host.borrow_mut().as_mut() {
            modal.set_open(false);
        }
    })
    .children(two_buttons);
    *slot.borrow_mut() = Some(modal);
    if let Some(modal) = slot.borrow_mut().as_mut() {
        modal.set_open(true);
    }
    page.press(KeyCode::Escape);
    assert!(slot.borrow().as_ref().is_some_and(|m| !m.is_open()));
    assert_eq!(page.listener_count(), 0);
    assert!(!page.is_scroll_locked());
    assert!(page.tree().children(page.body()).is_empty());
    page.advance(Duration::from_secs(1));
    assert_eq!(page.active_element(), None);
}

// =============================================================================
// Focus trap
// =============================================================================

#[test]
fn traps_focus_within_the_modal() {
    let page = Page::new();
    let (_count, on_close) = counter();
    let mut modal = Modal::new(&page, on_close).children(two_buttons);
    modal.set_open(true);

    let close = modal.close_button().expect("close button");
    let button1 = by_text(&page, "Button 1");
    let button2 = by_text(&page, "Button 2");

    assert!(page.focus(close));
    page.press(KeyCode::Tab);
    assert_eq!(page.active_element(), Some(button1));
    page.press(KeyCode::Tab);
    assert_eq!(page.active_element(), Some(button2));
    page.press(KeyCode::Tab);
    assert_eq!(page.active_element(), Some(close));
    page.press_with(KeyCode::Tab, Modifiers::SHIFT);
    assert_eq!(page.active_element(), Some(button2));
}

#[test]
fn initial_focus_waits_for_fade_duration() {
    let page = Page::new();
    let trigger = page.create_element("button");
    page.append_child(page.body(), trigger);
    page.focus(trigger);
    let (modal, _) = open_modal(&page, ModalConfig::default());
    assert_eq!(modal.phase(), ModalPhase::Opening);
    page.advance(Duration::from_millis(299));
    assert_eq!(page.active_element(), Some(trigger));
    page.advance(Duration::from_millis(1));
    assert_eq!(page.active_element(), modal.close_button());
    assert_eq!(modal.phase(), ModalPhase::Open);
}

#[test]
fn empty_dialog_focuses_root_and_holds_tab() {
    let page = Page::new();
    let (count, on_close) = counter();
    let mut modal = Modal::new(&page, on_close)
        .config(ModalConfig::default().show_close_button(false))
        .children(content_div);
    modal.set_open(true);
    page.advance(Duration::from_millis(300));
    let dialog = modal.dialog().expect("dialog");
    assert_eq!(page.active_element(), Some(dialog));
    for _ in 0..3 {
        assert!(page.press(KeyCode::Tab).is_default_prevented());
        assert_eq!(page.active_element(), Some(dialog));
        page.press(KeyCode::BackTab);
        assert_eq!(page.active_element(), Some(dialog));
    }
    assert_eq!(count.get(), 0);
}

#[test]
fn content_added_while_open_joins_the_cycle() {
    let page = Page::new();
    let (_count, on_close) = counter();
    let mut modal = Modal::new(&page, on_close).children(two_buttons);
    modal.set_open(true);
    page.advance(Duration::from_millis(300));
    let dialog = modal.dialog().expect("dialog");
    let extra = page.create_element("input");
    page.append_child(dialog, extra);
    let button2 = by_text(&page, "Button 2");
    page.focus(button2);
    page.press(KeyCode::Tab);
    assert_eq!(page.active_element(), Some(extra));
    page.press(KeyCode::Tab);
    assert_eq!(page.active_element(), modal.close_button());
}

#[test]
fn negative_tabindex_and_disabled_are_skipped() {
    let page = Page::new();
    let (_count, on_close) = counter();
    let mut modal = Modal::new(&page, on_close).children(|page: &Page, parent: NodeId| {
        let skipped = page.create_element("button");
        page.set_attr(skipped, "tabindex", "-1");
        page.append_child(parent, skipped);
        let disabled = page.create_element("input");
        page.set_attr(disabled, "disabled", "");
        page.append_child(parent, disabled);
        let link = page.create_element("a");
        page.set_attr(link, "href", "#more");
        page.append_child(parent, link);
    });
    modal.set_open(true);
    page.advance(Duration::from_millis(300));
    let close = modal.close_button().expect("close button");
    let link = page.tree().find_by_attr("href", "#more").expect("link");
    assert_eq!(page.active_element(), Some(close));
    page.press(KeyCode::Tab);
    assert_eq!(page.active_element(), Some(link));
    page.press(KeyCode::Tab);
    assert_eq!(page.active_element(), Some(close));
}
