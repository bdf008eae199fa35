#![no_main]

//! Random key, click, toggle, and content sequences against a modal.
//!
//! Checks after every action:
//! - at most one listener, and exactly one while open,
//! - scroll lock held iff open,
//! - Tab from inside the dialog never leaves it.

use std::time::Duration;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use veil_core::{KeyCode, KeyEvent, Modifiers, NodeId, Page};
use veil_widgets::{Modal, ModalConfig};

#[derive(Debug, Arbitrary)]
enum Action {
    Toggle(bool),
    Advance(u16),
    Tab { shift: bool },
    BackTab,
    Escape,
    ClickOverlay,
    ClickDialog,
    SetCloseButton(bool),
    SetEsc(bool),
    Content(u8),
}

#[derive(Debug, Arbitrary)]
struct Input {
    buttons: u8,
    fade_ms: u16,
    actions: Vec<Action>,
}

fn content(count: u8) -> impl Fn(&Page, NodeId) + 'static {
    move |page: &Page, parent: NodeId| {
        for i in 0..count % 8 {
            let tag = if i % 3 == 2 { "input" } else { "button" };
            let node = page.create_element(tag);
            page.append_child(parent, node);
        }
    }
}

fuzz_target!(|input: Input| {
    let page = Page::new();
    let outside = page.create_element("button");
    page.append_child(page.body(), outside);

    let fade = Duration::from_millis(u64::from(input.fade_ms % 1000));
    let config = ModalConfig::default().fade_duration(fade);
    let mut modal = Modal::new(&page, || {})
        .config(config)
        .children(content(input.buttons));

    for action in input.actions.into_iter().take(256) {
        let was_inside = focus_inside(&page, &modal);
        let mut tabbed = false;
        match action {
            Action::Toggle(open) => modal.set_open(open),
            Action::Advance(ms) => {
                page.advance(Duration::from_millis(u64::from(ms)));
            }
            Action::Tab { shift } => {
                let mods = if shift { Modifiers::SHIFT } else { Modifiers::empty() };
                page.press_with(KeyCode::Tab, mods);
                tabbed = true;
            }
            Action::BackTab => {
                page.dispatch_key(KeyEvent::new(KeyCode::BackTab));
                tabbed = true;
            }
            Action::Escape => {
                page.press(KeyCode::Escape);
            }
            Action::ClickOverlay => {
                if let Some(overlay) = modal.overlay() {
                    page.click(overlay);
                }
            }
            Action::ClickDialog => {
                if let Some(dialog) = modal.dialog() {
                    page.click(dialog);
                }
            }
            Action::SetCloseButton(show) => {
                let next = modal.current_config().clone().show_close_button(show);
                modal.set_config(next);
            }
            Action::SetEsc(close) => {
                let next = modal.current_config().clone().close_on_esc(close);
                modal.set_config(next);
            }
            Action::Content(count) => modal.set_children(content(count)),
        }

        let open = modal.is_open();
        assert_eq!(page.listener_count(), usize::from(open));
        assert_eq!(page.is_scroll_locked(), open);
        if tabbed && was_inside {
            assert!(focus_inside(&page, &modal), "tab left the dialog");
        }
    }
});

fn focus_inside(page: &Page, modal: &Modal) -> bool {
    match (modal.dialog(), page.active_element()) {
        (Some(dialog), Some(active)) => page.tree().is_inclusive_ancestor(dialog, active),
        _ => false,
    }
}
