#![forbid(unsafe_code)]

//! Scripted walkthrough of a modal session.
//!
//! ```text
//! veil-demo [CONFIG.toml|CONFIG.json]
//! VEIL_LOG=veil=trace veil-demo
//! ```
//!
//! Opens a confirmation dialog over a small page, tabs through it, dismisses
//! it with Escape, and prints a JSON summary of every step to stdout.

use std::cell::Cell;
use std::process::ExitCode;
use std::rc::Rc;

use tracing_subscriber::EnvFilter;
use veil_core::{KeyCode, Modifiers, NodeId, Page};
use veil_widgets::{Modal, ModalConfig};

const LOG_ENV: &str = "VEIL_LOG";

fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new("veil_widgets=debug,veil_core=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config() -> Result<ModalConfig, veil_widgets::ConfigError> {
    match std::env::args_os().nth(1) {
        Some(path) => ModalConfig::load(path),
        None => Ok(ModalConfig::default()),
    }
}

fn append(page: &Page, parent: NodeId, tag: &str, attrs: &[(&str, &str)], label: &str) -> NodeId {
    let node = page.create_element(tag);
    for (name, value) in attrs {
        page.set_attr(node, name, *value);
    }
    let text = page.create_text(label);
    page.append_child(node, text);
    page.append_child(parent, node);
    node
}

fn confirm_dialog(page: &Page, parent: NodeId) {
    append(page, parent, "h2", &[("id", "modal-title")], "Discard draft?");
    append(
        page,
        parent,
        "p",
        &[("id", "modal-description")],
        "Unsaved changes will be lost.",
    );
    append(page, parent, "button", &[], "Keep editing");
    append(page, parent, "button", &[], "Discard");
}

fn focused(page: &Page) -> String {
    page.active_element()
        .map_or_else(|| "<body>".to_owned(), |id| page.tree().text_content(id))
}

fn report(page: &Page, modal: &Modal, step: &str) {
    let line = serde_json::json!({
        "step": step,
        "phase": format!("{:?}", modal.phase()),
        "focused": focused(page),
        "listeners": page.listener_count(),
        "scroll_locked": page.is_scroll_locked(),
        "pending_timers": page.pending_timers(),
    });
    println!("{line}");
}

fn main() -> ExitCode {
    init_logging();
    let config = match load_config() {
        Ok(config) => config,
        Err(err) => {
            tracing::error!(error = %err, "failed to load modal config");
            eprintln!("veil-demo: {err}");
            return ExitCode::FAILURE;
        }
    };

    let page = Page::new();
    let trigger = append(&page, page.body(), "button", &[("id", "open")], "Open");
    page.focus(trigger);

    let close_requested = Rc::new(Cell::new(false));
    let flag = Rc::clone(&close_requested);
    let mut modal = Modal::new(&page, move || flag.set(true))
        .config(config.clone())
        .children(confirm_dialog);

    report(&page, &modal, "initial");
    modal.set_open(true);
    report(&page, &modal, "opened");
    page.advance(config.fade_duration);
    page.run_due_timers();
    report(&page, &modal, "settled");

    let focusables = modal
        .dialog()
        .map_or(0, |dialog| page.focusable_within(dialog).len());
    for step in 0..=focusables {
        page.press(KeyCode::Tab);
        report(&page, &modal, &format!("tab {}", step + 1));
    }
    page.press_with(KeyCode::Tab, Modifiers::SHIFT);
    report(&page, &modal, "shift+tab");

    page.press(KeyCode::Escape);
    if close_requested.get() {
        modal.set_open(false);
    }
    report(&page, &modal, "escape");
    tracing::info!(
        closed = !modal.is_open(),
        close_on_esc = config.close_on_esc,
        "walkthrough finished"
    );
    ExitCode::SUCCESS
}
