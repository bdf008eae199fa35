#![forbid(unsafe_code)]

//! Test harness for Veil.
//!
//! Shared fixtures for integration tests:
//!
//! - page builders with a trigger button outside any dialog,
//! - ready-made dialog content slots,
//! - a close-callback counter,
//! - tree outline snapshots (`assert_snapshot!`),
//! - a `tracing` layer that captures events for assertions,
//! - proptest strategies for key scripts.
//!
//! Run `BLESS=1 cargo test --package veil-harness` to create/update
//! snapshots.

use std::cell::Cell;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use proptest::prelude::*;
use tracing::field::{Field, Visit};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::{Layer, Registry};
use veil_a11y::aria::{Role, attr};
use veil_core::{KeyCode, KeyEvent, KeyboardEvent, Modifiers, NodeId, Page};
use veil_widgets::{Modal, ModalConfig, Render};

// ============================================================================
// Pages and content
// ============================================================================

/// A page with a focused `<button id="trigger">Open</button>` in the body.
pub fn page_with_trigger() -> (Page, NodeId) {
    let page = Page::new();
    let trigger = append(&page, page.body(), "button", &[("id", "trigger")], Some("Open"));
    page.focus(trigger);
    (page, trigger)
}

/// Append an element, optionally with a single text child.
pub fn append(
    page: &Page,
    parent: NodeId,
    tag: &str,
    attrs: &[(&str, &str)],
    text: Option<&str>,
) -> NodeId {
    let node = page.create_element(tag);
    for (name, value) in attrs {
        page.set_attr(node, name, *value);
    }
    if let Some(text) = text {
        let t = page.create_text(text);
        page.append_child(node, t);
    }
    page.append_child(parent, node);
    node
}

/// Dialog content: one labelled button per entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Buttons(pub Vec<String>);

impl Buttons {
    pub fn new<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(labels.into_iter().map(Into::into).collect())
    }

    /// `count` buttons labelled `B0`, `B1`, ...
    pub fn numbered(count: usize) -> Self {
        Self((0..count).map(|i| format!("B{i}")).collect())
    }
}

impl Render for Buttons {
    fn render(&self, page: &Page, parent: NodeId) {
        for label in &self.0 {
            append(page, parent, "button", &[], Some(label.as_str()));
        }
    }
}

/// Dialog content with the default ARIA targets: a title and a description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Titled {
    pub title: String,
    pub body: String,
}

impl Titled {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
        }
    }
}

impl Render for Titled {
    fn render(&self, page: &Page, parent: NodeId) {
        append(page, parent, "h2", &[("id", "modal-title")], Some(self.title.as_str()));
        append(
            page,
            parent,
            "p",
            &[("id", "modal-description")],
            Some(self.body.as_str()),
        );
    }
}

// ============================================================================
// Modal fixtures
// ============================================================================

/// Counts close-callback invocations.
#[derive(Debug, Clone, Default)]
pub struct CloseCounter(Rc<Cell<usize>>);

impl CloseCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn callback(&self) -> impl Fn() + 'static {
        let count = Rc::clone(&self.0);
        move || count.set(count.get() + 1)
    }

    pub fn count(&self) -> usize {
        self.0.get()
    }
}

/// A modal on `page` with `config` and `content`, plus its close counter.
pub fn modal_with(
    page: &Page,
    config: ModalConfig,
    content: impl Render + 'static,
) -> (Modal, CloseCounter) {
    let closes = CloseCounter::new();
    let modal = Modal::new(page, closes.callback())
        .config(config)
        .children(content);
    (modal, closes)
}

/// Open `modal` and pump timers until the initial focus has been applied.
pub fn open_and_settle(modal: &mut Modal) {
    modal.set_open(true);
    settle(modal.page(), modal.current_config());
}

/// Advance the page clock past the fade duration of `config`.
pub fn settle(page: &Page, config: &ModalConfig) {
    page.advance(config.fade_duration);
    page.run_due_timers();
}

/// Advance by `ms` milliseconds.
pub fn advance_ms(page: &Page, ms: u64) -> usize {
    page.advance(Duration::from_millis(ms))
}

pub fn tab(page: &Page) -> KeyboardEvent {
    page.press(KeyCode::Tab)
}

pub fn shift_tab(page: &Page) -> KeyboardEvent {
    page.press_with(KeyCode::Tab, Modifiers::SHIFT)
}

/// Text of the focused element, or `"<body>"`.
pub fn focused_label(page: &Page) -> String {
    match page.active_element() {
        Some(id) => page.tree().text_content(id),
        None => "<body>".to_owned(),
    }
}

/// The node's role if assistive technology would treat it as a modal
/// surface: a recognised dialog role plus `aria-modal="true"`.
pub fn modal_surface_role(page: &Page, node: NodeId) -> Option<Role> {
    let role = Role::parse(&page.attr(node, attr::ROLE)?)?;
    let modal = page.attr(node, attr::ARIA_MODAL).as_deref() == Some("true");
    (modal && role.is_modal_surface()).then_some(role)
}

/// Whether the active element is the dialog or inside it.
pub fn focus_within(page: &Page, dialog: NodeId) -> bool {
    page.active_element()
        .is_some_and(|active| page.tree().is_inclusive_ancestor(dialog, active))
}

// ============================================================================
// Snapshots
// ============================================================================

/// Directory holding `.snap` files for the calling crate.
pub fn snapshot_dir(manifest_dir: &str) -> PathBuf {
    Path::new(manifest_dir).join("tests").join("snapshots")
}

/// Compare `actual` with the stored snapshot `name`, or write it when
/// `BLESS` is set.
///
/// # Panics
///
/// On mismatch or when the snapshot is missing and `BLESS` is unset.
pub fn assert_outline_snapshot(name: &str, actual: &str, manifest_dir: &str) {
    let path = snapshot_dir(manifest_dir).join(format!("{name}.snap"));
    let bless = std::env::var_os("BLESS").is_some_and(|v| v != "0");
    if bless {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create snapshot dir");
        }
        std::fs::write(&path, actual).expect("write snapshot");
        return;
    }
    let expected = match std::fs::read_to_string(&path) {
        Ok(text) => text,
        Err(err) => panic!(
            "snapshot {name} unreadable at {}: {err}; rerun with BLESS=1",
            path.display()
        ),
    };
    let expected = expected.replace("\r\n", "\n");
    assert_eq!(
        actual.trim_end(),
        expected.trim_end(),
        "snapshot {name} mismatch ({})",
        path.display()
    );
}

/// Assert that the outline of a subtree matches a stored snapshot.
///
/// ```ignore
/// assert_snapshot!("modal_default", &page, overlay);
/// ```
#[macro_export]
macro_rules! assert_snapshot {
    ($name:expr, $page:expr, $root:expr) => {{
        let outline = $page.tree().outline($root);
        $crate::assert_outline_snapshot($name, &outline, env!("CARGO_MANIFEST_DIR"));
    }};
}

// ============================================================================
// Log capture
// ============================================================================

/// One captured `tracing` event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedEvent {
    pub level: tracing::Level,
    pub target: String,
    pub message: String,
    pub fields: BTreeMap<String, String>,
}

impl CapturedEvent {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }
}

#[derive(Default)]
struct EventVisitor {
    message: String,
    fields: BTreeMap<String, String>,
}

impl Visit for EventVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_owned();
        } else {
            self.fields.insert(field.name().to_owned(), value.to_owned());
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        let text = format!("{value:?}");
        if field.name() == "message" {
            self.message = text;
        } else {
            self.fields.insert(field.name().to_owned(), text);
        }
    }
}

/// Layer that records every event it sees.
#[derive(Debug, Clone, Default)]
pub struct CaptureLayer {
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

impl CaptureLayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Events captured so far.
    pub fn events(&self) -> Vec<CapturedEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl<S: tracing::Subscriber> Layer<S> for CaptureLayer {
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = EventVisitor::default();
        event.record(&mut visitor);
        let meta = event.metadata();
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(CapturedEvent {
                level: *meta.level(),
                target: meta.target().to_owned(),
                message: visitor.message,
                fields: visitor.fields,
            });
    }
}

/// Run `f` with a capturing subscriber installed on this thread.
pub fn capture_logs<R>(f: impl FnOnce() -> R) -> (R, Vec<CapturedEvent>) {
    let layer = CaptureLayer::new();
    let subscriber = Registry::default().with(layer.clone());
    let result = tracing::subscriber::with_default(subscriber, f);
    (result, layer.events())
}

/// Emit a JSONL log entry (for CI artifact review).
pub fn log_jsonl(test: &str, check: &str, passed: bool, notes: &str) {
    let line = serde_json::json!({
        "test": test,
        "check": check,
        "passed": passed,
        "notes": notes,
    });
    eprintln!("{line}");
}

// ============================================================================
// Strategies
// ============================================================================

/// Tab, Shift+Tab, or BackTab.
pub fn nav_key() -> impl Strategy<Value = KeyEvent> {
    prop_oneof![
        Just(KeyEvent::new(KeyCode::Tab)),
        Just(KeyEvent::new(KeyCode::Tab).with_modifiers(Modifiers::SHIFT)),
        Just(KeyEvent::new(KeyCode::BackTab)),
    ]
}

/// Navigation keys mixed with Escape, Enter and letters.
pub fn any_key() -> impl Strategy<Value = KeyEvent> {
    prop_oneof![
        4 => nav_key(),
        1 => Just(KeyEvent::new(KeyCode::Escape)),
        1 => Just(KeyEvent::new(KeyCode::Enter)),
        1 => proptest::char::range('a', 'z').prop_map(|c| KeyEvent::new(KeyCode::Char(c))),
    ]
}
