#![forbid(unsafe_code)]

//! Modal container: portal mount, overlay, dialog, and session control.
//!
//! While open the modal renders:
//! 1) an overlay appended as the last child of the page body, then
//! 2) the dialog element inside it, holding the optional close button and
//!    either the children or the spinner slot.
//!
//! The host owns the open flag. The modal reports dismissals through the
//! close callback and otherwise does nothing until [`Modal::set_open`] is
//! called.

use std::fmt;
use std::rc::Rc;

use veil_a11y::aria::{self, Role, attr};
use veil_core::{NodeId, Page};

use super::config::ModalConfig;
use super::dismiss::DismissPolicy;
use super::session::{CloseCallback, ModalPhase, ModalSession};
use crate::{CloseIcon, Render, Spinner, element};

/// Class on the overlay element.
pub const OVERLAY_CLASS: &str = "modal-overlay";
/// Class on the dialog element.
pub const CONTENT_CLASS: &str = "modal-content";
/// Class added to both while mounted.
pub const VISIBLE_CLASS: &str = "visible";
/// Class on the close button.
pub const CLOSE_BUTTON_CLASS: &str = "modal-close-btn";
/// Accessible name of the close button.
pub const CLOSE_LABEL: &str = "Close Modal";

/// Nodes owned by a mounted modal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Mount {
    overlay: NodeId,
    dialog: NodeId,
}

/// Accessible overlay dialog.
///
/// Invariants:
/// - At most one session exists at a time; while open there is exactly one
///   keydown listener from this modal and one scroll-lock hold.
/// - Closed means nothing mounted and nothing registered.
///
/// Failure modes:
/// - If the host removes the overlay behind the modal's back, the trap and
///   the focus step become no-ops until the modal is closed.
pub struct Modal {
    page: Page,
    on_close: CloseCallback,
    config: ModalConfig,
    children: Rc<dyn Render>,
    close_icon: Rc<dyn Render>,
    spinner: Rc<dyn Render>,
    mount: Option<Mount>,
    session: Option<ModalSession>,
}

impl Modal {
    /// Create a closed modal on `page` reporting dismissals to `on_close`.
    pub fn new(page: &Page, on_close: impl Fn() + 'static) -> Self {
        Self {
            page: page.clone(),
            on_close: Rc::new(on_close),
            config: ModalConfig::default(),
            children: Rc::new(crate::empty()),
            close_icon: Rc::new(CloseIcon::default()),
            spinner: Rc::new(Spinner::default()),
            mount: None,
            session: None,
        }
    }

    /// Set modal configuration.
    pub fn config(mut self, config: ModalConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the dialog content.
    pub fn children(mut self, children: impl Render + 'static) -> Self {
        self.children = Rc::new(children);
        self
    }

    /// Replace the glyph inside the close button.
    pub fn close_icon(mut self, icon: impl Render + 'static) -> Self {
        self.close_icon = Rc::new(icon);
        self
    }

    /// Replace the content shown while `show_spinner` is set.
    pub fn spinner(mut self, spinner: impl Render + 'static) -> Self {
        self.spinner = Rc::new(spinner);
        self
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    pub fn current_config(&self) -> &ModalConfig {
        &self.config
    }

    pub fn is_open(&self) -> bool {
        self.session.is_some()
    }

    pub fn phase(&self) -> ModalPhase {
        self.session
            .as_ref()
            .map_or(ModalPhase::Closed, ModalSession::phase)
    }

    /// The overlay element, while mounted.
    pub fn overlay(&self) -> Option<NodeId> {
        self.mount.map(|m| m.overlay)
    }

    /// The dialog element, while mounted.
    pub fn dialog(&self) -> Option<NodeId> {
        self.mount.map(|m| m.dialog)
    }

    /// The close button, while mounted with `show_close_button`.
    pub fn close_button(&self) -> Option<NodeId> {
        let dialog = self.dialog()?;
        let tree = self.page.tree();
        tree.children(dialog)
            .iter()
            .copied()
            .find(|&id| tree.attr(id, "class") == Some(CLOSE_BUTTON_CLASS))
    }

    /// Drive the lifecycle from the host's open flag. Repeating the current
    /// state is a no-op.
    pub fn set_open(&mut self, open: bool) {
        match (open, self.is_open()) {
            (true, false) => self.open(),
            (false, true) => self.close(),
            _ => {}
        }
    }

    /// Replace the configuration.
    ///
    /// While open, a change to `close_on_esc` or `fade_duration` restarts the
    /// session. Toggling the close button or the spinner rebuilds the dialog's
    /// content; any other change only refreshes attributes and the overlay
    /// handler, leaving content nodes and focus untouched.
    pub fn set_config(&mut self, config: ModalConfig) {
        if config == self.config {
            return;
        }
        let restart = self.config.requires_restart(&config);
        let rebuild = self.config.rebuilds_content(&config);
        self.config = config;
        if !self.is_open() {
            return;
        }
        if rebuild {
            self.rerender();
        } else {
            self.refresh();
        }
        if restart {
            debug_event!("modal config changed, restarting session");
            self.session = None;
            self.begin_session();
        }
    }

    /// Replace the dialog content, re-rendering if open.
    pub fn set_children(&mut self, children: impl Render + 'static) {
        self.children = Rc::new(children);
        if self.is_open() {
            self.rerender();
        }
    }

    /// Rebuild the dialog's content from the current config and slots.
    ///
    /// The overlay and dialog elements are kept; their attributes are
    /// refreshed and everything inside the dialog is rebuilt. If focus was
    /// inside the dialog and its node went away, focus moves to the dialog.
    pub fn rerender(&mut self) {
        let Some(mount) = self.mount else {
            return;
        };
        let focus_was_inside = self
            .page
            .active_element()
            .is_some_and(|active| active != mount.dialog && self.is_within_dialog(active));

        self.refresh();
        let old: Vec<NodeId> = self.page.tree().children(mount.dialog).to_vec();
        for child in old {
            self.page.remove_node(child);
        }
        self.render_dialog_body(mount.dialog);

        if focus_was_inside && self.page.active_element().is_none() {
            self.page.focus(mount.dialog);
        }
    }

    /// Tear down and consume the modal.
    pub fn unmount(self) {
        drop(self);
    }

    fn refresh(&self) {
        if let Some(mount) = self.mount {
            self.apply_attributes(mount);
            self.install_overlay_handler(mount.overlay);
        }
    }

    fn open(&mut self) {
        let mount = self.mount_portal();
        self.mount = Some(mount);
        self.begin_session();
    }

    fn close(&mut self) {
        self.session = None;
        if let Some(mount) = self.mount.take() {
            self.page.remove_node(mount.overlay);
        }
    }

    fn begin_session(&mut self) {
        if let Some(mount) = self.mount {
            self.session = Some(ModalSession::begin(
                &self.page,
                mount.dialog,
                &self.config,
                Rc::clone(&self.on_close),
            ));
        }
    }

    fn is_within_dialog(&self, node: NodeId) -> bool {
        self.mount
            .is_some_and(|m| self.page.tree().is_inclusive_ancestor(m.dialog, node))
    }

    fn mount_portal(&self) -> Mount {
        #[cfg(feature = "tracing")]
        let _span = tracing::debug_span!("widget_render", widget = "Modal").entered();
        let overlay = self.page.create_element("div");
        let dialog = self.page.create_element("div");
        let mount = Mount { overlay, dialog };
        self.apply_attributes(mount);
        self.page.append_child(overlay, dialog);
        self.render_dialog_body(dialog);
        self.install_overlay_handler(overlay);
        self.page.append_child(self.page.body(), overlay);
        mount
    }

    fn apply_attributes(&self, mount: Mount) {
        let page = &self.page;
        let style = format!(
            "transition-duration: {}ms",
            self.config.fade_duration.as_millis()
        );
        page.set_attr(
            mount.overlay,
            "class",
            class_list(&[OVERLAY_CLASS, VISIBLE_CLASS, &self.config.overlay_class]),
        );
        page.set_attr(mount.overlay, "style", style.clone());

        let dialog = mount.dialog;
        page.set_attr(
            dialog,
            "class",
            class_list(&[CONTENT_CLASS, VISIBLE_CLASS, &self.config.modal_class]),
        );
        page.set_attr(dialog, "style", style);
        page.set_attr(dialog, attr::ROLE, Role::Dialog.as_str());
        page.set_attr(dialog, attr::ARIA_MODAL, aria::bool_token(true));
        page.set_attr(dialog, attr::TABINDEX, "-1");
        for (name, value) in [
            (attr::ARIA_LABELLEDBY, &self.config.aria_labelledby),
            (attr::ARIA_DESCRIBEDBY, &self.config.aria_describedby),
        ] {
            match aria::id_ref(value.as_deref()) {
                Some(id) => {
                    page.set_attr(dialog, name, id);
                }
                None => {
                    page.tree_mut().remove_attr(dialog, name);
                }
            }
        }
    }

    fn install_overlay_handler(&self, overlay: NodeId) {
        let policy = DismissPolicy::from_config(&self.config);
        let on_close = Rc::clone(&self.on_close);
        self.page.set_click_handler(overlay, move |_, click| {
            if let Some(_reason) = policy.on_overlay_click(click) {
                debug_event!(reason = _reason.as_str(), "modal dismissal requested");
                on_close();
            }
        });
    }

    fn render_dialog_body(&self, dialog: NodeId) {
        let page = &self.page;
        if self.config.show_close_button {
            let button = element(
                page,
                dialog,
                "button",
                &[("class", CLOSE_BUTTON_CLASS), (attr::ARIA_LABEL, CLOSE_LABEL)],
            );
            self.close_icon.render(page, button);
            let label = element(page, button, "span", &[("class", "sr-only")]);
            let text = page.create_text(CLOSE_LABEL);
            page.append_child(label, text);

            let on_close = Rc::clone(&self.on_close);
            page.set_click_handler(button, move |_, _| {
                debug_event!(
                    reason = super::dismiss::DismissReason::CloseButton.as_str(),
                    "modal dismissal requested"
                );
                on_close();
            });
        }
        if self.config.show_spinner {
            self.spinner.render(page, dialog);
        } else {
            self.children.render(page, dialog);
        }
    }
}

fn class_list(classes: &[&str]) -> String {
    classes
        .iter()
        .map(|c| c.trim())
        .filter(|c| !c.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

impl fmt::Debug for Modal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Modal")
            .field("config", &self.config)
            .field("mount", &self.mount)
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

impl Drop for Modal {
    fn drop(&mut self) {
        self.close();
    }
}
