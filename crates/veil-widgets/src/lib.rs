#![forbid(unsafe_code)]

//! Overlay widgets for Veil.
//!
//! The centerpiece is [`modal::Modal`], an accessible dialog that traps
//! keyboard focus, locks page scroll while open, and reports dismissal
//! through a single host callback. Content is supplied as [`Render`] slots
//! that build nodes into a region the modal hands them.

macro_rules! debug_event {
    ($($arg:tt)*) => {
        #[cfg(feature = "tracing")]
        tracing::debug!($($arg)*);
    };
}

macro_rules! trace_event {
    ($($arg:tt)*) => {
        #[cfg(feature = "tracing")]
        tracing::trace!($($arg)*);
    };
}

pub mod close_icon;
pub mod modal;
pub mod spinner;

use veil_core::{NodeId, Page};

pub use close_icon::CloseIcon;
pub use modal::{Modal, ModalConfig, ModalPhase};
pub use spinner::Spinner;
#[cfg(feature = "policy-config")]
pub use modal::ConfigError;

/// Content that can build itself into a region of the page.
///
/// Implemented for any `Fn(&Page, NodeId)`, so slots can be plain closures.
pub trait Render {
    /// Append this content's nodes under `parent`.
    fn render(&self, page: &Page, parent: NodeId);
}

impl<F> Render for F
where
    F: Fn(&Page, NodeId),
{
    fn render(&self, page: &Page, parent: NodeId) {
        self(page, parent);
    }
}

/// A text node slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Text(String);

impl Render for Text {
    fn render(&self, page: &Page, parent: NodeId) {
        let node = page.create_text(self.0.clone());
        page.append_child(parent, node);
    }
}

pub fn text(content: impl Into<String>) -> Text {
    Text(content.into())
}

/// A slot that renders nothing.
pub fn empty() -> impl Render {
    |_: &Page, _: NodeId| {}
}

/// Append an element with the given tag and attributes under `parent`.
pub(crate) fn element(page: &Page, parent: NodeId, tag: &str, attrs: &[(&str, &str)]) -> NodeId {
    let node = page.create_element(tag);
    for (name, value) in attrs {
        page.set_attr(node, name, *value);
    }
    page.append_child(parent, node);
    node
}
