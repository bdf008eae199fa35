#![forbid(unsafe_code)]

//! Loading indicator shown in place of dialog children.

use veil_a11y::aria::{Role, attr};
use veil_core::{NodeId, Page};

use crate::{Render, element};

/// Four-bar loading indicator announced as a polite status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spinner {
    label: String,
}

impl Default for Spinner {
    fn default() -> Self {
        Self {
            label: "Loading".to_owned(),
        }
    }
}

impl Spinner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accessible name announced to screen readers.
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }
}

impl Render for Spinner {
    fn render(&self, page: &Page, parent: NodeId) {
        let root = element(
            page,
            parent,
            "div",
            &[
                ("class", "spinner"),
                (attr::ROLE, Role::Status.as_str()),
                (attr::ARIA_LIVE, "polite"),
                (attr::ARIA_LABEL, self.label.as_str()),
            ],
        );
        for bar in ["rect1", "rect2", "rect3", "rect4"] {
            element(page, root, "div", &[("class", bar)]);
        }
    }
}
