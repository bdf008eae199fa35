#![forbid(unsafe_code)]

//! Glyph rendered inside the dialog's close button.

use veil_a11y::aria::attr;
use veil_core::{NodeId, Page};

use crate::{Render, element};

/// Decorative close glyph, hidden from assistive technology.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CloseIcon {
    glyph: char,
}

impl Default for CloseIcon {
    fn default() -> Self {
        Self { glyph: '\u{00D7}' }
    }
}

impl CloseIcon {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn glyph(mut self, glyph: char) -> Self {
        self.glyph = glyph;
        self
    }
}

impl Render for CloseIcon {
    fn render(&self, page: &Page, parent: NodeId) {
        let icon = element(
            page,
            parent,
            "span",
            &[("class", "modal-close-icon"), (attr::ARIA_HIDDEN, "true")],
        );
        let glyph = page.create_text(self.glyph.to_string());
        page.append_child(icon, glyph);
    }
}
