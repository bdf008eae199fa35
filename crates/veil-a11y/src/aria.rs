#![forbid(unsafe_code)]

//! Roles and ARIA attribute names.

use std::fmt;

/// Attribute names used by the overlay.
pub mod attr {
    pub const ROLE: &str = "role";
    pub const ARIA_MODAL: &str = "aria-modal";
    pub const ARIA_LABEL: &str = "aria-label";
    pub const ARIA_LABELLEDBY: &str = "aria-labelledby";
    pub const ARIA_DESCRIBEDBY: &str = "aria-describedby";
    pub const ARIA_LIVE: &str = "aria-live";
    pub const ARIA_HIDDEN: &str = "aria-hidden";
    pub const TABINDEX: &str = "tabindex";
}

/// Semantic role of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Dialog,
    AlertDialog,
    Status,
}

impl Role {
    /// The `role` attribute value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Dialog => "dialog",
            Self::AlertDialog => "alertdialog",
            Self::Status => "status",
        }
    }

    /// Parse a `role` attribute value.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "dialog" => Some(Self::Dialog),
            "alertdialog" => Some(Self::AlertDialog),
            "status" => Some(Self::Status),
            _ => None,
        }
    }

    /// Whether assistive technology should treat the node as a modal surface.
    #[must_use]
    pub const fn is_modal_surface(self) -> bool {
        matches!(self, Self::Dialog | Self::AlertDialog)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `true`/`false` token for boolean ARIA states.
#[must_use]
pub const fn bool_token(value: bool) -> &'static str {
    if value { "true" } else { "false" }
}

/// An id reference as written, or `None` when missing or empty.
#[must_use]
pub fn id_ref(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trips_through_attribute_value() {
        for role in [Role::Dialog, Role::AlertDialog, Role::Status] {
            assert_eq!(Role::parse(role.as_str()), Some(role));
        }
        assert_eq!(Role::parse(" dialog "), Some(Role::Dialog));
        assert_eq!(Role::parse("grid"), None);
    }

    #[test]
    fn modal_surfaces() {
        assert!(Role::Dialog.is_modal_surface());
        assert!(Role::AlertDialog.is_modal_surface());
        assert!(!Role::Status.is_modal_surface());
    }

    #[test]
    fn empty_id_refs_are_dropped() {
        assert_eq!(id_ref(Some("modal-title")), Some("modal-title"));
        assert_eq!(id_ref(Some(" title ")), Some(" title "));
        assert_eq!(id_ref(Some("  ")), Some("  "));
        assert_eq!(id_ref(Some("")), None);
        assert_eq!(id_ref(None), None);
    }
}
