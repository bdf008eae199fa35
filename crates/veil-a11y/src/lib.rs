#![forbid(unsafe_code)]

//! Accessibility layer for Veil.
//!
//! This crate knows nothing about trees or events. It answers two questions
//! about a single node, expressed through the [`AccessNode`] trait:
//!
//! - Is the node reachable by sequential keyboard navigation? See
//!   [`FocusPolicy`].
//! - Which role and ARIA attributes describe it? See [`aria`].
//!
//! Keeping the predicate as data lets any host tree (the built-in page model,
//! a real DOM binding, a test double) reuse the same rules.

pub mod aria;
pub mod focusable;

pub use aria::Role;
pub use focusable::{AccessNode, FocusPolicy, FocusRule, is_programmatically_focusable, tab_index};
