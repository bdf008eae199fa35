#![forbid(unsafe_code)]

//! Modal dialog with focus trap, scroll lock, and dismissal policy.
//!
//! # Focus Trap
//!
//! While a modal is open, Tab and Shift+Tab cycle through the focusable
//! elements inside the dialog. Focus wraps at both ends and never reaches
//! the page behind the overlay through sequential navigation.
//!
//! # Lifecycle
//!
//! The host drives the modal with [`Modal::set_open`]. Opening mounts the
//! overlay at the end of the page body, registers one keydown listener,
//! locks page scroll, and focuses the first focusable element once the fade
//! duration has elapsed. Closing (or dropping the modal) undoes all of it.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use veil_core::{KeyCode, Page};
//! use veil_widgets::{Modal, ModalConfig, text};
//!
//! let page = Page::new();
//! let mut modal = Modal::new(&page, || {})
//!     .config(ModalConfig::default().fade_duration(Duration::from_millis(100)))
//!     .children(text("Saved."));
//! modal.set_open(true);
//! page.advance(Duration::from_millis(100));
//! assert_eq!(page.active_element(), modal.close_button());
//! page.press(KeyCode::Tab);
//! assert_eq!(page.active_element(), modal.close_button());
//! ```

pub mod config;
pub mod container;
pub mod dismiss;
pub mod session;
pub mod trap;

pub use config::{DEFAULT_FADE_DURATION, ModalConfig};
#[cfg(feature = "policy-config")]
pub use config::{ConfigError, ConfigFormat};
pub use container::Modal;
pub use dismiss::{DismissPolicy, DismissReason};
pub use session::{CloseCallback, ModalPhase, ModalSession};
pub use trap::{FocusTrap, FocusableSet, TrapOutcome};
