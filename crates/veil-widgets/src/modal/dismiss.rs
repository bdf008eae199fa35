#![forbid(unsafe_code)]

//! Dismissal policy: which inputs ask the host to close the modal.
//!
//! The policy is stateless. It only answers whether an input is a dismissal;
//! the modal never flips its own open flag, so the same trigger may fire
//! again until the host closes it.

use veil_core::{ClickEvent, KeyCode, KeyEvent, KeyEventKind};

use super::config::ModalConfig;

/// Why a dismissal fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DismissReason {
    /// Escape was pressed.
    EscapePressed,
    /// The backdrop itself was clicked.
    BackdropClicked,
    /// The close button was activated.
    CloseButton,
}

impl DismissReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::EscapePressed => "escape",
            Self::BackdropClicked => "backdrop",
            Self::CloseButton => "close-button",
        }
    }
}

/// Gates for the Escape and backdrop triggers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DismissPolicy {
    pub close_on_esc: bool,
    pub close_on_overlay_click: bool,
}

impl Default for DismissPolicy {
    fn default() -> Self {
        Self::from_config(&ModalConfig::default())
    }
}

impl DismissPolicy {
    pub fn from_config(config: &ModalConfig) -> Self {
        Self {
            close_on_esc: config.close_on_esc,
            close_on_overlay_click: config.close_on_overlay_click,
        }
    }

    /// Escape keydowns (press or repeat) dismiss when enabled.
    pub fn on_key(&self, key: &KeyEvent) -> Option<DismissReason> {
        (self.close_on_esc && key.code == KeyCode::Escape && key.kind != KeyEventKind::Release)
            .then_some(DismissReason::EscapePressed)
    }

    /// A click dismisses only if it landed on the backdrop itself, not on
    /// anything bubbling up from the dialog.
    pub fn on_overlay_click(&self, click: &ClickEvent) -> Option<DismissReason> {
        (self.close_on_overlay_click && click.is_direct()).then_some(DismissReason::BackdropClicked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use veil_core::{Modifiers, Page};

    #[test]
    fn escape_respects_flag() {
        let on = DismissPolicy::default();
        let off = DismissPolicy::from_config(&ModalConfig::default().close_on_esc(false));
        let esc = KeyEvent::new(KeyCode::Escape);
        assert_eq!(on.on_key(&esc), Some(DismissReason::EscapePressed));
        assert_eq!(off.on_key(&esc), None);
    }

    #[test]
    fn escape_ignores_release_and_other_keys() {
        let policy = DismissPolicy::default();
        let release = KeyEvent::new(KeyCode::Escape).with_kind(KeyEventKind::Release);
        assert_eq!(policy.on_key(&release), None);
        let repeat = KeyEvent::new(KeyCode::Escape).with_kind(KeyEventKind::Repeat);
        assert!(policy.on_key(&repeat).is_some());
        assert_eq!(policy.on_key(&KeyEvent::new(KeyCode::Enter)), None);
        let shifted = KeyEvent::new(KeyCode::Escape).with_modifiers(Modifiers::SHIFT);
        assert!(policy.on_key(&shifted).is_some());
    }

    #[test]
    fn only_direct_backdrop_clicks_dismiss() {
        let page = Page::new();
        let overlay = page.create_element("div");
        let content = page.create_element("div");
        let policy = DismissPolicy::default();
        let direct = ClickEvent {
            target: overlay,
            current_target: overlay,
        };
        let bubbled = ClickEvent {
            target: content,
            current_target: overlay,
        };
        assert_eq!(
            policy.on_overlay_click(&direct),
            Some(DismissReason::BackdropClicked)
        );
        assert_eq!(policy.on_overlay_click(&bubbled), None);

        let off = DismissPolicy {
            close_on_overlay_click: false,
            ..policy
        };
        assert_eq!(off.on_overlay_click(&direct), None);
    }
}
