#![forbid(unsafe_code)]

//! Keyboard and pointer events delivered by the page.

use bitflags::bitflags;

use crate::tree::NodeId;

/// Logical key identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    Tab,
    /// Shift+Tab as reported by hosts that fold the modifier into the key.
    BackTab,
    Escape,
    Enter,
    Backspace,
    Up,
    Down,
    Left,
    Right,
    Char(char),
}

impl KeyCode {
    /// Map a DOM `KeyboardEvent.key` value to a key code.
    #[must_use]
    pub fn from_dom_key(key: &str) -> Option<Self> {
        let code = match key {
            "Tab" => Self::Tab,
            "Escape" | "Esc" => Self::Escape,
            "Enter" => Self::Enter,
            "Backspace" => Self::Backspace,
            "ArrowUp" => Self::Up,
            "ArrowDown" => Self::Down,
            "ArrowLeft" => Self::Left,
            "ArrowRight" => Self::Right,
            other => {
                let mut chars = other.chars();
                match (chars.next(), chars.next()) {
                    (Some(ch), None) => Self::Char(ch),
                    _ => return None,
                }
            }
        };
        Some(code)
    }
}

bitflags! {
    /// Modifier keys held during a key event.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Modifiers: u8 {
        const SHIFT = 0b0001;
        const CTRL = 0b0010;
        const ALT = 0b0100;
        const SUPER = 0b1000;
    }
}

/// Phase of a key event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum KeyEventKind {
    #[default]
    Press,
    Repeat,
    Release,
}

/// A key event as produced by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyEvent {
    pub code: KeyCode,
    pub modifiers: Modifiers,
    pub kind: KeyEventKind,
}

impl KeyEvent {
    /// A key press without modifiers.
    #[must_use]
    pub const fn new(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: Modifiers::empty(),
            kind: KeyEventKind::Press,
        }
    }

    #[must_use]
    pub const fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    #[must_use]
    pub const fn with_kind(mut self, kind: KeyEventKind) -> Self {
        self.kind = kind;
        self
    }

    /// Whether Shift is held.
    #[must_use]
    pub const fn shift(&self) -> bool {
        self.modifiers.contains(Modifiers::SHIFT)
    }

    /// Whether this is a sequential-navigation key (Tab, Shift+Tab, BackTab).
    #[must_use]
    pub const fn is_tab(&self) -> bool {
        matches!(self.code, KeyCode::Tab | KeyCode::BackTab)
    }

    /// Whether this event asks for backward navigation.
    #[must_use]
    pub const fn is_backward_tab(&self) -> bool {
        match self.code {
            KeyCode::BackTab => true,
            KeyCode::Tab => self.shift(),
            _ => false,
        }
    }
}

/// A keydown being dispatched to document listeners.
///
/// Listeners may call [`prevent_default`](Self::prevent_default) to stop the
/// page from running its default action (sequential focus navigation for
/// Tab) once dispatch completes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyboardEvent {
    key: KeyEvent,
    default_prevented: bool,
}

impl KeyboardEvent {
    #[must_use]
    pub const fn new(key: KeyEvent) -> Self {
        Self {
            key,
            default_prevented: false,
        }
    }

    #[must_use]
    pub const fn key(&self) -> &KeyEvent {
        &self.key
    }

    #[must_use]
    pub const fn code(&self) -> KeyCode {
        self.key.code
    }

    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    #[must_use]
    pub const fn is_default_prevented(&self) -> bool {
        self.default_prevented
    }
}

/// A click travelling up the tree.
///
/// `target` is where the click originated; `current_target` is the node
/// whose handler is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClickEvent {
    pub target: NodeId,
    pub current_target: NodeId,
}

impl ClickEvent {
    /// Whether the handler's own node was clicked, as opposed to a
    /// descendant whose click bubbled up.
    #[must_use]
    pub fn is_direct(&self) -> bool {
        self.target == self.current_target
    }
}
