#![forbid(unsafe_code)]

//! Canonical input event types.
//!
//! The study form receives three independent raw signals from its host:
//! key presses, text deltas, and clicks. This module defines the normalized
//! shape of each. All events derive `Clone`, `PartialEq`, and `Eq` for use
//! in tests and pattern matching.
//!
//! # Design Notes
//!
//! - Key identities follow the platform key-naming convention (DOM
//!   `KeyboardEvent.key`): a printable key is named by the single character
//!   it produces, every other key by a multi-character name.
//! - A text delta is the content the platform is about to apply to a field.
//!   [`TextDelta::None`] is the "no insertion occurred" marker.
//! - `Modifiers` use bitflags for easy combination.

use std::fmt;

use bitflags::bitflags;

/// Canonical input event addressed to the study form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormEvent {
    /// A key press delivered to the field at `field`.
    Key {
        /// Index of the field that had focus.
        field: usize,
        /// The key press itself.
        event: KeyEvent,
    },

    /// A text delta delivered to the field at `field`.
    Text {
        /// Index of the field the delta targets.
        field: usize,
        /// The delta.
        delta: TextDelta,
    },

    /// A click anywhere on the page.
    Click(ClickTarget),
}

/// A keyboard event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    /// The key identity.
    pub code: KeyCode,

    /// Modifier keys held during the event.
    pub modifiers: Modifiers,
}

impl KeyEvent {
    /// Create a new key event with no modifiers.
    #[must_use]
    pub const fn new(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: Modifiers::NONE,
        }
    }

    /// Create a key event with modifiers.
    #[must_use]
    pub const fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Check if this is a specific character key.
    #[must_use]
    pub fn is_char(&self, c: char) -> bool {
        matches!(self.code, KeyCode::Char(ch) if ch == c)
    }

    /// Check if Ctrl modifier is held.
    #[must_use]
    pub const fn ctrl(&self) -> bool {
        self.modifiers.contains(Modifiers::CTRL)
    }

    /// Check if Alt modifier is held.
    #[must_use]
    pub const fn alt(&self) -> bool {
        self.modifiers.contains(Modifiers::ALT)
    }

    /// Check if Shift modifier is held.
    #[must_use]
    pub const fn shift(&self) -> bool {
        self.modifiers.contains(Modifiers::SHIFT)
    }

    /// Check if Super/Meta/Cmd modifier is held.
    #[must_use]
    pub const fn super_key(&self) -> bool {
        self.modifiers.contains(Modifiers::SUPER)
    }

    /// True when any chording modifier (Ctrl, Alt, Meta) is held.
    ///
    /// Shift is not a chording modifier: it selects which printable
    /// character a key produces.
    #[must_use]
    pub const fn is_chorded(&self) -> bool {
        self.modifiers
            .intersects(Modifiers::CTRL.union(Modifiers::ALT).union(Modifiers::SUPER))
    }
}

/// Key identities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    /// A key named by the single character it produces.
    Char(char),

    /// Enter/Return key.
    Enter,

    /// Escape key.
    Escape,

    /// Backspace (delete-backward) key.
    Backspace,

    /// Tab key.
    Tab,

    /// Delete (delete-forward) key.
    Delete,

    /// Insert key.
    Insert,

    /// Home key.
    Home,

    /// End key.
    End,

    /// Page Up key.
    PageUp,

    /// Page Down key.
    PageDown,

    /// Up arrow key.
    Up,

    /// Down arrow key.
    Down,

    /// Left arrow key.
    Left,

    /// Right arrow key.
    Right,

    /// Function key (F1-F24).
    F(u8),

    /// Any other multi-character key name (modifiers, media keys, dead keys).
    Null,
}

impl KeyCode {
    /// Navigation keys move the caret without editing content.
    #[must_use]
    pub const fn is_navigation(self) -> bool {
        matches!(
            self,
            Self::Up
                | Self::Down
                | Self::Left
                | Self::Right
                | Self::Home
                | Self::End
                | Self::PageUp
                | Self::PageDown
        )
    }

    /// True for the delete-backward key.
    #[must_use]
    pub const fn is_backspace(self) -> bool {
        matches!(self, Self::Backspace)
    }
}

/// Renders the platform key name, which is also the `key` reported in
/// keystroke telemetry.
impl fmt::Display for KeyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Char(c) => write!(f, "{c}"),
            Self::Enter => f.write_str("Enter"),
            Self::Escape => f.write_str("Escape"),
            Self::Backspace => f.write_str("Backspace"),
            Self::Tab => f.write_str("Tab"),
            Self::Delete => f.write_str("Delete"),
            Self::Insert => f.write_str("Insert"),
            Self::Home => f.write_str("Home"),
            Self::End => f.write_str("End"),
            Self::PageUp => f.write_str("PageUp"),
            Self::PageDown => f.write_str("PageDown"),
            Self::Up => f.write_str("ArrowUp"),
            Self::Down => f.write_str("ArrowDown"),
            Self::Left => f.write_str("ArrowLeft"),
            Self::Right => f.write_str("ArrowRight"),
            Self::F(n) => write!(f, "F{n}"),
            Self::Null => f.write_str("Unidentified"),
        }
    }
}

bitflags! {
    /// Modifier keys that can be held during a key event.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Modifiers: u8 {
        /// No modifiers.
        const NONE  = 0b0000;
        /// Shift key.
        const SHIFT = 0b0001;
        /// Alt/Option key.
        const ALT   = 0b0010;
        /// Control key.
        const CTRL  = 0b0100;
        /// Super/Meta/Command key.
        const SUPER = 0b1000;
    }
}

impl Default for Modifiers {
    fn default() -> Self {
        Self::NONE
    }
}

/// The content change a text field is about to apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextDelta {
    /// Text inserted at the caret. Exactly one unit when well formed.
    Insert(String),

    /// One unit removed before the caret.
    DeleteBackward,

    /// No insertion occurred (structural or no-op signal).
    None,
}

impl TextDelta {
    /// Convenience constructor for a single inserted character.
    #[must_use]
    pub fn insert_char(c: char) -> Self {
        Self::Insert(c.to_string())
    }

    /// True for the "no insertion occurred" marker.
    #[must_use]
    pub const fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

/// Where a click landed, as reported by the host.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ClickTarget {
    /// An element inside the page, by element identifier.
    Element(String),

    /// Inside the page but on no identified element.
    Background,

    /// Outside the page viewport.
    OutOfBounds,
}

impl ClickTarget {
    /// Convenience constructor for an element target.
    #[must_use]
    pub fn element(id: impl Into<String>) -> Self {
        Self::Element(id.into())
    }
}
