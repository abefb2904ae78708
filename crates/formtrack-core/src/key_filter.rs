#![forbid(unsafe_code)]

//! Key signal classification.
//!
//! Decides which key presses may enter a field's reconciliation queues.
//! Only keys that produce exactly one content delta are passed; everything
//! else is suppressed so the key queue stays paired 1:1 with the delta queue.
//!
//! | key | verdict | platform default |
//! |-----|---------|------------------|
//! | arrows, Home, End, PageUp, PageDown | suppress | prevented |
//! | any key with Ctrl/Alt/Meta held | suppress | prevented |
//! | Backspace, assembled string non-empty | pass | kept |
//! | Backspace, assembled string empty | suppress | kept |
//! | single printable character | pass | kept |
//! | anything else (Tab, Enter, F-keys, …) | suppress | kept |

use crate::event::{KeyCode, KeyEvent};

/// Result of classifying one key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyVerdict {
    /// The key is content relevant and is enqueued.
    Pass,

    /// The key is not enqueued.
    Suppress {
        /// The host must also cancel the platform's default editing action.
        prevent_default: bool,
    },
}

impl KeyVerdict {
    /// True when the key enters the reconciler queues.
    #[must_use]
    pub const fn is_pass(self) -> bool {
        matches!(self, Self::Pass)
    }

    /// True when the host must cancel the platform default.
    #[must_use]
    pub const fn prevents_default(self) -> bool {
        matches!(
            self,
            Self::Suppress {
                prevent_default: true
            }
        )
    }
}

/// Stateless key press classifier.
#[derive(Debug, Default, Clone, Copy)]
pub struct KeySignalFilter;

impl KeySignalFilter {
    /// Classify `key` given whether the field's assembled string is empty.
    #[must_use]
    pub fn classify(&self, key: &KeyEvent, assembled_is_empty: bool) -> KeyVerdict {
        if key.code.is_navigation() || key.is_chorded() {
            return KeyVerdict::Suppress {
                prevent_default: true,
            };
        }

        match key.code {
            // Nothing to delete: the platform emits no delta either.
            KeyCode::Backspace if assembled_is_empty => KeyVerdict::Suppress {
                prevent_default: false,
            },
            KeyCode::Backspace | KeyCode::Char(_) => KeyVerdict::Pass,
            _ => KeyVerdict::Suppress {
                prevent_default: false,
            },
        }
    }
}
