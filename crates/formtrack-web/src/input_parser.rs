#![forbid(unsafe_code)]

//! JSON input parser for browser-encoded study form events.
//!
//! The page script forwards `keydown`, `beforeinput`, and `click` events as
//! small JSON objects. [`parse_encoded_input_to_event`] turns one of them
//! into a [`FormEvent`]. Kinds with no form meaning return `Ok(None)`.
//!
//! ```text
//! {"kind":"key","key":"a","mods":0,"field":0}
//! {"kind":"input","inputType":"insertText","data":"a","field":0}
//! {"kind":"click","target":"submit","inBounds":true}
//! ```
//!
//! # Key identities
//!
//! The `key` member is the DOM `KeyboardEvent.key` value. One-character
//! values are printable keys; named keys map to their [`KeyCode`]; every
//! other name (`Shift`, `CapsLock`, `Unidentified`, …) becomes
//! [`KeyCode::Null`], which the filter suppresses.
//!
//! # Input types
//!
//! `insertText` carries its `data`; `data: null` is the no-insertion marker.
//! `deleteContentBackward` is a delete-backward delta. Every other
//! `inputType` (paste, composition, drop, …) is also treated as no insertion.

use formtrack_core::event::{ClickTarget, FormEvent, KeyCode, KeyEvent, Modifiers, TextDelta};
use formtrack_core::logging::TARGET_WEB;
use serde::Deserialize;

/// Errors from parsing encoded input JSON.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputParseError {
    /// Malformed JSON.
    Json(String),
    /// Missing required field.
    MissingField(&'static str),
}

impl core::fmt::Display for InputParseError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Json(msg) => write!(f, "JSON parse error: {msg}"),
            Self::MissingField(field) => write!(f, "missing required field: {field}"),
        }
    }
}

impl std::error::Error for InputParseError {}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawInput {
    kind: String,
    #[serde(default)]
    key: Option<String>,
    #[serde(default)]
    mods: Option<i32>,
    #[serde(default)]
    field: Option<usize>,
    #[serde(default)]
    input_type: Option<String>,
    #[serde(default)]
    data: Option<String>,
    #[serde(default)]
    target: Option<String>,
    #[serde(default)]
    in_bounds: Option<bool>,
}

/// Parse one browser-encoded event into a [`FormEvent`].
///
/// Returns `Ok(None)` for kinds the form does not consume (`focus`,
/// `keyup`, unknown kinds). Returns `Err` for malformed JSON or a missing
/// required member.
pub fn parse_encoded_input_to_event(json: &str) -> Result<Option<FormEvent>, InputParseError> {
    let raw: RawInput =
        serde_json::from_str(json).map_err(|e| InputParseError::Json(e.to_string()))?;

    match raw.kind.as_str() {
        "key" => parse_key_event(&raw).map(Some),
        "input" => parse_input_event(raw).map(Some),
        "click" => Ok(Some(parse_click_event(raw))),
        _ => Ok(None),
    }
}

fn parse_modifiers(mods: Option<i32>) -> Modifiers {
    let bits = mods.unwrap_or(0).clamp(0, i32::from(u8::MAX)) as u8;
    Modifiers::from_bits_truncate(bits)
}

/// Map a DOM `KeyboardEvent.key` value.
#[must_use]
pub fn parse_key_code(key: &str) -> KeyCode {
    match key {
        "Enter" => KeyCode::Enter,
        "Escape" | "Esc" => KeyCode::Escape,
        "Backspace" => KeyCode::Backspace,
        "Tab" => KeyCode::Tab,
        "Delete" | "Del" => KeyCode::Delete,
        "Insert" => KeyCode::Insert,
        "Home" => KeyCode::Home,
        "End" => KeyCode::End,
        "PageUp" => KeyCode::PageUp,
        "PageDown" => KeyCode::PageDown,
        "ArrowUp" | "Up" => KeyCode::Up,
        "ArrowDown" | "Down" => KeyCode::Down,
        "ArrowLeft" | "Left" => KeyCode::Left,
        "ArrowRight" | "Right" => KeyCode::Right,
        "Spacebar" => KeyCode::Char(' '),
        other => {
            if let Some(n) = other
                .strip_prefix('F')
                .and_then(|s| s.parse::<u8>().ok())
                .filter(|&n| (1..=24).contains(&n))
            {
                return KeyCode::F(n);
            }
            let mut chars = other.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => KeyCode::Char(c),
                _ => KeyCode::Null,
            }
        }
    }
}

fn parse_key_event(raw: &RawInput) -> Result<FormEvent, InputParseError> {
    let field = raw.field.ok_or(InputParseError::MissingField("field"))?;
    let key = raw
        .key
        .as_deref()
        .filter(|s| !s.is_empty())
        .ok_or(InputParseError::MissingField("key"))?;

    Ok(FormEvent::Key {
        field,
        event: KeyEvent::new(parse_key_code(key)).with_modifiers(parse_modifiers(raw.mods)),
    })
}

fn parse_input_event(raw: RawInput) -> Result<FormEvent, InputParseError> {
    let field = raw.field.ok_or(InputParseError::MissingField("field"))?;
    let input_type = raw
        .input_type
        .ok_or(InputParseError::MissingField("inputType"))?;

    let delta = match (input_type.as_str(), raw.data) {
        ("insertText", Some(data)) => TextDelta::Insert(data),
        ("deleteContentBackward", _) => TextDelta::DeleteBackward,
        (other, _) => {
            tracing::trace!(target: TARGET_WEB, input_type = other, "no-insertion input");
            TextDelta::None
        }
    };

    Ok(FormEvent::Text { field, delta })
}

fn parse_click_event(raw: RawInput) -> FormEvent {
    let target = match (raw.in_bounds.unwrap_or(true), raw.target) {
        (false, _) => ClickTarget::OutOfBounds,
        (true, Some(id)) if !id.is_empty() => ClickTarget::Element(id),
        (true, _) => ClickTarget::Background,
    };
    FormEvent::Click(target)
}
