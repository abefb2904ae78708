#![forbid(unsafe_code)]

//! Page manifest parsing.
//!
//! The page script scans the form markup once and sends the tracked fields
//! as a JSON array:
//!
//! ```json
//! [
//!   {"index": 0, "kind": "text", "element": "name", "expected": " Jeremiah "},
//!   {"index": 1, "kind": "button", "element": "next"}
//! ]
//! ```
//!
//! Entries may arrive in any order and come back sorted by index. Index
//! coverage and element uniqueness are checked when the form is built.

use formtrack_core::field::FieldSpec;
use formtrack_core::logging::TARGET_WEB;
use serde::Deserialize;

/// Errors from parsing a page manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManifestError {
    /// Malformed JSON or an unknown `kind`.
    Json(String),
    /// A text entry has no `expected` string.
    MissingExpected { index: usize },
}

impl core::fmt::Display for ManifestError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Json(msg) => write!(f, "JSON parse error: {msg}"),
            Self::MissingExpected { index } => {
                write!(f, "text field {index} has no expected string")
            }
        }
    }
}

impl std::error::Error for ManifestError {}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
enum RawKind {
    Text,
    Button,
}

#[derive(Debug, Deserialize)]
struct RawField {
    index: usize,
    kind: RawKind,
    element: String,
    #[serde(default)]
    expected: Option<String>,
}

/// Parse a manifest into index-ordered field specs.
pub fn parse_manifest(json: &str) -> Result<Vec<FieldSpec>, ManifestError> {
    let mut raw: Vec<RawField> =
        serde_json::from_str(json).map_err(|e| ManifestError::Json(e.to_string()))?;
    raw.sort_by_key(|f| f.index);

    let mut specs = Vec::with_capacity(raw.len());
    for field in raw {
        let spec = match field.kind {
            RawKind::Text => {
                let target = field
                    .expected
                    .ok_or(ManifestError::MissingExpected { index: field.index })?;
                FieldSpec::text(field.index, field.element, target.trim())
            }
            RawKind::Button => FieldSpec::action(field.index, field.element),
        };
        specs.push(spec);
    }

    tracing::debug!(target: TARGET_WEB, fields = specs.len(), "manifest parsed");
    Ok(specs)
}
