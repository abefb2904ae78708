#![forbid(unsafe_code)]

//! Click classification.
//!
//! Every click produces exactly one [`ClickEvent`] in the shared click log.
//! A click on a tracked field is classified by the field's kind and is
//! correct when the field is the one the cursor points at. Everything else
//! falls through to the catch-all and is never correct.

use std::fmt;

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::event::ClickTarget;
use crate::field::{Field, FieldKind};
use crate::logging::TARGET_CLICK;
use crate::progression::ProgressionController;

/// Where a click landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClickRegion {
    /// Outside the page.
    OutOfBounds,
    /// Inside the page, on no tracked field.
    Background,
    /// On a text field.
    TextField,
    /// On an action field.
    Button,
}

impl ClickRegion {
    /// Wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OutOfBounds => "OutOfBounds",
            Self::Background => "Background",
            Self::TextField => "TextField",
            Self::Button => "Button",
        }
    }

    /// Parse a wire name. Unknown names map to `OutOfBounds`.
    #[must_use]
    pub fn from_wire(name: &str) -> Self {
        match name {
            "Background" => Self::Background,
            "TextField" => Self::TextField,
            "Button" => Self::Button,
            _ => Self::OutOfBounds,
        }
    }
}

impl fmt::Display for ClickRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<FieldKind> for ClickRegion {
    fn from(kind: FieldKind) -> Self {
        match kind {
            FieldKind::Text => Self::TextField,
            FieldKind::Action => Self::Button,
        }
    }
}

/// One classified click.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClickEvent {
    pub timestamp_millis: u64,
    pub location: ClickRegion,
    pub was_correct: bool,
}

/// Resolves click targets against the tracked-field set.
#[derive(Debug, Default, Clone)]
pub struct ClickClassifier {
    regions: AHashMap<String, usize>,
}

impl ClickClassifier {
    /// Create a classifier with no tracked regions.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Track every field's element.
    #[must_use]
    pub fn from_fields(fields: &[Field]) -> Self {
        let mut classifier = Self::new();
        for field in fields {
            classifier.register(field.element(), field.index());
        }
        classifier
    }

    /// Track `element` as field `index`. Returns the previous index if the
    /// element was already registered.
    pub fn register(&mut self, element: impl Into<String>, index: usize) -> Option<usize> {
        self.regions.insert(element.into(), index)
    }

    /// Field index for a target, if it is a tracked field.
    #[must_use]
    pub fn resolve(&self, target: &ClickTarget) -> Option<usize> {
        match target {
            ClickTarget::Element(id) => self.regions.get(id).copied(),
            ClickTarget::Background | ClickTarget::OutOfBounds => None,
        }
    }

    /// Classify without recording.
    #[must_use]
    pub fn classify(
        &self,
        target: &ClickTarget,
        progression: &ProgressionController,
        now_millis: u64,
    ) -> ClickEvent {
        let tracked = self
            .resolve(target)
            .and_then(|index| progression.field(index));

        let (location, was_correct) = match (tracked, target) {
            (Some(field), _) => (
                ClickRegion::from(field.kind()),
                field.index() == progression.cursor(),
            ),
            (None, ClickTarget::OutOfBounds) => (ClickRegion::OutOfBounds, false),
            (None, _) => (ClickRegion::Background, false),
        };

        ClickEvent {
            timestamp_millis: now_millis,
            location,
            was_correct,
        }
    }

    /// Classify and append to the shared click log.
    pub fn on_click(
        &self,
        target: &ClickTarget,
        progression: &mut ProgressionController,
        now_millis: u64,
    ) -> ClickEvent {
        let click = self.classify(target, progression, now_millis);
        tracing::debug!(
            target: TARGET_CLICK,
            location = %click.location,
            was_correct = click.was_correct,
            cursor = progression.cursor(),
            "click recorded"
        );
        progression.record_click(click);
        click
    }
}
