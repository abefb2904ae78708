#![forbid(unsafe_code)]

//! Field progression controller.
//!
//! Owns the progression cursor, the fields, and the batched click log. The
//! cursor is private and only moves through [`ProgressionController::advance`],
//! which runs the whole completion cascade before returning:
//!
//! 1. report the completed field (`field`);
//! 2. on the last field: flush the click log (`click`), report the task
//!    (`task`), notify proceed, park the cursor at `total_fields`;
//! 3. otherwise: move the cursor by one and unlock that field.
//!
//! Invariant: while unfinished, `cursor` is the index of the unique Active
//! field; once finished, `cursor == total_fields` and no field is Active.

use std::collections::HashSet;
use std::fmt;
use std::mem;

use crate::click::ClickEvent;
use crate::event::{KeyEvent, TextDelta};
use crate::field::{Field, FieldKind, FieldSpec, FieldState};
use crate::key_filter::KeyVerdict;
use crate::logging::TARGET_PROGRESSION;
use crate::reconciler::{KeyOutcome, Validation};
use crate::telemetry::{
    FieldCompletion, StudyHost, TaskCompletion, TelemetryBatch, proceed_or_log, send_or_log,
};

/// Errors building a form from field specs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormError {
    /// No fields at all.
    EmptyForm,
    /// Indices are not exactly `0..n`.
    NonContiguousIndex { expected: usize, found: usize },
    /// Two fields share a host element.
    DuplicateElement(String),
    /// A text field's target is empty after trimming.
    EmptyTarget { index: usize },
}

impl fmt::Display for FormError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyForm => write!(f, "form has no fields"),
            Self::NonContiguousIndex { expected, found } => {
                write!(f, "field index {found} found where {expected} was expected")
            }
            Self::DuplicateElement(id) => write!(f, "element {id:?} used by more than one field"),
            Self::EmptyTarget { index } => write!(f, "text field {index} has an empty target"),
        }
    }
}

impl std::error::Error for FormError {}

/// Result of one [`ProgressionController::advance`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// The next field was unlocked.
    Unlocked { index: usize, kind: FieldKind },
    /// The last field completed; the task is finished.
    Finished,
    /// Called after the task was already finished; nothing happened.
    AlreadyFinished,
}

/// Owner of the cursor, the fields, and the click log.
#[derive(Debug, Clone)]
pub struct ProgressionController {
    fields: Vec<Field>,
    cursor: usize,
    click_log: Vec<ClickEvent>,
    task_index: i32,
}

impl ProgressionController {
    /// Build from specs (any order) and unlock field 0.
    pub fn new(mut specs: Vec<FieldSpec>, task_index: i32) -> Result<Self, FormError> {
        if specs.is_empty() {
            return Err(FormError::EmptyForm);
        }
        specs.sort_by_key(|s| s.index);

        let mut seen = HashSet::with_capacity(specs.len());
        for (expected, spec) in specs.iter().enumerate() {
            if spec.index != expected {
                return Err(FormError::NonContiguousIndex {
                    expected,
                    found: spec.index,
                });
            }
            if !seen.insert(spec.element.as_str()) {
                return Err(FormError::DuplicateElement(spec.element.clone()));
            }
            if spec.expected.as_deref().is_some_and(|t| t.trim().is_empty()) {
                return Err(FormError::EmptyTarget { index: spec.index });
            }
        }

        let mut fields: Vec<Field> = specs.into_iter().map(Field::from_spec).collect();
        fields[0].activate();
        tracing::debug!(
            target: TARGET_PROGRESSION,
            total_fields = fields.len(),
            task_index,
            "progression initialized"
        );

        Ok(Self {
            fields,
            cursor: 0,
            click_log: Vec::new(),
            task_index,
        })
    }

    /// Index of the active field, or `total_fields()` when finished.
    #[must_use]
    pub const fn cursor(&self) -> usize {
        self.cursor
    }

    #[must_use]
    pub fn total_fields(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.cursor == self.fields.len()
    }

    #[must_use]
    pub const fn task_index(&self) -> i32 {
        self.task_index
    }

    #[must_use]
    pub fn field(&self, index: usize) -> Option<&Field> {
        self.fields.get(index)
    }

    #[must_use]
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Clicks recorded since the last flush.
    #[must_use]
    pub fn click_log(&self) -> &[ClickEvent] {
        &self.click_log
    }

    /// Append one click to the batched log.
    pub fn record_click(&mut self, click: ClickEvent) {
        self.click_log.push(click);
    }

    /// Complete the active field and run the cascade.
    pub fn advance<H: StudyHost + ?Sized>(&mut self, host: &mut H, now_millis: u64) -> Advance {
        if self.is_finished() {
            tracing::warn!(
                target: TARGET_PROGRESSION,
                cursor = self.cursor,
                "advance after task completion ignored"
            );
            return Advance::AlreadyFinished;
        }

        let completed = self.cursor;
        self.fields[completed].complete();
        send_or_log(
            host,
            TelemetryBatch::Field(FieldCompletion {
                timestamp_millis: now_millis,
                field_index: completed,
            }),
        );
        tracing::info!(
            target: TARGET_PROGRESSION,
            field = completed,
            total_fields = self.fields.len(),
            "field completed"
        );

        if completed + 1 == self.fields.len() {
            let clicks = mem::take(&mut self.click_log);
            send_or_log(host, TelemetryBatch::Click(clicks));
            send_or_log(
                host,
                TelemetryBatch::Task(TaskCompletion {
                    timestamp_millis: now_millis,
                    task_index: self.task_index,
                }),
            );
            proceed_or_log(host);
            self.cursor = self.fields.len();
            tracing::info!(
                target: TARGET_PROGRESSION,
                task_index = self.task_index,
                "task completed"
            );
            return Advance::Finished;
        }

        self.cursor += 1;
        let next = &mut self.fields[self.cursor];
        next.activate();
        tracing::debug!(
            target: TARGET_PROGRESSION,
            field = self.cursor,
            kind = ?next.kind(),
            "field unlocked"
        );
        Advance::Unlocked {
            index: self.cursor,
            kind: next.kind(),
        }
    }

    /// Route a key press to a text field.
    pub fn on_key<H: StudyHost + ?Sized>(
        &mut self,
        index: usize,
        key: &KeyEvent,
        host: &mut H,
        now_millis: u64,
    ) -> KeyVerdict {
        let Some(reconciler) = self.fields.get_mut(index).and_then(Field::reconciler_mut) else {
            return KeyVerdict::Suppress {
                prevent_default: false,
            };
        };
        let outcome: KeyOutcome = reconciler.on_key(key, now_millis, host);
        if outcome.completed() && index == self.cursor {
            self.advance(host, now_millis);
        }
        outcome.verdict
    }

    /// Route a text delta to a text field.
    pub fn on_content_delta<H: StudyHost + ?Sized>(
        &mut self,
        index: usize,
        delta: TextDelta,
        host: &mut H,
        now_millis: u64,
    ) -> Option<Validation> {
        let reconciler = self.fields.get_mut(index).and_then(Field::reconciler_mut)?;
        let validation = reconciler.on_content_delta(delta, host);
        if validation.is_some_and(|v| v.done) && index == self.cursor {
            self.advance(host, now_millis);
        }
        validation
    }

    /// Activate an action field. Only the active action field completes;
    /// returns whether it did.
    pub fn activate<H: StudyHost + ?Sized>(
        &mut self,
        index: usize,
        host: &mut H,
        now_millis: u64,
    ) -> bool {
        let Some(field) = self.fields.get(index) else {
            return false;
        };
        if field.kind() != FieldKind::Action
            || field.state() != FieldState::Active
            || index != self.cursor
        {
            return false;
        }
        tracing::debug!(target: TARGET_PROGRESSION, field = index, "action activated");
        self.advance(host, now_millis);
        true
    }
}
