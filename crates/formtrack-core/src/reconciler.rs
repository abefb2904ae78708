#![forbid(unsafe_code)]

//! Per-field input reconciliation.
//!
//! A text field receives two independently timed signals for every edit: a
//! key press (identity) and a text delta (content). [`InputReconciler`] joins
//! them through three FIFO queues:
//!
//! ```text
//!   key press ──► KeySignalFilter ──► keys ───────┐
//!                                  └─► timestamps ─┼──► pair ──► assembled string
//!   text delta ──────────────────────► deltas ────┘              + edit log
//! ```
//!
//! A pair is consumed whenever all three queues are non-empty, so either
//! signal may arrive first. The filter enqueues a key only when the platform
//! will also emit exactly one delta for it, which keeps the queues in
//! lockstep. A delete-backward pair removes the last unit and is not logged;
//! every other pair appends its delta and is logged with its
//! prefix-correctness at that moment.
//!
//! # Invariants
//!
//! - `assembled` equals the concatenation of accepted deltas minus the units
//!   removed by delete-backward pairs.
//! - Validation is always computed from the freshly mutated `assembled`.
//! - After completion the reconciler is frozen: queues are dropped and every
//!   later signal is ignored.

use std::collections::VecDeque;
use std::fmt;

use crate::event::{KeyCode, KeyEvent, TextDelta};
use crate::key_filter::{KeySignalFilter, KeyVerdict};
use crate::logging::{TARGET_FILTER, TARGET_RECONCILER};
use crate::telemetry::{KeystrokeRecord, StudyHost, TelemetryBatch, send_or_log};

/// Observable field-level status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum InputStatus {
    /// Input disabled; the field has not been reached yet.
    #[default]
    Locked,
    /// The assembled string is a prefix of the target.
    Progress,
    /// The assembled string diverged from the target.
    Error,
    /// The target was reproduced exactly.
    Completed,
}

impl InputStatus {
    /// Page attribute value (`data-input-state`).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Locked => "locked",
            Self::Progress => "progress",
            Self::Error => "error",
            Self::Completed => "completed",
        }
    }
}

impl fmt::Display for InputStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One accepted edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditEvent {
    /// Arrival time of the key press, Unix millis.
    pub timestamp_millis: u64,
    /// Key identity of the press.
    pub key: Option<KeyCode>,
    /// Content applied.
    pub delta: Option<String>,
    /// Whether the assembled string was a prefix of the target after the edit.
    pub prefix_correct: bool,
}

impl EditEvent {
    fn to_record(&self) -> KeystrokeRecord {
        KeystrokeRecord {
            timestamp_millis: self.timestamp_millis,
            was_correct: self.prefix_correct,
            key: self.key.map(|k| k.to_string()).unwrap_or_default(),
        }
    }
}

/// Validation verdict against the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Validation {
    /// `target.starts_with(assembled)`.
    pub prefix_ok: bool,
    /// `assembled == target`.
    pub done: bool,
}

/// Outcome of delivering one key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyOutcome {
    /// Filter verdict; the host honors `prevents_default()`.
    pub verdict: KeyVerdict,
    /// Set when the key completed a pending pair.
    pub validation: Option<Validation>,
}

impl KeyOutcome {
    const DETACHED: Self = Self {
        verdict: KeyVerdict::Suppress {
            prevent_default: false,
        },
        validation: None,
    };

    /// True when this key finished the field.
    #[must_use]
    pub fn completed(&self) -> bool {
        self.validation.is_some_and(|v| v.done)
    }
}

/// Three-queue join of key and delta signals for one text field.
#[derive(Debug, Clone)]
pub struct InputReconciler {
    field: usize,
    target: String,
    filter: KeySignalFilter,
    keys: VecDeque<KeyCode>,
    timestamps: VecDeque<u64>,
    deltas: VecDeque<TextDelta>,
    assembled: String,
    log: Vec<EditEvent>,
    status: InputStatus,
    accepting: bool,
    frozen: bool,
}

impl InputReconciler {
    /// Create a locked reconciler for field `field`; `target` is trimmed.
    #[must_use]
    pub fn new(field: usize, target: &str) -> Self {
        Self {
            field,
            target: target.trim().to_owned(),
            filter: KeySignalFilter,
            keys: VecDeque::new(),
            timestamps: VecDeque::new(),
            deltas: VecDeque::new(),
            assembled: String::new(),
            log: Vec::new(),
            status: InputStatus::Locked,
            accepting: false,
            frozen: false,
        }
    }

    #[must_use]
    pub fn target(&self) -> &str {
        &self.target
    }

    #[must_use]
    pub fn assembled(&self) -> &str {
        &self.assembled
    }

    #[must_use]
    pub const fn status(&self) -> InputStatus {
        self.status
    }

    /// Accepted edits so far.
    #[must_use]
    pub fn edit_log(&self) -> &[EditEvent] {
        &self.log
    }

    /// True while the field takes input (unlocked and not frozen).
    #[must_use]
    pub const fn is_accepting(&self) -> bool {
        self.accepting && !self.frozen
    }

    /// True once the target has been reproduced.
    #[must_use]
    pub const fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Pending (key, delta) queue lengths.
    #[must_use]
    pub fn pending(&self) -> (usize, usize) {
        (self.keys.len(), self.deltas.len())
    }

    /// Allow input. Status becomes Progress.
    pub(crate) fn unlock(&mut self) {
        if self.frozen {
            return;
        }
        self.accepting = true;
        self.status = InputStatus::Progress;
    }

    /// Stop taking input without a flush; used when the field is completed
    /// from outside. Pending signals are dropped.
    pub(crate) fn detach(&mut self) {
        if self.frozen {
            return;
        }
        self.frozen = true;
        self.accepting = false;
        self.status = InputStatus::Completed;
        self.keys.clear();
        self.timestamps.clear();
        self.deltas.clear();
        tracing::debug!(target: TARGET_RECONCILER, field = self.field, "reconciler detached");
    }

    /// Key signal producer.
    pub fn on_key<H: StudyHost + ?Sized>(
        &mut self,
        key: &KeyEvent,
        now_millis: u64,
        host: &mut H,
    ) -> KeyOutcome {
        if !self.is_accepting() {
            tracing::trace!(
                target: TARGET_RECONCILER,
                field = self.field,
                key = %key.code,
                "key dropped; field detached"
            );
            return KeyOutcome::DETACHED;
        }

        let verdict = self.filter.classify(key, self.assembled.is_empty());
        tracing::trace!(
            target: TARGET_FILTER,
            field = self.field,
            key = %key.code,
            ?verdict,
            "key classified"
        );
        if !verdict.is_pass() {
            return KeyOutcome {
                verdict,
                validation: None,
            };
        }

        self.keys.push_back(key.code);
        self.timestamps.push_back(now_millis);
        KeyOutcome {
            verdict,
            validation: self.drain(host),
        }
    }

    /// Text delta producer.
    ///
    /// Returns the verdict computed for this delta, or `None` when the field
    /// is detached or the delta is still waiting for its key.
    pub fn on_content_delta<H: StudyHost + ?Sized>(
        &mut self,
        delta: TextDelta,
        host: &mut H,
    ) -> Option<Validation> {
        if !self.is_accepting() {
            tracing::trace!(
                target: TARGET_RECONCILER,
                field = self.field,
                ?delta,
                "delta dropped; field detached"
            );
            return None;
        }

        if delta.is_none() {
            // Status refresh only; queues and log are untouched.
            return Some(self.validate());
        }

        self.deltas.push_back(delta);
        self.drain(host)
    }

    fn drain<H: StudyHost + ?Sized>(&mut self, host: &mut H) -> Option<Validation> {
        let mut last = None;
        while self.is_accepting() && !self.keys.is_empty() && !self.deltas.is_empty() {
            // keys and timestamps are pushed together, so all three pop.
            let (Some(key), Some(ts), Some(delta)) = (
                self.keys.pop_front(),
                self.timestamps.pop_front(),
                self.deltas.pop_front(),
            ) else {
                break;
            };
            last = Some(self.apply(key, ts, delta, host));
        }
        last
    }

    fn apply<H: StudyHost + ?Sized>(
        &mut self,
        key: KeyCode,
        timestamp_millis: u64,
        delta: TextDelta,
        host: &mut H,
    ) -> Validation {
        match (key, delta) {
            (KeyCode::Backspace, TextDelta::DeleteBackward) => {
                self.assembled.pop();
                tracing::debug!(
                    target: TARGET_RECONCILER,
                    field = self.field,
                    assembled = %self.assembled,
                    "delete-backward applied"
                );
            }
            (key, TextDelta::Insert(text)) if !key.is_backspace() => {
                if text.is_empty() {
                    tracing::warn!(
                        target: TARGET_RECONCILER,
                        field = self.field,
                        key = %key,
                        "empty insertion ignored"
                    );
                } else {
                    self.assembled.push_str(&text);
                    let prefix_correct = self.target.starts_with(self.assembled.as_str());
                    tracing::debug!(
                        target: TARGET_RECONCILER,
                        field = self.field,
                        key = %key,
                        assembled = %self.assembled,
                        prefix_correct,
                        "insertion applied"
                    );
                    self.log.push(EditEvent {
                        timestamp_millis,
                        key: Some(key),
                        delta: Some(text),
                        prefix_correct,
                    });
                }
            }
            (key, delta) => {
                debug_assert!(
                    false,
                    "field {}: key {key} paired with mismatched delta {delta:?}",
                    self.field
                );
                tracing::error!(
                    target: TARGET_RECONCILER,
                    field = self.field,
                    key = %key,
                    ?delta,
                    "key/delta queues out of sync; pair discarded"
                );
            }
        }

        let validation = self.validate();
        if validation.done {
            self.complete(host);
        }
        validation
    }

    fn validate(&mut self) -> Validation {
        let prefix_ok = self.target.starts_with(self.assembled.as_str());
        let done = self.assembled == self.target;
        self.status = if prefix_ok {
            InputStatus::Progress
        } else {
            InputStatus::Error
        };
        Validation { prefix_ok, done }
    }

    fn complete<H: StudyHost + ?Sized>(&mut self, host: &mut H) {
        self.frozen = true;
        self.accepting = false;
        self.status = InputStatus::Completed;
        self.keys.clear();
        self.timestamps.clear();
        self.deltas.clear();

        tracing::info!(
            target: TARGET_RECONCILER,
            field = self.field,
            edits = self.log.len(),
            "field completed"
        );
        let records = self.log.iter().map(EditEvent::to_record).collect();
        send_or_log(host, TelemetryBatch::Keystroke(records));
    }
}
