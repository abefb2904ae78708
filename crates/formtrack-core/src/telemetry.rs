#![forbid(unsafe_code)]

//! Telemetry payloads and the host collaborator contract.
//!
//! The core never performs I/O itself. Every report leaves through a
//! [`StudyHost`], which the embedding environment implements (an HTTP client
//! in the browser, a [`crate::sink::SinkHost`] for local capture, a
//! [`RecordingHost`] in tests).
//!
//! Sends are fire-and-forget: the core does not wait for, retry, or surface a
//! failed send. [`send_or_log`] is the single place that policy lives.

use std::fmt;
use std::io;

use serde::{Deserialize, Serialize};

use crate::click::ClickEvent;
use crate::logging::TARGET_TELEMETRY;

/// Telemetry stream tag. Each kind maps to one collaborator endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TelemetryKind {
    /// One field completed.
    Field,
    /// The whole task completed.
    Task,
    /// Batched click log.
    Click,
    /// One field's keystroke log.
    Keystroke,
}

impl TelemetryKind {
    /// Wire tag for this kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Field => "field",
            Self::Task => "task",
            Self::Click => "click",
            Self::Keystroke => "keystroke",
        }
    }

    /// Collaborator endpoint path.
    #[must_use]
    pub const fn endpoint(self) -> &'static str {
        match self {
            Self::Field => "/events/field",
            Self::Task => "/events/task",
            Self::Click => "/events/click",
            Self::Keystroke => "/events/keystroke",
        }
    }
}

impl fmt::Display for TelemetryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Field completion report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldCompletion {
    pub timestamp_millis: u64,
    pub field_index: usize,
}

/// Task completion report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskCompletion {
    pub timestamp_millis: u64,
    pub task_index: i32,
}

/// One accepted keystroke as reported on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeystrokeRecord {
    pub timestamp_millis: u64,
    pub was_correct: bool,
    pub key: String,
}

/// One telemetry send.
///
/// Serializes to the bare payload (object or array) expected by the
/// endpoint returned from [`TelemetryKind::endpoint`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum TelemetryBatch {
    Field(FieldCompletion),
    Task(TaskCompletion),
    Click(Vec<ClickEvent>),
    Keystroke(Vec<KeystrokeRecord>),
}

impl TelemetryBatch {
    /// Stream tag of this batch.
    #[must_use]
    pub const fn kind(&self) -> TelemetryKind {
        match self {
            Self::Field(_) => TelemetryKind::Field,
            Self::Task(_) => TelemetryKind::Task,
            Self::Click(_) => TelemetryKind::Click,
            Self::Keystroke(_) => TelemetryKind::Keystroke,
        }
    }

    /// Number of entries carried (1 for the single-object kinds).
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Field(_) | Self::Task(_) => 1,
            Self::Click(clicks) => clicks.len(),
            Self::Keystroke(keys) => keys.len(),
        }
    }

    /// True for an empty click or keystroke batch.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// JSON request body.
    pub fn to_json_body(&self) -> Result<String, TelemetryError> {
        serde_json::to_string(self).map_err(TelemetryError::Encode)
    }

    /// Delimited log lines, one per entry (`Kind;timestamp;…`).
    #[must_use]
    pub fn log_lines(&self) -> Vec<String> {
        const D: char = ';';
        match self {
            Self::Field(f) => vec![format!(
                "FieldCompletion{D}{}{D}{}",
                f.timestamp_millis, f.field_index
            )],
            Self::Task(t) => vec![format!(
                "TaskCompletion{D}{}{D}{}",
                t.timestamp_millis, t.task_index
            )],
            Self::Click(clicks) => clicks
                .iter()
                .map(|c| {
                    format!(
                        "Click{D}{}{D}{}{D}{}",
                        c.timestamp_millis,
                        c.location.as_str(),
                        c.was_correct
                    )
                })
                .collect(),
            Self::Keystroke(keys) => keys
                .iter()
                .map(|k| {
                    format!(
                        "Keystroke{D}{}{D}{}{D}{}",
                        k.timestamp_millis, k.key, k.was_correct
                    )
                })
                .collect(),
        }
    }
}

/// Errors a host may report for a send. The core logs them and moves on.
#[derive(Debug)]
pub enum TelemetryError {
    /// Transport or file I/O failure.
    Io(io::Error),
    /// Payload could not be encoded.
    Encode(serde_json::Error),
    /// The collaborator refused the request.
    Rejected(String),
}

impl fmt::Display for TelemetryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::Encode(e) => write!(f, "encode error: {e}"),
            Self::Rejected(msg) => write!(f, "rejected: {msg}"),
        }
    }
}

impl std::error::Error for TelemetryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Encode(e) => Some(e),
            Self::Rejected(_) => None,
        }
    }
}

impl From<io::Error> for TelemetryError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

/// Collaborator that receives telemetry and the proceed signal.
pub trait StudyHost {
    /// Deliver one telemetry batch.
    fn send_telemetry(&mut self, batch: TelemetryBatch) -> Result<(), TelemetryError>;

    /// Signal that the task is finished.
    fn notify_proceed(&mut self) -> Result<(), TelemetryError>;
}

impl<H: StudyHost + ?Sized> StudyHost for &mut H {
    fn send_telemetry(&mut self, batch: TelemetryBatch) -> Result<(), TelemetryError> {
        (**self).send_telemetry(batch)
    }

    fn notify_proceed(&mut self) -> Result<(), TelemetryError> {
        (**self).notify_proceed()
    }
}

/// Send `batch`, logging (never propagating) a failure.
pub fn send_or_log<H: StudyHost + ?Sized>(host: &mut H, batch: TelemetryBatch) {
    let kind = batch.kind();
    let entries = batch.len();
    match host.send_telemetry(batch) {
        Ok(()) => tracing::debug!(
            target: TARGET_TELEMETRY,
            kind = %kind,
            entries,
            "telemetry sent"
        ),
        Err(err) => tracing::warn!(
            target: TARGET_TELEMETRY,
            kind = %kind,
            entries,
            error = %err,
            "telemetry send failed; dropping"
        ),
    }
}

/// Notify proceed, logging (never propagating) a failure.
pub fn proceed_or_log<H: StudyHost + ?Sized>(host: &mut H) {
    if let Err(err) = host.notify_proceed() {
        tracing::warn!(
            target: TARGET_TELEMETRY,
            error = %err,
            "proceed notification failed"
        );
    }
}

/// In-memory host that records everything it is sent.
#[derive(Debug, Default, Clone)]
pub struct RecordingHost {
    sent: Vec<TelemetryBatch>,
    proceed_count: usize,
    order: Vec<HostCall>,
}

/// One call observed by a [`RecordingHost`], in arrival order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostCall {
    Telemetry(TelemetryKind),
    Proceed,
}

impl RecordingHost {
    /// Create an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All batches, in send order.
    #[must_use]
    pub fn sent(&self) -> &[TelemetryBatch] {
        &self.sent
    }

    /// Batches of one kind, in send order.
    pub fn sent_of(&self, kind: TelemetryKind) -> impl Iterator<Item = &TelemetryBatch> + '_ {
        self.sent.iter().filter(move |b| b.kind() == kind)
    }

    /// How many times proceed was signalled.
    #[must_use]
    pub const fn proceed_count(&self) -> usize {
        self.proceed_count
    }

    /// Every call in arrival order.
    #[must_use]
    pub fn calls(&self) -> &[HostCall] {
        &self.order
    }
}

impl StudyHost for RecordingHost {
    fn send_telemetry(&mut self, batch: TelemetryBatch) -> Result<(), TelemetryError> {
        self.order.push(HostCall::Telemetry(batch.kind()));
        self.sent.push(batch);
        Ok(())
    }

    fn notify_proceed(&mut self) -> Result<(), TelemetryError> {
        self.order.push(HostCall::Proceed);
        self.proceed_count += 1;
        Ok(())
    }
}
