#![forbid(unsafe_code)]

//! Core: keystroke reconciliation and field progression for study forms.
//!
//! # Role in formtrack
//! `formtrack-core` is the state machine. It turns raw key presses, text
//! deltas, and clicks into a validated per-field edit log, gates which field
//! is active, and reports completion and click telemetry to a host.
//!
//! # Primary responsibilities
//! - **KeySignalFilter**: decides which key presses feed the edit queues.
//! - **InputReconciler**: joins key and delta signals into an assembled string.
//! - **ProgressionController**: owns the cursor and the completion cascade.
//! - **ClickClassifier**: logs every click against the active field.
//! - **StudyForm**: single-owner dispatcher tying the above together.
//!
//! # How it fits in the system
//! The core performs no I/O. Hosts implement [`StudyHost`]; the
//! `formtrack-web` crate provides the browser-side host and input parsing,
//! and [`SinkHost`] writes telemetry to a local file.

pub mod click;
pub mod clock;
pub mod config;
pub mod event;
pub mod field;
pub mod form;
pub mod key_filter;
pub mod logging;
pub mod progression;
pub mod reconciler;
pub mod sink;
pub mod study_plan;
pub mod telemetry;

pub use click::{ClickClassifier, ClickEvent, ClickRegion};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ConfigError, StudyConfig};
pub use event::{ClickTarget, FormEvent, KeyCode, KeyEvent, Modifiers, TextDelta};
pub use field::{Field, FieldKind, FieldSpec, FieldState};
pub use form::{Dispatched, StudyForm};
pub use key_filter::{KeySignalFilter, KeyVerdict};
pub use progression::{Advance, FormError, ProgressionController};
pub use reconciler::{EditEvent, InputReconciler, InputStatus, Validation};
pub use sink::{SinkConfig, SinkHost, TelemetrySink};
pub use study_plan::StudyPlan;
pub use telemetry::{
    RecordingHost, StudyHost, TelemetryBatch, TelemetryError, TelemetryKind,
};
