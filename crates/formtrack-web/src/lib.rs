#![forbid(unsafe_code)]

//! `formtrack-web` adapts the study form core to a browser page.
//!
//! Design goals:
//! - **Host-driven I/O**: the page script pushes encoded events in and drains
//!   outbound HTTP requests out. Nothing here blocks or spawns.
//! - **Plain data at the boundary**: inputs are JSON strings, outputs are
//!   `(path, body)` pairs the script `fetch`es as-is.
//!
//! This crate does not bind to `wasm-bindgen`; a thin JS shim wraps
//! [`WebStudySession`].

pub mod input_parser;
pub mod page;
pub mod wire;

use std::collections::VecDeque;

use formtrack_core::clock::Clock;
use formtrack_core::config::FormConfig;
use formtrack_core::form::{Dispatched, StudyForm};
use formtrack_core::logging::TARGET_WEB;
use formtrack_core::progression::FormError;
use formtrack_core::reconciler::InputStatus;
use formtrack_core::telemetry::{StudyHost, TelemetryBatch, TelemetryError};

use crate::input_parser::{InputParseError, parse_encoded_input_to_event};
use crate::page::{ManifestError, parse_manifest};

/// Path of the proceed notification.
pub const PROCEED_PATH: &str = "/proceed";

/// One HTTP request for the page script to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundRequest {
    /// Endpoint path, e.g. `/events/click`.
    pub path: &'static str,
    /// JSON body.
    pub body: String,
}

/// [`StudyHost`] that queues requests for the page script.
#[derive(Debug, Default, Clone)]
pub struct WebStudyHost {
    outbound: VecDeque<OutboundRequest>,
    proceeded: bool,
}

impl WebStudyHost {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of queued requests.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.outbound.len()
    }

    /// Drain all queued requests in send order.
    pub fn drain_requests(&mut self) -> impl Iterator<Item = OutboundRequest> + '_ {
        self.outbound.drain(..)
    }

    /// True once proceed was notified.
    #[must_use]
    pub const fn proceeded(&self) -> bool {
        self.proceeded
    }
}

impl StudyHost for WebStudyHost {
    fn send_telemetry(&mut self, batch: TelemetryBatch) -> Result<(), TelemetryError> {
        let body = batch.to_json_body()?;
        self.outbound.push_back(OutboundRequest {
            path: batch.kind().endpoint(),
            body,
        });
        Ok(())
    }

    fn notify_proceed(&mut self) -> Result<(), TelemetryError> {
        self.proceeded = true;
        self.outbound.push_back(OutboundRequest {
            path: PROCEED_PATH,
            body: "{}".to_owned(),
        });
        Ok(())
    }
}

/// Errors starting a web session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// The manifest could not be parsed.
    Manifest(ManifestError),
    /// The fields do not form a valid form.
    Form(FormError),
}

impl core::fmt::Display for SessionError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Manifest(e) => write!(f, "manifest: {e}"),
            Self::Form(e) => write!(f, "form: {e}"),
        }
    }
}

impl std::error::Error for SessionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Manifest(e) => Some(e),
            Self::Form(e) => Some(e),
        }
    }
}

impl From<ManifestError> for SessionError {
    fn from(e: ManifestError) -> Self {
        Self::Manifest(e)
    }
}

impl From<FormError> for SessionError {
    fn from(e: FormError) -> Self {
        Self::Form(e)
    }
}

/// A study form driven by encoded browser events.
#[derive(Debug)]
pub struct WebStudySession<C: Clock> {
    form: StudyForm<WebStudyHost, C>,
}

impl<C: Clock> WebStudySession<C> {
    /// Start a session from a page manifest.
    pub fn from_manifest(
        manifest_json: &str,
        config: &FormConfig,
        clock: C,
    ) -> Result<Self, SessionError> {
        let specs = parse_manifest(manifest_json)?;
        let form = StudyForm::new(specs, config, WebStudyHost::new(), clock)?;
        tracing::info!(
            target: TARGET_WEB,
            fields = form.progression().total_fields(),
            "web session started"
        );
        Ok(Self { form })
    }

    /// Parse and dispatch one encoded event.
    ///
    /// `Ok(None)` means the event kind carries nothing for the form.
    pub fn push_encoded(&mut self, json: &str) -> Result<Option<Dispatched>, InputParseError> {
        match parse_encoded_input_to_event(json) {
            Ok(Some(event)) => Ok(Some(self.form.dispatch(event))),
            Ok(None) => Ok(None),
            Err(err) => {
                tracing::warn!(target: TARGET_WEB, error = %err, "encoded input rejected");
                Err(err)
            }
        }
    }

    /// Drain queued HTTP requests.
    pub fn drain_requests(&mut self) -> Vec<OutboundRequest> {
        self.form.host_mut().drain_requests().collect()
    }

    /// `data-input-state` attribute value for a field.
    #[must_use]
    pub fn input_state(&self, field: usize) -> Option<&'static str> {
        self.form.status(field).map(InputStatus::as_str)
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.form.is_finished()
    }

    #[must_use]
    pub const fn form(&self) -> &StudyForm<WebStudyHost, C> {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut StudyForm<WebStudyHost, C> {
        &mut self.form
    }
}
