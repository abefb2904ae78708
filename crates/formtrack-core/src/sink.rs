#![forbid(unsafe_code)]

//! Line-oriented telemetry sink for local capture.
//!
//! [`TelemetrySink`] is a shared writer (stdout or an append-only file) that
//! records every batch either as a JSONL envelope or as the delimited log
//! lines of the study server (`Click;<ts>;<location>;<wasCorrect>`). Writes
//! are serialized behind a mutex, so line order equals call order.
//!
//! [`SinkHost`] adapts a sink to the [`StudyHost`] contract, which lets a
//! form run headless with its telemetry written to disk. When given a
//! [`StudyPlan`], each proceed notification moves the plan forward.

use std::fs::OpenOptions;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use crate::study_plan::StudyPlan;
use crate::telemetry::{StudyHost, TelemetryBatch, TelemetryError};

/// Schema tag carried by every JSONL line.
pub const TELEMETRY_SCHEMA_VERSION: &str = "formtrack-telemetry-v1";

/// Output destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkDestination {
    /// Write to stdout.
    Stdout,
    /// Append to a file at the given path.
    File(PathBuf),
}

impl SinkDestination {
    #[must_use]
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::File(path.into())
    }
}

/// Line format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SinkFormat {
    /// `{"schema":…,"kind":…,"payload":…}` per batch.
    #[default]
    Jsonl,
    /// `;`-delimited lines, one per entry.
    Delimited,
}

/// Sink configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkConfig {
    /// Whether the sink is enabled.
    pub enabled: bool,
    pub destination: SinkDestination,
    pub format: SinkFormat,
    /// Flush after every line.
    pub flush_on_write: bool,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            destination: SinkDestination::Stdout,
            format: SinkFormat::Jsonl,
            flush_on_write: true,
        }
    }
}

impl SinkConfig {
    /// Disabled config.
    #[must_use]
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Enabled, writing to stdout.
    #[must_use]
    pub fn enabled_stdout() -> Self {
        Self {
            enabled: true,
            ..Self::default()
        }
    }

    /// Enabled, appending to `path`.
    #[must_use]
    pub fn enabled_file(path: impl Into<PathBuf>) -> Self {
        Self {
            enabled: true,
            destination: SinkDestination::file(path),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_format(mut self, format: SinkFormat) -> Self {
        self.format = format;
        self
    }

    #[must_use]
    pub fn with_flush_on_write(mut self, enabled: bool) -> Self {
        self.flush_on_write = enabled;
        self
    }
}

struct SinkInner {
    writer: BufWriter<Box<dyn Write + Send>>,
    flush_on_write: bool,
}

/// Shared line-oriented telemetry writer.
#[derive(Clone)]
pub struct TelemetrySink {
    inner: Arc<Mutex<SinkInner>>,
    format: SinkFormat,
}

impl std::fmt::Debug for TelemetrySink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelemetrySink")
            .field("format", &self.format)
            .finish()
    }
}

impl TelemetrySink {
    /// Build from config. Returns `Ok(None)` when disabled.
    pub fn from_config(config: &SinkConfig) -> io::Result<Option<Self>> {
        if !config.enabled {
            return Ok(None);
        }

        let writer: Box<dyn Write + Send> = match &config.destination {
            SinkDestination::Stdout => Box::new(io::stdout()),
            SinkDestination::File(path) => {
                let file = OpenOptions::new().create(true).append(true).open(path)?;
                Box::new(file)
            }
        };

        Ok(Some(Self::from_writer(
            writer,
            config.format,
            config.flush_on_write,
        )))
    }

    /// Wrap an arbitrary writer.
    #[must_use]
    pub fn from_writer(
        writer: Box<dyn Write + Send>,
        format: SinkFormat,
        flush_on_write: bool,
    ) -> Self {
        Self {
            inner: Arc::new(Mutex::new(SinkInner {
                writer: BufWriter::new(writer),
                flush_on_write,
            })),
            format,
        }
    }

    #[must_use]
    pub const fn format(&self) -> SinkFormat {
        self.format
    }

    /// Record one batch in the configured format.
    pub fn write_batch(&self, batch: &TelemetryBatch) -> Result<(), TelemetryError> {
        match self.format {
            SinkFormat::Jsonl => {
                let payload = serde_json::to_value(batch).map_err(TelemetryError::Encode)?;
                let line = serde_json::json!({
                    "schema": TELEMETRY_SCHEMA_VERSION,
                    "kind": batch.kind(),
                    "payload": payload,
                });
                self.write_lines(&[line.to_string()])?;
            }
            SinkFormat::Delimited => self.write_lines(&batch.log_lines())?,
        }
        Ok(())
    }

    /// Record the proceed notification.
    pub fn write_proceed(&self) -> Result<(), TelemetryError> {
        let line = match self.format {
            SinkFormat::Jsonl => serde_json::json!({
                "schema": TELEMETRY_SCHEMA_VERSION,
                "kind": "proceed",
            })
            .to_string(),
            SinkFormat::Delimited => "Proceed".to_owned(),
        };
        self.write_lines(&[line])?;
        Ok(())
    }

    fn write_lines(&self, lines: &[String]) -> io::Result<()> {
        let mut inner = match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        for line in lines {
            inner.writer.write_all(line.as_bytes())?;
            inner.writer.write_all(b"\n")?;
        }
        if inner.flush_on_write {
            inner.writer.flush()?;
        }
        Ok(())
    }

    /// Flush buffered output.
    pub fn flush(&self) -> io::Result<()> {
        let mut inner = match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        inner.writer.flush()
    }
}

/// [`StudyHost`] that writes everything to a [`TelemetrySink`].
#[derive(Debug, Clone)]
pub struct SinkHost {
    sink: TelemetrySink,
    proceeded: bool,
    plan: Option<StudyPlan>,
}

impl SinkHost {
    #[must_use]
    pub const fn new(sink: TelemetrySink) -> Self {
        Self {
            sink,
            proceeded: false,
            plan: None,
        }
    }

    /// Drive `plan` from proceed notifications.
    #[must_use]
    pub fn with_plan(mut self, plan: StudyPlan) -> Self {
        self.plan = Some(plan);
        self
    }

    #[must_use]
    pub const fn plan(&self) -> Option<&StudyPlan> {
        self.plan.as_ref()
    }

    #[must_use]
    pub const fn sink(&self) -> &TelemetrySink {
        &self.sink
    }

    /// True once proceed was notified.
    #[must_use]
    pub const fn proceeded(&self) -> bool {
        self.proceeded
    }
}

impl StudyHost for SinkHost {
    fn send_telemetry(&mut self, batch: TelemetryBatch) -> Result<(), TelemetryError> {
        self.sink.write_batch(&batch)
    }

    fn notify_proceed(&mut self) -> Result<(), TelemetryError> {
        self.proceeded = true;
        if let Some(plan) = &mut self.plan {
            plan.proceed();
        }
        self.sink.write_proceed()
    }
}
