#![forbid(unsafe_code)]

//! Decoding of telemetry request bodies.
//!
//! The collaborator side of the wire: given the endpoint kind and the raw
//! body, rebuild the [`TelemetryBatch`] that was sent. Decoding is two-stage,
//! so callers can tell "not JSON" apart from "JSON of the wrong shape".
//! Unknown click locations decode to `OutOfBounds`.

use formtrack_core::click::{ClickEvent, ClickRegion};
use formtrack_core::telemetry::{
    FieldCompletion, KeystrokeRecord, TaskCompletion, TelemetryBatch, TelemetryKind,
};
use serde::Deserialize;
use serde::de::DeserializeOwned;

/// Errors decoding a request body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The body is not JSON.
    RequestNotValidJson(String),
    /// The body is JSON but not of the endpoint's shape.
    RequestDoesNotFollowSchema(String),
}

impl core::fmt::Display for ParseError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::RequestNotValidJson(msg) => write!(f, "request is not valid JSON: {msg}"),
            Self::RequestDoesNotFollowSchema(msg) => {
                write!(f, "request does not follow schema: {msg}")
            }
        }
    }
}

impl std::error::Error for ParseError {}

/// Session start request (`POST /start`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct StartRequest {
    pub user_id: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct RawField {
    timestamp_millis: u64,
    field_index: usize,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct RawTask {
    timestamp_millis: u64,
    task_index: i32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct RawClick {
    timestamp_millis: u64,
    location: String,
    was_correct: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct RawKeystroke {
    timestamp_millis: u64,
    was_correct: bool,
    key: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawProceed {}

fn decode<T: DeserializeOwned>(body: &str) -> Result<T, ParseError> {
    let value: serde_json::Value = serde_json::from_str(body)
        .map_err(|e| ParseError::RequestNotValidJson(e.to_string()))?;
    serde_json::from_value(value).map_err(|e| ParseError::RequestDoesNotFollowSchema(e.to_string()))
}

/// Decode the body of `POST /events/{kind}`.
pub fn decode_telemetry(kind: TelemetryKind, body: &str) -> Result<TelemetryBatch, ParseError> {
    let batch = match kind {
        TelemetryKind::Field => {
            let raw: RawField = decode(body)?;
            TelemetryBatch::Field(FieldCompletion {
                timestamp_millis: raw.timestamp_millis,
                field_index: raw.field_index,
            })
        }
        TelemetryKind::Task => {
            let raw: RawTask = decode(body)?;
            TelemetryBatch::Task(TaskCompletion {
                timestamp_millis: raw.timestamp_millis,
                task_index: raw.task_index,
            })
        }
        TelemetryKind::Click => {
            let raw: Vec<RawClick> = decode(body)?;
            TelemetryBatch::Click(
                raw.into_iter()
                    .map(|c| ClickEvent {
                        timestamp_millis: c.timestamp_millis,
                        location: ClickRegion::from_wire(&c.location),
                        was_correct: c.was_correct,
                    })
                    .collect(),
            )
        }
        TelemetryKind::Keystroke => {
            let raw: Vec<RawKeystroke> = decode(body)?;
            TelemetryBatch::Keystroke(
                raw.into_iter()
                    .map(|k| KeystrokeRecord {
                        timestamp_millis: k.timestamp_millis,
                        was_correct: k.was_correct,
                        key: k.key,
                    })
                    .collect(),
            )
        }
    };
    Ok(batch)
}

/// Endpoint kind for a request path, if it is a telemetry endpoint.
#[must_use]
pub fn kind_for_path(path: &str) -> Option<TelemetryKind> {
    [
        TelemetryKind::Field,
        TelemetryKind::Task,
        TelemetryKind::Click,
        TelemetryKind::Keystroke,
    ]
    .into_iter()
    .find(|k| k.endpoint() == path)
}

/// Decode the body of `POST /start`.
pub fn decode_start(body: &str) -> Result<StartRequest, ParseError> {
    decode(body)
}

/// Validate the body of `POST /proceed` (`{}`).
pub fn decode_proceed(body: &str) -> Result<(), ParseError> {
    decode::<RawProceed>(body).map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn field_body() {
        assert_eq!(
            decode_telemetry(TelemetryKind::Field, r#"{"timestampMillis":5,"fieldIndex":1}"#),
            Ok(TelemetryBatch::Field(FieldCompletion {
                timestamp_millis: 5,
                field_index: 1
            }))
        );
    }

    #[test]
    fn task_body_accepts_placeholder_index() {
        assert_eq!(
            decode_telemetry(TelemetryKind::Task, r#"{"timestampMillis":5,"taskIndex":-1}"#),
            Ok(TelemetryBatch::Task(TaskCompletion {
                timestamp_millis: 5,
                task_index: -1
            }))
        );
    }

    #[test]
    fn click_unknown_location_is_out_of_bounds() {
        let batch = decode_telemetry(
            TelemetryKind::Click,
            r#"[{"timestampMillis":1,"location":"Sidebar","wasCorrect":false},
                {"timestampMillis":2,"location":"Button","wasCorrect":true}]"#,
        )
        .unwrap();
        assert_eq!(
            batch,
            TelemetryBatch::Click(vec![
                ClickEvent {
                    timestamp_millis: 1,
                    location: ClickRegion::OutOfBounds,
                    was_correct: false
                },
                ClickEvent {
                    timestamp_millis: 2,
                    location: ClickRegion::Button,
                    was_correct: true
                },
            ])
        );
    }

    #[test]
    fn keystroke_body() {
        let batch = decode_telemetry(
            TelemetryKind::Keystroke,
            r#"[{"timestampMillis":3,"wasCorrect":true,"key":"a"}]"#,
        )
        .unwrap();
        assert_eq!(batch.len(), 1);
    }

    #[test]
    fn not_json_vs_wrong_shape() {
        assert!(matches!(
            decode_telemetry(TelemetryKind::Field, "{oops"),
            Err(ParseError::RequestNotValidJson(_))
        ));
        assert!(matches!(
            decode_telemetry(TelemetryKind::Field, r#"{"timestampMillis":"soon"}"#),
            Err(ParseError::RequestDoesNotFollowSchema(_))
        ));
        assert!(matches!(
            decode_telemetry(TelemetryKind::Click, r#"{"timestampMillis":1}"#),
            Err(ParseError::RequestDoesNotFollowSchema(_))
        ));
    }

    #[test]
    fn unknown_members_are_rejected() {
        assert!(matches!(
            decode_start(r#"{"userId":3,"extra":true}"#),
            Err(ParseError::RequestDoesNotFollowSchema(_))
        ));
        assert_eq!(decode_start(r#"{"userId":3}"#), Ok(StartRequest { user_id: 3 }));
    }

    #[test]
    fn proceed_body() {
        assert_eq!(decode_proceed("{}"), Ok(()));
        assert!(decode_proceed(r#"{"go":true}"#).is_err());
        assert!(decode_proceed("null").is_err());
    }

    #[test]
    fn paths_map_to_kinds() {
        assert_eq!(kind_for_path("/events/click"), Some(TelemetryKind::Click));
        assert_eq!(kind_for_path("/proceed"), None);
    }

    #[test]
    fn encode_decode_agree() {
        let batch = TelemetryBatch::Keystroke(vec![KeystrokeRecord {
            timestamp_millis: 8,
            was_correct: false,
            key: "Backspace".into(),
        }]);
        let body = batch.to_json_body().unwrap();
        assert_eq!(decode_telemetry(TelemetryKind::Keystroke, &body), Ok(batch));
    }
}
