//! Browser-shaped end-to-end flow: manifest in, encoded events in, HTTP
//! requests out, decoded back on the collaborator side.

use formtrack_core::clock::ManualClock;
use formtrack_core::config::FormConfig;
use formtrack_core::telemetry::TelemetryBatch;
use formtrack_core::{ClickRegion, KeyCode, TelemetryKind};
use formtrack_web::wire::{decode_proceed, decode_telemetry, kind_for_path};
use formtrack_web::{PROCEED_PATH, WebStudySession};
use pretty_assertions::assert_eq;

const MANIFEST: &str = r#"[
    {"index": 0, "kind": "text", "element": "first-name", "expected": "  Jo \n"},
    {"index": 1, "kind": "button", "element": "continue"}
]"#;

fn session() -> WebStudySession<ManualClock> {
    WebStudySession::from_manifest(MANIFEST, &FormConfig { task_index: 1 }, ManualClock::new(50))
        .unwrap()
}

fn key(c: &str) -> String {
    format!(r#"{{"kind":"key","key":"{c}","mods":0,"field":0}}"#)
}

fn insert(c: &str) -> String {
    format!(r#"{{"kind":"input","inputType":"insertText","data":"{c}","field":0}}"#)
}

#[test]
fn full_task_produces_decodable_requests() {
    let mut s = session();
    assert_eq!(s.input_state(0), Some("progress"));
    assert_eq!(s.input_state(1), Some("locked"));

    s.push_encoded(r#"{"kind":"click","target":"first-name","inBounds":true}"#)
        .unwrap();
    s.push_encoded(&key("J")).unwrap();
    s.push_encoded(&insert("J")).unwrap();
    s.push_encoded(&key("x")).unwrap();
    s.push_encoded(&insert("x")).unwrap();
    assert_eq!(s.input_state(0), Some("error"));

    s.push_encoded(&key("Backspace")).unwrap();
    s.push_encoded(r#"{"kind":"input","inputType":"deleteContentBackward","data":null,"field":0}"#)
        .unwrap();
    s.push_encoded(&key("ArrowLeft")).unwrap();
    s.push_encoded(&key("o")).unwrap();
    s.push_encoded(&insert("o")).unwrap();
    assert_eq!(s.input_state(0), Some("completed"));
    assert_eq!(s.input_state(1), Some("progress"));

    s.push_encoded(r#"{"kind":"click","target":null,"inBounds":false}"#)
        .unwrap();
    s.push_encoded(r#"{"kind":"click","target":"continue","inBounds":true}"#)
        .unwrap();
    assert!(s.is_finished());

    let requests = s.drain_requests();
    let paths: Vec<_> = requests.iter().map(|r| r.path).collect();
    assert_eq!(
        paths,
        vec![
            "/events/keystroke",
            "/events/field",
            "/events/field",
            "/events/click",
            "/events/task",
            PROCEED_PATH,
        ]
    );

    let mut decoded = Vec::new();
    for request in &requests {
        match kind_for_path(request.path) {
            Some(kind) => decoded.push(decode_telemetry(kind, &request.body).unwrap()),
            None => decode_proceed(&request.body).unwrap(),
        }
    }

    match &decoded[0] {
        TelemetryBatch::Keystroke(keys) => {
            let names: Vec<_> = keys.iter().map(|k| k.key.as_str()).collect();
            assert_eq!(names, vec!["J", "x", "o"]);
            let correct: Vec<_> = keys.iter().map(|k| k.was_correct).collect();
            assert_eq!(correct, vec![true, false, true]);
        }
        other => panic!("expected keystrokes, got {other:?}"),
    }
    match &decoded[3] {
        TelemetryBatch::Click(clicks) => {
            let regions: Vec<_> = clicks.iter().map(|c| (c.location, c.was_correct)).collect();
            assert_eq!(
                regions,
                vec![
                    (ClickRegion::TextField, true),
                    (ClickRegion::OutOfBounds, false),
                    (ClickRegion::Button, true),
                ]
            );
        }
        other => panic!("expected clicks, got {other:?}"),
    }
    assert_eq!(decoded[4].kind(), TelemetryKind::Task);
    assert!(s.drain_requests().is_empty());
}

#[test]
fn ignored_and_rejected_inputs() {
    let mut s = session();
    assert_eq!(s.push_encoded(r#"{"kind":"focus"}"#).unwrap(), None);
    assert!(s.push_encoded("not json").is_err());
    assert!(s.push_encoded(r#"{"kind":"key","key":"a"}"#).is_err());
    assert!(s.drain_requests().is_empty());
}

#[test]
fn bad_manifest_is_reported() {
    let err =
        WebStudySession::from_manifest("[]", &FormConfig::default(), ManualClock::default())
            .unwrap_err();
    assert_eq!(err.to_string(), "form: form has no fields");

    let gap = r#"[{"index":0,"kind":"button","element":"a"},{"index":2,"kind":"button","element":"b"}]"#;
    let err = WebStudySession::from_manifest(gap, &FormConfig::default(), ManualClock::default())
        .unwrap_err();
    assert_eq!(err.to_string(), "form: field index 2 found where 1 was expected");

    let dup = r#"[{"index":0,"kind":"button","element":"a"},{"index":1,"kind":"button","element":"a"}]"#;
    assert!(
        WebStudySession::from_manifest(dup, &FormConfig::default(), ManualClock::default())
            .is_err()
    );
}

#[test]
fn multi_scalar_key_name_shifts_pairing_by_one() {
    // "❤️" is two scalar values, so its key name is not a printable key and
    // is suppressed, while its insertion still arrives. Later keys pair with
    // the preceding delta.
    let mut s = session();
    s.push_encoded(&key("❤️")).unwrap();
    s.push_encoded(&insert("❤️")).unwrap();
    s.push_encoded(&key("a")).unwrap();
    s.push_encoded(&insert("a")).unwrap();

    let reconciler = s.form().progression().field(0).unwrap().reconciler().unwrap();
    assert_eq!(reconciler.assembled(), "❤\u{fe0f}");
    assert_eq!(reconciler.pending(), (0, 1));
    let keys: Vec<_> = reconciler.edit_log().iter().map(|e| e.key).collect();
    assert_eq!(keys, vec![Some(KeyCode::Char('a'))]);
}
