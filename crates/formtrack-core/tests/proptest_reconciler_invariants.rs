//! Property-based invariant tests for input reconciliation and progression.
//!
//! 1. Without backspace, the assembled string is the concatenation of deltas
//! 2. Backspace removes the last unit and records no edit
//! 3. Status always reflects the current assembled string
//! 4. The no-insertion marker never changes state
//! 5. Arrival order (key or delta first) does not change the result
//! 6. The cursor only moves forward, one field at a time

use formtrack_core::config::FormConfig;
use formtrack_core::{
    ClickTarget, FieldSpec, FormEvent, InputStatus, KeyCode, KeyEvent, ManualClock,
    RecordingHost, StudyForm, TextDelta,
};
use proptest::prelude::*;

type Form = StudyForm<RecordingHost, ManualClock>;

// ── Strategies ──────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
enum Op {
    Type { c: char, delta_first: bool },
    Backspace,
    NoInsertion,
}

fn char_strategy() -> impl Strategy<Value = char> {
    prop_oneof![Just('a'), Just('b'), Just('c'), Just('é'), Just('ß')]
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (char_strategy(), any::<bool>()).prop_map(|(c, delta_first)| Op::Type { c, delta_first }),
        1 => Just(Op::Backspace),
        1 => Just(Op::NoInsertion),
    ]
}

fn single_field(target: &str) -> Form {
    StudyForm::new(
        vec![FieldSpec::text(0, "f", target)],
        &FormConfig::default(),
        RecordingHost::new(),
        ManualClock::new(0),
    )
    .unwrap()
}

fn edits(form: &Form) -> usize {
    form.progression()
        .field(0)
        .and_then(|f| f.reconciler())
        .map_or(0, |r| r.edit_log().len())
}

/// Apply one op; returns false when the op was skipped.
fn apply(form: &mut Form, op: &Op) -> bool {
    match *op {
        Op::Type { c, delta_first } => {
            let key = FormEvent::Key {
                field: 0,
                event: KeyEvent::new(KeyCode::Char(c)),
            };
            let delta = FormEvent::Text {
                field: 0,
                delta: TextDelta::insert_char(c),
            };
            if delta_first {
                form.dispatch(delta);
                form.dispatch(key);
            } else {
                form.dispatch(key);
                form.dispatch(delta);
            }
        }
        Op::Backspace => {
            // The platform emits no delta for a backspace on an empty field.
            if form.assembled(0).is_none_or(str::is_empty) {
                return false;
            }
            form.dispatch(FormEvent::Key {
                field: 0,
                event: KeyEvent::new(KeyCode::Backspace),
            });
            form.dispatch(FormEvent::Text {
                field: 0,
                delta: TextDelta::DeleteBackward,
            });
        }
        Op::NoInsertion => {
            form.dispatch(FormEvent::Text {
                field: 0,
                delta: TextDelta::None,
            });
        }
    }
    form.clock_mut().advance(1);
    true
}

// ═══════════════════════════════════════════════════════════════════════
// 1. Concatenation without backspace
// ═══════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn assembled_is_concat_without_backspace(
        chars in proptest::collection::vec((char_strategy(), any::<bool>()), 0..40),
    ) {
        // '#' never appears in the input, so the field never completes.
        let mut form = single_field("#");
        let mut expected = String::new();
        for (c, delta_first) in chars {
            apply(&mut form, &Op::Type { c, delta_first });
            expected.push(c);
            prop_assert_eq!(form.assembled(0), Some(expected.as_str()));
            prop_assert_eq!(edits(&form), expected.chars().count());
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// 2-4. Model check with backspace and no-insertion markers
// ═══════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn matches_string_model(ops in proptest::collection::vec(op_strategy(), 0..60)) {
        let mut form = single_field("#");
        let mut model = String::new();
        let mut inserts = 0usize;

        for op in &ops {
            let before = form.assembled(0).map(str::to_owned);
            if !apply(&mut form, op) {
                continue;
            }
            match op {
                Op::Type { c, .. } => {
                    model.push(*c);
                    inserts += 1;
                }
                Op::Backspace => {
                    model.pop();
                }
                Op::NoInsertion => {
                    prop_assert_eq!(form.assembled(0).map(str::to_owned), before);
                }
            }
            prop_assert_eq!(form.assembled(0), Some(model.as_str()));
            prop_assert_eq!(edits(&form), inserts);

            let status = form.status(0).unwrap();
            let expected = if "#".starts_with(model.as_str()) {
                InputStatus::Progress
            } else {
                InputStatus::Error
            };
            prop_assert_eq!(status, expected);
        }
    }

    #[test]
    fn status_tracks_target_prefix(ops in proptest::collection::vec(op_strategy(), 0..60)) {
        let target = "abcab";
        let mut form = single_field(target);
        for op in &ops {
            apply(&mut form, op);
            if form.is_finished() {
                prop_assert_eq!(form.status(0), Some(InputStatus::Completed));
                prop_assert_eq!(form.assembled(0), Some(target));
                break;
            }
            let assembled = form.assembled(0).unwrap();
            let expected = if target.starts_with(assembled) {
                InputStatus::Progress
            } else {
                InputStatus::Error
            };
            prop_assert_eq!(form.status(0), Some(expected));
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// 6. Cursor monotonicity
// ═══════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn cursor_only_moves_forward(
        n in 1usize..8,
        clicks in proptest::collection::vec(0usize..10, 0..40),
    ) {
        let specs = (0..n).map(|i| FieldSpec::action(i, format!("b{i}"))).collect();
        let mut form = StudyForm::new(
            specs,
            &FormConfig::default(),
            RecordingHost::new(),
            ManualClock::new(0),
        )
        .unwrap();

        let mut last = form.cursor();
        for target in clicks {
            form.dispatch(FormEvent::Click(ClickTarget::element(format!("b{target}"))));
            let now = form.cursor();
            prop_assert!(now == last || now == last + 1, "{last} -> {now}");
            prop_assert!(now <= n);
            last = now;
        }
        prop_assert!(form.host().proceed_count() <= 1);
        prop_assert_eq!(form.host().proceed_count() == 1, form.is_finished());
    }
}
