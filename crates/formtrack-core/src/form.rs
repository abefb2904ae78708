#![forbid(unsafe_code)]

//! Study form dispatcher.
//!
//! [`StudyForm`] is the single owner of all mutable study state. The host
//! delivers one [`FormEvent`] at a time; each handler takes `&mut self` and
//! runs its full cascade (pairing, validation, completion, progression,
//! telemetry) before returning.
//!
//! ```rust,ignore
//! let mut form = StudyForm::new(specs, &config.form, host, SystemClock)?;
//! form.dispatch(FormEvent::Key { field: 0, event: KeyEvent::new(KeyCode::Char('c')) });
//! form.dispatch(FormEvent::Text { field: 0, delta: TextDelta::insert_char('c') });
//! ```

use crate::click::{ClickClassifier, ClickEvent};
use crate::clock::Clock;
use crate::config::FormConfig;
use crate::event::{ClickTarget, FormEvent, KeyEvent, TextDelta};
use crate::field::{FieldKind, FieldSpec};
use crate::key_filter::KeyVerdict;
use crate::logging::TARGET_PROGRESSION;
use crate::progression::{FormError, ProgressionController};
use crate::reconciler::{InputStatus, Validation};
use crate::telemetry::StudyHost;

/// What a dispatched event produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatched {
    /// Filter verdict for a key press.
    Key(KeyVerdict),
    /// Validation for a text delta, if one was computed.
    Text(Option<Validation>),
    /// The recorded click.
    Click(ClickEvent),
}

/// One instrumented form bound to a host and a clock.
#[derive(Debug)]
pub struct StudyForm<H: StudyHost, C: Clock> {
    progression: ProgressionController,
    classifier: ClickClassifier,
    host: H,
    clock: C,
}

impl<H: StudyHost, C: Clock> StudyForm<H, C> {
    /// Build the form and unlock its first field.
    pub fn new(
        specs: Vec<FieldSpec>,
        config: &FormConfig,
        host: H,
        clock: C,
    ) -> Result<Self, FormError> {
        let progression = ProgressionController::new(specs, config.task_index)?;
        let classifier = ClickClassifier::from_fields(progression.fields());
        Ok(Self {
            progression,
            classifier,
            host,
            clock,
        })
    }

    /// Deliver a key press to `field`.
    pub fn on_key(&mut self, field: usize, key: &KeyEvent) -> KeyVerdict {
        let now = self.clock.now_millis();
        self.progression.on_key(field, key, &mut self.host, now)
    }

    /// Deliver a text delta to `field`.
    pub fn on_text_delta(&mut self, field: usize, delta: TextDelta) -> Option<Validation> {
        let now = self.clock.now_millis();
        self.progression
            .on_content_delta(field, delta, &mut self.host, now)
    }

    /// Record a click; a correct click on the active action field completes it.
    pub fn on_click(&mut self, target: &ClickTarget) -> ClickEvent {
        let now = self.clock.now_millis();
        let click = self.classifier.on_click(target, &mut self.progression, now);
        if !click.was_correct {
            return click;
        }
        let action = self
            .classifier
            .resolve(target)
            .filter(|&i| self.progression.field(i).is_some_and(|f| f.kind() == FieldKind::Action));
        if let Some(index) = action {
            self.progression.activate(index, &mut self.host, now);
        }
        click
    }

    /// Route one event.
    pub fn dispatch(&mut self, event: FormEvent) -> Dispatched {
        let span = tracing::debug_span!(
            target: TARGET_PROGRESSION,
            "dispatch",
            cursor = self.progression.cursor()
        );
        let _guard = span.enter();
        match event {
            FormEvent::Key { field, event } => Dispatched::Key(self.on_key(field, &event)),
            FormEvent::Text { field, delta } => Dispatched::Text(self.on_text_delta(field, delta)),
            FormEvent::Click(target) => Dispatched::Click(self.on_click(&target)),
        }
    }

    #[must_use]
    pub const fn progression(&self) -> &ProgressionController {
        &self.progression
    }

    #[must_use]
    pub const fn cursor(&self) -> usize {
        self.progression.cursor()
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.progression.is_finished()
    }

    /// Observable status of one field.
    #[must_use]
    pub fn status(&self, field: usize) -> Option<InputStatus> {
        self.progression.field(field).map(|f| f.status())
    }

    /// Assembled string of a text field.
    #[must_use]
    pub fn assembled(&self, field: usize) -> Option<&str> {
        self.progression
            .field(field)
            .and_then(|f| f.reconciler())
            .map(|r| r.assembled())
    }

    #[must_use]
    pub const fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }

    /// Take the host back, dropping the form.
    pub fn into_host(self) -> H {
        self.host
    }
}
