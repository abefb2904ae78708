#![forbid(unsafe_code)]

//! Study form fields.
//!
//! A field is either a text field (with a target string and its own
//! [`InputReconciler`]) or an action field (a button). Fields move through
//! `Locked → Active → Completed` exactly once each and never revert.

use crate::reconciler::{InputReconciler, InputStatus};

/// Field type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// Text entry with a target string.
    Text,
    /// Button that completes on a correct activation.
    Action,
}

/// Activation state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FieldState {
    /// Not yet reached by the progression cursor.
    #[default]
    Locked,
    /// The unique field the cursor points at.
    Active,
    /// Finished; accepts nothing further.
    Completed,
}

/// Declarative description of one field, as read from page markup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    /// Position in the progression order.
    pub index: usize,
    /// Host element identifier used to resolve clicks.
    pub element: String,
    /// Target string for text fields; `None` for action fields.
    pub expected: Option<String>,
}

impl FieldSpec {
    /// A text field. The target is trimmed when the field is built.
    #[must_use]
    pub fn text(index: usize, element: impl Into<String>, expected: impl Into<String>) -> Self {
        Self {
            index,
            element: element.into(),
            expected: Some(expected.into()),
        }
    }

    /// An action field.
    #[must_use]
    pub fn action(index: usize, element: impl Into<String>) -> Self {
        Self {
            index,
            element: element.into(),
            expected: None,
        }
    }

    /// `Text` when a target string is present, otherwise `Action`.
    #[must_use]
    pub fn kind(&self) -> FieldKind {
        match self.expected {
            Some(_) => FieldKind::Text,
            None => FieldKind::Action,
        }
    }
}

/// Per-kind input state.
#[derive(Debug, Clone)]
pub enum FieldInput {
    Text(InputReconciler),
    Action,
}

/// A live field.
#[derive(Debug, Clone)]
pub struct Field {
    index: usize,
    element: String,
    state: FieldState,
    input: FieldInput,
}

impl Field {
    pub(crate) fn from_spec(spec: FieldSpec) -> Self {
        let input = match spec.expected {
            Some(expected) => FieldInput::Text(InputReconciler::new(spec.index, &expected)),
            None => FieldInput::Action,
        };
        Self {
            index: spec.index,
            element: spec.element,
            state: FieldState::Locked,
            input,
        }
    }

    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    #[must_use]
    pub fn element(&self) -> &str {
        &self.element
    }

    #[must_use]
    pub const fn state(&self) -> FieldState {
        self.state
    }

    #[must_use]
    pub fn kind(&self) -> FieldKind {
        match self.input {
            FieldInput::Text(_) => FieldKind::Text,
            FieldInput::Action => FieldKind::Action,
        }
    }

    /// The reconciler of a text field.
    #[must_use]
    pub fn reconciler(&self) -> Option<&InputReconciler> {
        match &self.input {
            FieldInput::Text(r) => Some(r),
            FieldInput::Action => None,
        }
    }

    pub(crate) fn reconciler_mut(&mut self) -> Option<&mut InputReconciler> {
        match &mut self.input {
            FieldInput::Text(r) => Some(r),
            FieldInput::Action => None,
        }
    }

    /// Observable status; action fields report `Locked`/`Progress`/`Completed`
    /// from their activation state.
    #[must_use]
    pub fn status(&self) -> InputStatus {
        match (&self.input, self.state) {
            (FieldInput::Text(r), _) => r.status(),
            (FieldInput::Action, FieldState::Locked) => InputStatus::Locked,
            (FieldInput::Action, FieldState::Active) => InputStatus::Progress,
            (FieldInput::Action, FieldState::Completed) => InputStatus::Completed,
        }
    }

    /// Locked → Active. Text fields start accepting input with status Progress.
    pub(crate) fn activate(&mut self) {
        debug_assert_eq!(self.state, FieldState::Locked, "field {} re-activated", self.index);
        if self.state != FieldState::Locked {
            return;
        }
        self.state = FieldState::Active;
        if let FieldInput::Text(r) = &mut self.input {
            r.unlock();
        }
    }

    /// Active → Completed. A text field stops accepting input.
    pub(crate) fn complete(&mut self) {
        if self.state != FieldState::Active {
            return;
        }
        self.state = FieldState::Completed;
        if let FieldInput::Text(r) = &mut self.input {
            r.detach();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spec_kind() {
        assert_eq!(FieldSpec::text(0, "name", "Bob").kind(), FieldKind::Text);
        assert_eq!(FieldSpec::action(1, "submit").kind(), FieldKind::Action);
    }

    #[test]
    fn text_field_target_is_trimmed() {
        let field = Field::from_spec(FieldSpec::text(0, "name", "\n   Jeremiah  \n"));
        assert_eq!(field.reconciler().unwrap().target(), "Jeremiah");
    }

    #[test]
    fn lifecycle_locked_active_completed() {
        let mut field = Field::from_spec(FieldSpec::action(3, "go"));
        assert_eq!(field.state(), FieldState::Locked);
        assert_eq!(field.status(), InputStatus::Locked);

        field.activate();
        assert_eq!(field.state(), FieldState::Active);
        assert_eq!(field.status(), InputStatus::Progress);

        field.complete();
        assert_eq!(field.state(), FieldState::Completed);
        assert_eq!(field.status(), InputStatus::Completed);

        // Never reverts.
        field.complete();
        assert_eq!(field.state(), FieldState::Completed);
    }

    #[test]
    fn completing_a_locked_field_is_ignored() {
        let mut field = Field::from_spec(FieldSpec::action(0, "go"));
        field.complete();
        assert_eq!(field.state(), FieldState::Locked);
    }

    #[test]
    fn activating_text_field_unlocks_reconciler() {
        let mut field = Field::from_spec(FieldSpec::text(0, "email", "a@b.c"));
        assert!(!field.reconciler().unwrap().is_accepting());
        field.activate();
        assert!(field.reconciler().unwrap().is_accepting());
        assert_eq!(field.status(), InputStatus::Progress);
    }

    #[test]
    fn completing_text_field_detaches_reconciler() {
        let mut field = Field::from_spec(FieldSpec::text(0, "email", "a@b.c"));
        field.activate();
        field.complete();
        let reconciler = field.reconciler().unwrap();
        assert!(!reconciler.is_accepting());
        assert!(reconciler.is_frozen());
        assert_eq!(field.status(), InputStatus::Completed);
    }
}
