#![forbid(unsafe_code)]

//! Study session plan.
//!
//! A subject works through every task once per input device. Device order is
//! counterbalanced with a 2x2 Latin square chosen by `user_id % 2`.
//!
//! ```text
//! Start ──► Tutorial ──► Task(device 0, task 0..n) ──► Task(device 1, …) ──► End
//! ```
//!
//! `PracticeTask` is reserved; proceeding from it does nothing.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::logging::TARGET_PROGRESSION;

/// Study task kinds, in presentation order.
pub const TASK_SEQUENCE: [StudyTask; 2] = [StudyTask::Form, StudyTask::Email];

/// Device orders; row `user_id % 2` is used.
pub const COUNTERBALANCING_SEQUENCE: [[InputDevice; 2]; 2] = [
    [InputDevice::Mouse, InputDevice::LeapMotion],
    [InputDevice::LeapMotion, InputDevice::Mouse],
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StudyTask {
    Form,
    Email,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InputDevice {
    Mouse,
    LeapMotion,
}

impl fmt::Display for InputDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mouse => f.write_str("mouse"),
            Self::LeapMotion => f.write_str("leap-motion"),
        }
    }
}

/// Session phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StudyPhase {
    #[default]
    Start,
    Tutorial,
    PracticeTask,
    Task,
    End,
}

/// Per-subject session state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudyPlan {
    user_id: u32,
    counterbalancing_index: usize,
    phase: StudyPhase,
    device_index: usize,
    task_index: usize,
}

impl StudyPlan {
    /// Plan for one subject.
    #[must_use]
    pub const fn new(user_id: u32) -> Self {
        Self {
            user_id,
            counterbalancing_index: (user_id % 2) as usize,
            phase: StudyPhase::Start,
            device_index: 0,
            task_index: 0,
        }
    }

    #[must_use]
    pub const fn user_id(&self) -> u32 {
        self.user_id
    }

    #[must_use]
    pub const fn counterbalancing_index(&self) -> usize {
        self.counterbalancing_index
    }

    #[must_use]
    pub const fn phase(&self) -> StudyPhase {
        self.phase
    }

    /// Position in [`TASK_SEQUENCE`].
    #[must_use]
    pub const fn task_index(&self) -> usize {
        self.task_index
    }

    /// Position in the device order.
    #[must_use]
    pub const fn device_index(&self) -> usize {
        self.device_index
    }

    /// Task under way; `None` outside the Task phase.
    #[must_use]
    pub fn current_task(&self) -> Option<StudyTask> {
        (self.phase == StudyPhase::Task).then(|| TASK_SEQUENCE[self.task_index])
    }

    /// Device in use; `None` outside the Task phase.
    #[must_use]
    pub fn current_device(&self) -> Option<InputDevice> {
        (self.phase == StudyPhase::Task)
            .then(|| COUNTERBALANCING_SEQUENCE[self.counterbalancing_index][self.device_index])
    }

    /// First device of this subject's order.
    #[must_use]
    pub const fn first_device(&self) -> InputDevice {
        COUNTERBALANCING_SEQUENCE[self.counterbalancing_index][0]
    }

    #[must_use]
    pub fn is_done(&self) -> bool {
        self.phase == StudyPhase::End
    }

    /// Move to the next phase, task, or device.
    pub fn proceed(&mut self) -> StudyPhase {
        let from = self.phase;
        match self.phase {
            StudyPhase::Start => self.phase = StudyPhase::Tutorial,
            StudyPhase::Tutorial => {
                self.phase = StudyPhase::Task;
                self.device_index = 0;
                self.task_index = 0;
            }
            StudyPhase::PracticeTask | StudyPhase::End => {}
            StudyPhase::Task => {
                self.task_index += 1;
                if self.task_index == TASK_SEQUENCE.len() {
                    self.task_index = 0;
                    self.device_index += 1;
                }
                if self.device_index == COUNTERBALANCING_SEQUENCE[self.counterbalancing_index].len()
                {
                    self.task_index = 0;
                    self.device_index = 0;
                    self.phase = StudyPhase::End;
                }
            }
        }
        tracing::info!(
            target: TARGET_PROGRESSION,
            user_id = self.user_id,
            ?from,
            to = ?self.phase,
            task = ?self.current_task(),
            device = ?self.current_device(),
            "study plan proceeded"
        );
        self.phase
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counterbalancing_by_user_parity() {
        assert_eq!(StudyPlan::new(4).first_device(), InputDevice::Mouse);
        assert_eq!(StudyPlan::new(7).first_device(), InputDevice::LeapMotion);
    }

    #[test]
    fn full_session_for_odd_user() {
        let mut plan = StudyPlan::new(1);
        assert_eq!(plan.phase(), StudyPhase::Start);
        assert_eq!(plan.current_task(), None);

        assert_eq!(plan.proceed(), StudyPhase::Tutorial);
        assert_eq!(plan.proceed(), StudyPhase::Task);

        let mut seen = Vec::new();
        while !plan.is_done() {
            seen.push((plan.current_device().unwrap(), plan.current_task().unwrap()));
            plan.proceed();
        }
        assert_eq!(
            seen,
            vec![
                (InputDevice::LeapMotion, StudyTask::Form),
                (InputDevice::LeapMotion, StudyTask::Email),
                (InputDevice::Mouse, StudyTask::Form),
                (InputDevice::Mouse, StudyTask::Email),
            ]
        );
        assert_eq!(plan.task_index(), 0);
        assert_eq!(plan.device_index(), 0);
    }

    #[test]
    fn end_is_terminal() {
        let mut plan = StudyPlan::new(0);
        for _ in 0..6 {
            plan.proceed();
        }
        assert!(plan.is_done());
        assert_eq!(plan.proceed(), StudyPhase::End);
        assert_eq!(plan.current_device(), None);
    }

    #[test]
    fn device_display() {
        assert_eq!(InputDevice::LeapMotion.to_string(), "leap-motion");
    }
}
