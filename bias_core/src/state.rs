use crate::status::Phase;
use crate::step::Step;
use crate::target::{Direction, LockTarget};

/// Everything the control loop carries from one step to the next.
#[derive(Debug, Clone, PartialEq)]
pub struct ControllerRuntimeState {
    pub current_step: Step,
    pub current_voltage: f32,
    pub selected_target: Option<LockTarget>,
    /// Extremum walk direction; `None` until the slope check has run.
    pub direction: Option<Direction>,
    pub debounce_count: u32,
    pub last_difference: Option<f32>,
    pub phase: Phase,
}

impl Default for ControllerRuntimeState {
    fn default() -> Self {
        Self {
            current_step: Step::MIN,
            current_voltage: 0.0,
            selected_target: None,
            direction: None,
            debounce_count: 0,
            last_difference: None,
            phase: Phase::Idle,
        }
    }
}

impl ControllerRuntimeState {
    /// Forget the extremum search so the next activation checks the slope again.
    pub fn reset_search(&mut self) {
        self.direction = None;
        self.debounce_count = 0;
        self.last_difference = None;
    }
}
