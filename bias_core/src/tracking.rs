//! Fine tracking: the steady-state control laws.
//!
//! Quadrature targets sit on a monotonic slope and take a signed
//! fixed-size correction. Peak and null sit where the slope vanishes, so
//! the extremum law tries a direction first and then hill-climbs with
//! a debounced reversal.

use std::cmp::Ordering;

use bias_config::TuningParams;
use bias_traits::{Actuator, Sensor};

use crate::error::Result;
use crate::plant::Plant;
use crate::state::ControllerRuntimeState;
use crate::step::Rail;
use crate::target::{Direction, LockMode, LockTarget};

/// Upper bound on slope-check repeats when readings come back identical.
pub const MAX_SLOPE_CHECKS: u32 = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackOutcome {
    Converged { iterations: u32 },
    /// The next correction reached a rail while still out of tolerance.
    Saturated { rail: Rail, iterations: u32 },
    /// Iteration budget spent without converging.
    Exhausted,
}

/// Correction direction for a quadrature error. Rising and falling
/// crossings have opposite slope, so the sign depends on the mode.
pub fn quadrature_correction(mode: LockMode, error: f32) -> Direction {
    let rising = mode.wants_rising().unwrap_or(true);
    match (rising, error > 0.0) {
        (true, true) | (false, false) => Direction::Down,
        (true, false) | (false, true) => Direction::Up,
    }
}

/// Run the control law for `target` for at most `max_iterations` actuator
/// moves, starting from the state's current step and reading.
pub fn track<S: Sensor, A: Actuator>(
    plant: &mut Plant<S, A>,
    state: &mut ControllerRuntimeState,
    target: &LockTarget,
    tuning: &TuningParams,
    max_iterations: u32,
) -> Result<TrackOutcome> {
    if target.difference(state.current_voltage) <= tuning.tolerance_v() {
        return Ok(TrackOutcome::Converged { iterations: 0 });
    }
    match target.mode {
        LockMode::QuadPlus | LockMode::QuadMinus => {
            track_quadrature(plant, state, target, tuning, max_iterations)
        }
        LockMode::Peak => {
            track_extremum(plant, state, target, tuning, tuning.peak_buffer(), max_iterations)
        }
        LockMode::Null => {
            track_extremum(plant, state, target, tuning, tuning.null_buffer(), max_iterations)
        }
    }
}

/// Move one gain step, clamped at the rails. Returns the rail if the move
/// ended on one.
fn advance<S: Sensor, A: Actuator>(
    plant: &mut Plant<S, A>,
    state: &mut ControllerRuntimeState,
    direction: Direction,
    gain: u32,
) -> Result<Option<Rail>> {
    let next = state.current_step.saturating_offset(direction.delta(gain));
    state.current_voltage = plant.move_to(next)?;
    state.current_step = next;
    Ok(next.rail())
}

/// Outcome once the iteration budget is spent.
fn budget_spent(target: &LockTarget, state: &ControllerRuntimeState, tol: f32, iterations: u32) -> TrackOutcome {
    if target.difference(state.current_voltage) <= tol {
        TrackOutcome::Converged { iterations }
    } else {
        TrackOutcome::Exhausted
    }
}

fn track_quadrature<S: Sensor, A: Actuator>(
    plant: &mut Plant<S, A>,
    state: &mut ControllerRuntimeState,
    target: &LockTarget,
    tuning: &TuningParams,
    max_iterations: u32,
) -> Result<TrackOutcome> {
    let tol = tuning.tolerance_v();
    for i in 0..max_iterations {
        let error = target.error(state.current_voltage);
        if error.abs() <= tol {
            return Ok(TrackOutcome::Converged { iterations: i });
        }
        let direction = quadrature_correction(target.mode, error);
        let rail = advance(plant, state, direction, tuning.gain())?;
        tracing::trace!(step = %state.current_step, voltage = state.current_voltage, ?direction, "quadrature step");
        if let Some(rail) = rail
            && target.difference(state.current_voltage) > tol
        {
            return Ok(TrackOutcome::Saturated {
                rail,
                iterations: i + 1,
            });
        }
    }
    Ok(budget_spent(target, state, tol, max_iterations))
}

/// Perturb by one gain step (downward when already at the top) and keep
/// going while the reading is identical to the starting one. The walk
/// direction is the trial direction if the difference to the target
/// improved, otherwise the reverse. Returns the number of moves made.
fn check_slope<S: Sensor, A: Actuator>(
    plant: &mut Plant<S, A>,
    state: &mut ControllerRuntimeState,
    target: &LockTarget,
    gain: u32,
) -> Result<u32> {
    let base_v = state.current_voltage;
    let base_diff = target.difference(base_v);
    let direction = if state.current_step.checked_offset(Direction::Up.delta(gain)).is_some() {
        Direction::Up
    } else {
        Direction::Down
    };

    let mut moves = 0u32;
    while moves < MAX_SLOPE_CHECKS {
        let Some(next) = state.current_step.checked_offset(direction.delta(gain)) else {
            break;
        };
        state.current_voltage = plant.move_to(next)?;
        state.current_step = next;
        moves += 1;
        if state.current_voltage.partial_cmp(&base_v) != Some(Ordering::Equal) {
            break;
        }
    }

    let diff = target.difference(state.current_voltage);
    let chosen = if diff < base_diff {
        direction
    } else {
        direction.reversed()
    };
    tracing::debug!(
        mode = %target.mode,
        trial = ?direction,
        chosen = ?chosen,
        moves,
        "slope check"
    );
    state.direction = Some(chosen);
    state.last_difference = Some(diff);
    state.debounce_count = 0;
    Ok(moves)
}

fn track_extremum<S: Sensor, A: Actuator>(
    plant: &mut Plant<S, A>,
    state: &mut ControllerRuntimeState,
    target: &LockTarget,
    tuning: &TuningParams,
    buffer: u32,
    max_iterations: u32,
) -> Result<TrackOutcome> {
    let tol = tuning.tolerance_v();
    let mut iterations = 0u32;

    if state.direction.is_none() {
        iterations += check_slope(plant, state, target, tuning.gain())?;
    }

    while iterations < max_iterations {
        let diff = target.difference(state.current_voltage);
        if diff <= tol {
            return Ok(TrackOutcome::Converged { iterations });
        }
        let direction = state.direction.unwrap_or(Direction::Up);
        let rail = advance(plant, state, direction, tuning.gain())?;
        iterations += 1;

        let diff = target.difference(state.current_voltage);
        if diff <= tol {
            return Ok(TrackOutcome::Converged { iterations });
        }
        if let Some(rail) = rail {
            return Ok(TrackOutcome::Saturated { rail, iterations });
        }

        if state.last_difference.is_some_and(|last| diff > last) {
            state.debounce_count += 1;
            if state.debounce_count >= buffer {
                state.direction = Some(direction.reversed());
                state.debounce_count = 0;
                tracing::trace!(step = %state.current_step, "extremum overshot; reversing");
            }
        } else {
            state.debounce_count = 0;
        }
        state.last_difference = Some(diff);
        tracing::trace!(step = %state.current_step, voltage = state.current_voltage, diff, "extremum step");
    }
    Ok(budget_spent(target, state, tol, iterations))
}
