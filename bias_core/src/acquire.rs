//! Coarse acquisition: walk toward a target voltage in sweep-sized strides.

use std::cmp::Ordering;

use bias_config::TuningParams;
use bias_traits::{Actuator, Sensor};

use crate::error::{AcquisitionError, Result};
use crate::plant::Plant;
use crate::step::Step;
use crate::target::{Direction, LockTarget};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AcquireReport {
    pub step: Step,
    pub voltage: f32,
    /// Strides taken after the start position.
    pub iterations: u32,
}

/// Walk from `start` in `direction` by `stride` codes until the reading is
/// within tolerance of the target.
///
/// Quadrature targets additionally need `quad_buffer` in-tolerance samples
/// whose local slope matches the mode before the crossing is accepted; an
/// exactly flat sample neither confirms nor resets. Running out of range
/// before that is `AcquisitionError::Unreachable`.
pub fn acquire<S: Sensor, A: Actuator>(
    plant: &mut Plant<S, A>,
    target: &LockTarget,
    start: Step,
    direction: Direction,
    tuning: &TuningParams,
    stride: u32,
) -> Result<AcquireReport> {
    let tol = tuning.tolerance_v();
    let delta = direction.delta(stride);
    let wants_rising = target.mode.wants_rising();

    let mut step = start;
    let mut voltage = plant.move_to(step)?;
    let mut iterations = 0u32;
    let mut confirmations = 0u32;

    if wants_rising.is_none() && target.difference(voltage) <= tol {
        return Ok(AcquireReport {
            step,
            voltage,
            iterations,
        });
    }

    loop {
        let Some(next) = step.checked_offset(delta) else {
            tracing::warn!(
                mode = %target.mode,
                from = %start,
                iterations,
                "coarse acquisition ran out of range"
            );
            return Err(eyre::Report::new(AcquisitionError::Unreachable {
                from: start,
                target_v: target.target_voltage,
            }));
        };
        let prev = voltage;
        step = next;
        voltage = plant.move_to(step)?;
        iterations += 1;
        let within = target.difference(voltage) <= tol;

        let accepted = match wants_rising {
            None => within,
            Some(rising) => {
                // dV/dstep, independent of walk direction.
                let slope = (voltage - prev) * direction.sign() as f32;
                confirmations = match (within, slope.partial_cmp(&0.0)) {
                    (true, Some(Ordering::Equal)) => confirmations,
                    (true, Some(Ordering::Greater)) if rising => confirmations + 1,
                    (true, Some(Ordering::Less)) if !rising => confirmations + 1,
                    _ => 0,
                };
                tracing::trace!(step = %step, voltage, confirmations, "quadrature candidate");
                confirmations >= tuning.quad_buffer()
            }
        };
        if accepted {
            tracing::debug!(
                mode = %target.mode,
                step = %step,
                voltage,
                iterations,
                "coarse acquisition complete"
            );
            return Ok(AcquireReport {
                step,
                voltage,
                iterations,
            });
        }
    }
}
