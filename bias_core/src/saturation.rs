//! Rail recovery.
//!
//! When tracking runs the actuator into a rail, the lock is re-anchored by
//! coarse acquisition from the opposite rail, then from the rail that was
//! hit. If neither walk reaches the target the attempt fails with
//! `LockError::Unreachable`; the caller decides what happens next.

use bias_config::TuningParams;
use bias_traits::{Actuator, Sensor};

use crate::acquire::{AcquireReport, acquire};
use crate::error::{AcquisitionError, LockError, Result};
use crate::plant::Plant;
use crate::step::Rail;
use crate::target::{Direction, LockTarget};

/// Walk direction that leaves `rail`.
const fn away_from(rail: Rail) -> Direction {
    match rail {
        Rail::Min => Direction::Up,
        Rail::Max => Direction::Down,
    }
}

/// Acquire starting at `first`, falling back to the other rail.
pub fn acquire_from_rails<S: Sensor, A: Actuator>(
    plant: &mut Plant<S, A>,
    target: &LockTarget,
    first: Rail,
    tuning: &TuningParams,
    stride: u32,
) -> Result<AcquireReport> {
    for rail in [first, first.opposite()] {
        match acquire(plant, target, rail.step(), away_from(rail), tuning, stride) {
            Ok(report) => return Ok(report),
            Err(e) if e.downcast_ref::<AcquisitionError>().is_some() => {
                tracing::debug!(rail = %rail, error = %e, "acquisition from rail failed");
            }
            Err(e) => return Err(e),
        }
    }
    tracing::error!(mode = %target.mode, target_v = target.target_voltage, "setpoint not reachable");
    Err(eyre::Report::new(LockError::Unreachable { mode: target.mode }))
}

/// Re-anchor after hitting `hit`.
pub fn recover<S: Sensor, A: Actuator>(
    plant: &mut Plant<S, A>,
    target: &LockTarget,
    hit: Rail,
    tuning: &TuningParams,
    stride: u32,
) -> Result<AcquireReport> {
    tracing::warn!(rail = %hit, mode = %target.mode, "actuator saturated; re-acquiring from opposite rail");
    acquire_from_rails(plant, target, hit.opposite(), tuning, stride)
}
