//! Outer scheduler: one control cycle per iteration, flags polled between
//! cycles.

use bias_traits::{Actuator, Clock, Sensor};
use eyre::WrapErr;

use crate::controller::BiasController;
use crate::error::Result;
use crate::flags::ControlFlags;
use crate::status::LockStatus;
use crate::step::Step;
use crate::target::LockMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunParams {
    pub mode: LockMode,
    /// Stop after this many control cycles; run until shutdown when `None`.
    pub max_cycles: Option<u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub mode: LockMode,
    pub cycles: u64,
    pub converged_cycles: u64,
    pub reacquisitions: u64,
    /// Full sweep-detect-acquire passes after the first, from a mode change
    /// or a re-sweep request.
    pub relocks: u64,
    pub final_step: Step,
    pub final_voltage: f32,
}

/// Lock `params.mode` and hold it.
///
/// While converged the loop waits `recheck` on `clock` between cycles. A
/// mode change or re-sweep request re-runs sweep, detect and acquire. An
/// unreachable setpoint ends the run with an error.
pub fn run<S, A, C>(
    controller: &mut BiasController<S, A>,
    flags: &ControlFlags,
    clock: &C,
    params: RunParams,
) -> Result<RunSummary>
where
    S: Sensor,
    A: Actuator,
    C: Clock,
{
    let recheck = controller.tracking_settings().recheck;
    let mut summary = RunSummary {
        mode: params.mode,
        cycles: 0,
        converged_cycles: 0,
        reacquisitions: 0,
        relocks: 0,
        final_step: Step::MIN,
        final_voltage: 0.0,
    };

    controller
        .lock(params.mode)
        .wrap_err_with(|| format!("initial {} lock", params.mode))?;

    loop {
        if flags.shutdown_requested() {
            tracing::info!(cycles = summary.cycles, "shutdown requested");
            break;
        }
        if params.max_cycles.is_some_and(|max| summary.cycles >= max) {
            break;
        }

        let new_mode = flags.take_mode();
        let resweep = flags.take_resweep();
        if new_mode.is_some() || resweep {
            if let Some(m) = new_mode {
                summary.mode = m;
            }
            tracing::info!(mode = %summary.mode, resweep, "re-locking");
            controller
                .lock(summary.mode)
                .wrap_err_with(|| format!("{} re-lock", summary.mode))?;
            summary.relocks += 1;
        }

        let status = controller.step()?;
        summary.cycles += 1;
        match status {
            LockStatus::Converged => {
                summary.converged_cycles += 1;
                clock.sleep(recheck);
            }
            LockStatus::Searching => {}
            LockStatus::Reacquired => summary.reacquisitions += 1,
            LockStatus::Aborted(e) => {
                return Err(eyre::Report::new(e).wrap_err(format!("{} lock aborted", summary.mode)));
            }
        }
    }

    let state = controller.state();
    summary.final_step = state.current_step;
    summary.final_voltage = state.current_voltage;
    tracing::info!(
        cycles = summary.cycles,
        converged = summary.converged_cycles,
        reacquisitions = summary.reacquisitions,
        "run finished"
    );
    Ok(summary)
}
