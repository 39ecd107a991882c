//! The bias controller: one plant, one tuning, one lock at a time.

use bias_config::{ConfigError, TuningParams};
use bias_traits::{Actuator, Sensor};
use eyre::WrapErr;

use crate::acquire::AcquireReport;
use crate::builder::{BiasControllerBuilder, Missing};
use crate::config::{SweepSettings, TrackingSettings};
use crate::detect::{Detection, detect};
use crate::error::{LockError, Result};
use crate::plant::Plant;
use crate::saturation::{acquire_from_rails, recover};
use crate::state::ControllerRuntimeState;
use crate::status::{LockStatus, Phase};
use crate::step::{Rail, Step, coarse_step};
use crate::sweep::{SweepCurve, sweep};
use crate::target::{LockMode, LockTarget};
use crate::tracking::{TrackOutcome, track};

pub struct BiasController<S, A> {
    plant: Plant<S, A>,
    tuning: TuningParams,
    sweep: SweepSettings,
    tracking: TrackingSettings,
    detection: Option<Detection>,
    state: ControllerRuntimeState,
}

impl<S, A> core::fmt::Debug for BiasController<S, A> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("BiasController")
            .field("tuning", &self.tuning)
            .field("detection", &self.detection)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl<S: Sensor, A: Actuator> BiasController<S, A> {
    pub fn builder() -> BiasControllerBuilder<S, A, Missing, Missing> {
        BiasControllerBuilder::default()
    }

    pub(crate) fn from_parts(
        plant: Plant<S, A>,
        tuning: TuningParams,
        sweep: SweepSettings,
        tracking: TrackingSettings,
    ) -> Self {
        Self {
            plant,
            tuning,
            sweep,
            tracking,
            detection: None,
            state: ControllerRuntimeState::default(),
        }
    }

    fn stride(&self) -> u32 {
        coarse_step(self.sweep.resolution)
    }

    fn selected(&self) -> Result<LockTarget> {
        self.state
            .selected_target
            .ok_or_else(|| eyre::Report::new(LockError::State("no lock target selected")))
    }

    /// Run the characterization sweep. Leaves the actuator at `STEP_MIN`.
    pub fn sweep(&mut self) -> Result<SweepCurve> {
        let curve = sweep(&mut self.plant, self.sweep.resolution)?;
        self.state.current_step = Step::MIN;
        self.state.phase = Phase::Idle;
        Ok(curve)
    }

    /// Run detection on `curve` and keep the result for target selection.
    pub fn detect_curve(&mut self, curve: &SweepCurve) -> Result<Detection> {
        let d = detect(curve, self.sweep.noise_floor_v)
            .map_err(LockError::from)
            .wrap_err("detection failed")?;
        self.detection = Some(d);
        Ok(d)
    }

    /// Sweep then detect. The curve itself is not retained.
    pub fn characterize(&mut self) -> Result<Detection> {
        let curve = self.sweep()?;
        self.detect_curve(&curve)
    }

    /// Choose the operating point. Needs a prior characterization.
    pub fn select(&mut self, mode: LockMode) -> Result<LockTarget> {
        let d = self
            .detection
            .ok_or_else(|| eyre::Report::new(LockError::State("no characterization available")))?;
        let target = d.target_for(mode);
        self.state.selected_target = Some(target);
        self.state.phase = Phase::Idle;
        self.state.reset_search();
        tracing::info!(mode = %mode, target_v = target.target_voltage, "lock target selected");
        Ok(target)
    }

    /// Coarse acquisition for the selected target, from `STEP_MIN` first.
    pub fn acquire(&mut self) -> Result<AcquireReport> {
        let target = self.selected()?;
        self.state.phase = Phase::Acquiring;
        self.state.reset_search();
        let stride = self.stride();
        let report =
            match acquire_from_rails(&mut self.plant, &target, Rail::Min, &self.tuning, stride) {
                Ok(r) => r,
                Err(e) => {
                    self.state.phase = Phase::Idle;
                    return Err(e.wrap_err(format!("acquire {} setpoint", target.mode)));
                }
            };
        self.state.current_step = report.step;
        self.state.current_voltage = report.voltage;
        self.state.phase = Phase::Searching;
        Ok(report)
    }

    /// Sweep, detect, select and acquire.
    pub fn lock(&mut self, mode: LockMode) -> Result<AcquireReport> {
        tracing::info!(mode = %mode, "lock start");
        self.characterize()?;
        self.select(mode)?;
        self.acquire()
    }

    /// One control cycle.
    ///
    /// While converged, a single reading checks for drift. Otherwise fine
    /// tracking runs for at most `max_fine_iterations` moves; a rail hit
    /// goes through the saturation handler.
    pub fn step(&mut self) -> Result<LockStatus> {
        let target = self.selected()?;
        if self.state.phase == Phase::Idle || self.state.phase == Phase::Acquiring {
            return Err(eyre::Report::new(LockError::State("lock not acquired")));
        }
        let tol = self.tuning.tolerance_v();
        self.state.current_voltage = self.plant.read()?;

        if self.state.phase == Phase::Converged {
            if target.difference(self.state.current_voltage) <= tol {
                return Ok(LockStatus::Converged);
            }
            tracing::info!(
                voltage = self.state.current_voltage,
                target_v = target.target_voltage,
                "drift detected; tracking resumed"
            );
            self.state.phase = Phase::Searching;
            self.state.reset_search();
        }

        let outcome = track(
            &mut self.plant,
            &mut self.state,
            &target,
            &self.tuning,
            self.tracking.max_fine_iterations,
        )?;
        match outcome {
            TrackOutcome::Converged { iterations } => {
                tracing::info!(
                    mode = %target.mode,
                    step = %self.state.current_step,
                    voltage = self.state.current_voltage,
                    iterations,
                    "lock converged"
                );
                self.state.phase = Phase::Converged;
                Ok(LockStatus::Converged)
            }
            TrackOutcome::Exhausted => {
                self.state.phase = Phase::Searching;
                Ok(LockStatus::Searching)
            }
            TrackOutcome::Saturated { rail, .. } => {
                self.state.phase = Phase::Acquiring;
                self.state.reset_search();
                let stride = self.stride();
                match recover(&mut self.plant, &target, rail, &self.tuning, stride) {
                    Ok(report) => {
                        self.state.current_step = report.step;
                        self.state.current_voltage = report.voltage;
                        self.state.phase = Phase::Searching;
                        Ok(LockStatus::Reacquired)
                    }
                    Err(e) => match e.downcast_ref::<LockError>() {
                        Some(le @ LockError::Unreachable { .. }) => {
                            self.state.phase = Phase::Idle;
                            Ok(LockStatus::Aborted(le.clone()))
                        }
                        _ => Err(e),
                    },
                }
            }
        }
    }

    pub fn tuning(&self) -> &TuningParams {
        &self.tuning
    }

    pub fn set_tuning(&mut self, tuning: TuningParams) {
        self.tuning = tuning;
    }

    /// Named setter from the command interface; a rejected value leaves
    /// the current tuning in force.
    pub fn apply_tuning(&mut self, key: &str, value: &str) -> std::result::Result<(), ConfigError> {
        self.tuning.apply(key, value)
    }

    pub fn state(&self) -> &ControllerRuntimeState {
        &self.state
    }

    pub fn detection(&self) -> Option<&Detection> {
        self.detection.as_ref()
    }

    pub fn mode(&self) -> Option<LockMode> {
        self.state.selected_target.map(|t| t.mode)
    }

    pub fn sweep_settings(&self) -> &SweepSettings {
        &self.sweep
    }

    pub fn tracking_settings(&self) -> &TrackingSettings {
        &self.tracking
    }

    pub fn into_parts(self) -> (S, A) {
        self.plant.into_parts()
    }
}
