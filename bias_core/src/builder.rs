//! Type-state builder for `BiasController`.
//!
//! `build()` only exists once both a sensor and an actuator are attached.

use std::marker::PhantomData;

use bias_config::{Config, TuningParams};
use bias_traits::{Actuator, Sensor};
use eyre::WrapErr;

use crate::config::{SweepSettings, TrackingSettings};
use crate::controller::BiasController;
use crate::error::{BuildError, Result};
use crate::plant::Plant;

pub struct Missing;
pub struct Set;

pub struct BiasControllerBuilder<S, A, HasS, HasA> {
    sensor: Option<S>,
    actuator: Option<A>,
    tuning: TuningParams,
    sweep: SweepSettings,
    tracking: TrackingSettings,
    _s: PhantomData<HasS>,
    _a: PhantomData<HasA>,
}

impl<S, A> Default for BiasControllerBuilder<S, A, Missing, Missing> {
    fn default() -> Self {
        Self {
            sensor: None,
            actuator: None,
            tuning: TuningParams::default(),
            sweep: SweepSettings::default(),
            tracking: TrackingSettings::default(),
            _s: PhantomData,
            _a: PhantomData,
        }
    }
}

impl<S, A, HasS, HasA> BiasControllerBuilder<S, A, HasS, HasA> {
    fn retag<NS, NA>(self) -> BiasControllerBuilder<S, A, NS, NA> {
        BiasControllerBuilder {
            sensor: self.sensor,
            actuator: self.actuator,
            tuning: self.tuning,
            sweep: self.sweep,
            tracking: self.tracking,
            _s: PhantomData,
            _a: PhantomData,
        }
    }

    pub fn with_sensor(mut self, sensor: S) -> BiasControllerBuilder<S, A, Set, HasA> {
        self.sensor = Some(sensor);
        self.retag()
    }

    pub fn with_actuator(mut self, actuator: A) -> BiasControllerBuilder<S, A, HasS, Set> {
        self.actuator = Some(actuator);
        self.retag()
    }

    #[must_use]
    pub fn with_tuning(mut self, tuning: TuningParams) -> Self {
        self.tuning = tuning;
        self
    }

    #[must_use]
    pub fn with_sweep(mut self, sweep: SweepSettings) -> Self {
        self.sweep = sweep;
        self
    }

    #[must_use]
    pub fn with_tracking(mut self, tracking: TrackingSettings) -> Self {
        self.tracking = tracking;
        self
    }

    /// Take sweep, tracking and boot tuning from a loaded config file.
    pub fn with_config(mut self, cfg: &Config) -> Result<Self> {
        self.tuning = TuningParams::try_from(&cfg.tuning).wrap_err("invalid [tuning] section")?;
        self.sweep = SweepSettings::from(&cfg.sweep);
        self.tracking = TrackingSettings::from(&cfg.tracking);
        Ok(self)
    }
}

impl<S: Sensor, A: Actuator> BiasControllerBuilder<S, A, Set, Set> {
    pub fn build(self) -> Result<BiasController<S, A>> {
        if !(2..=65_536).contains(&self.sweep.resolution) {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "sweep resolution must be in [2, 65536]",
            )));
        }
        if !self.sweep.noise_floor_v.is_finite() || self.sweep.noise_floor_v < 0.0 {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "noise floor must be >= 0",
            )));
        }
        if self.tracking.max_fine_iterations == 0 {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "max_fine_iterations must be >= 1",
            )));
        }
        let (Some(sensor), Some(actuator)) = (self.sensor, self.actuator) else {
            return Err(eyre::Report::new(BuildError::InvalidConfig(
                "sensor and actuator must be attached",
            )));
        };
        Ok(BiasController::from_parts(
            Plant::new(sensor, actuator),
            self.tuning,
            self.sweep,
            self.tracking,
        ))
    }
}
