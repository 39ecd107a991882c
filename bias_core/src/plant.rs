//! Sensor and actuator paired as one plant.

use bias_traits::{Actuator, Sensor};

use crate::error::Result;
use crate::hw_error::map_hw_error;
use crate::step::Step;

/// The modulator as the engine sees it: one drive, one detector.
pub struct Plant<S, A> {
    sensor: S,
    actuator: A,
}

impl<S: Sensor, A: Actuator> Plant<S, A> {
    pub fn new(sensor: S, actuator: A) -> Self {
        Self { sensor, actuator }
    }

    pub fn write(&mut self, step: Step) -> Result<()> {
        self.actuator
            .write_actuator(step.code())
            .map_err(|e| eyre::Report::new(map_hw_error(&*e)))
    }

    pub fn read(&mut self) -> Result<f32> {
        self.sensor
            .read_response()
            .map_err(|e| eyre::Report::new(map_hw_error(&*e)))
    }

    /// Drive to `step` and return the settled reading.
    pub fn move_to(&mut self, step: Step) -> Result<f32> {
        self.write(step)?;
        self.read()
    }

    pub fn into_parts(self) -> (S, A) {
        (self.sensor, self.actuator)
    }
}
