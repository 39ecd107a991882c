//! Test doubles for driving the engine without a plant model.

use bias_traits::{Actuator, BoxError, Sensor};

/// A sensor whose every read fails with `message`.
pub struct FailingSensor {
    pub message: &'static str,
}

impl Sensor for FailingSensor {
    fn read_response(&mut self) -> Result<f32, BoxError> {
        Err(Box::new(std::io::Error::other(self.message)))
    }
}

/// Replays a fixed list of readings, then repeats the last one.
pub struct ScriptedSensor {
    readings: Vec<f32>,
    next: usize,
}

impl ScriptedSensor {
    pub fn new(readings: Vec<f32>) -> Self {
        Self { readings, next: 0 }
    }
}

impl Sensor for ScriptedSensor {
    fn read_response(&mut self) -> Result<f32, BoxError> {
        let v = self
            .readings
            .get(self.next)
            .or_else(|| self.readings.last())
            .copied()
            .unwrap_or(0.0);
        self.next += 1;
        Ok(v)
    }
}

/// Accepts every write and remembers them.
#[derive(Default)]
pub struct RecordingActuator {
    pub writes: Vec<u16>,
}

impl Actuator for RecordingActuator {
    fn write_actuator(&mut self, step: u16) -> Result<(), BoxError> {
        self.writes.push(step);
        Ok(())
    }
}
