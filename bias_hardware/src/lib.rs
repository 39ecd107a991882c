#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]

pub mod error;
pub mod sim;
pub mod storage;

#[cfg(all(feature = "hardware", target_os = "linux"))]
pub mod pi;

pub use error::HwError;
pub use sim::{SimActuator, SimParams, SimSensor, SimulatedModulator};
pub use storage::{FileStorage, MemStorage, write_atomic};

#[cfg(all(feature = "hardware", target_os = "linux"))]
pub use pi::{Mcp3208Sensor, PwmActuator};
