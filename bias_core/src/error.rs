use thiserror::Error;

use crate::step::Step;
use crate::target::LockMode;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DetectionError {
    #[error("swept curve has too few usable samples")]
    InsufficientData,
    #[error("no sample cleared the noise floor; null not detected")]
    NullNotFound,
    #[error("swept curve steps are not strictly increasing at index {0}")]
    Unordered(usize),
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum AcquisitionError {
    #[error("target {target_v:.4} V not reached walking from step {from} to the rail")]
    Unreachable { from: Step, target_v: f32 },
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum LockError {
    #[error("{mode} setpoint not reachable from either rail")]
    Unreachable { mode: LockMode },
    #[error(transparent)]
    Detection(#[from] DetectionError),
    #[error("hardware error: {0}")]
    Hardware(String),
    #[error("hardware fault: {0}")]
    HardwareFault(String),
    #[error("timeout waiting for sensor")]
    Timeout,
    #[error("invalid state: {0}")]
    State(&'static str),
}

#[derive(Debug, Error, Clone)]
pub enum BuildError {
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
