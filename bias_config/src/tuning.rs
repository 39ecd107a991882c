//! Runtime-tunable controller parameters.
//!
//! Fields are private: the only way to change a value is a setter that
//! range-checks first and leaves the prior value in force on rejection.

use crate::TuningCfg;
use crate::error::ConfigError;

pub const TOLERANCE_ALLOWED: &str = "(0.0, 1.0] V";
pub const GAIN_ALLOWED: &str = "[1, 4096] codes";
pub const BUFFER_ALLOWED: &str = "[1, 64] samples";

const GAIN_MAX: u32 = 4096;
const BUFFER_MAX: u32 = 64;

/// Controller configuration: convergence tolerance, fine-loop gain and the
/// three debounce depths.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TuningParams {
    tolerance_v: f32,
    gain: u32,
    quad_buffer: u32,
    peak_buffer: u32,
    null_buffer: u32,
}

impl Default for TuningParams {
    fn default() -> Self {
        Self {
            tolerance_v: 0.05,
            gain: 8,
            quad_buffer: 3,
            peak_buffer: 4,
            null_buffer: 4,
        }
    }
}

fn check_tolerance(v: f32) -> Result<f32, ConfigError> {
    if v.is_finite() && v > 0.0 && v <= 1.0 {
        Ok(v)
    } else {
        Err(ConfigError::OutOfRange {
            field: "tolerance",
            value: v.to_string(),
            allowed: TOLERANCE_ALLOWED,
        })
    }
}

fn check_buffer(field: &'static str, v: u32) -> Result<u32, ConfigError> {
    if (1..=BUFFER_MAX).contains(&v) {
        Ok(v)
    } else {
        Err(ConfigError::OutOfRange {
            field,
            value: v.to_string(),
            allowed: BUFFER_ALLOWED,
        })
    }
}

fn check_gain(v: u32) -> Result<u32, ConfigError> {
    if (1..=GAIN_MAX).contains(&v) {
        Ok(v)
    } else {
        Err(ConfigError::OutOfRange {
            field: "gain",
            value: v.to_string(),
            allowed: GAIN_ALLOWED,
        })
    }
}

impl TuningParams {
    pub fn new(
        tolerance_v: f32,
        gain: u32,
        quad_buffer: u32,
        peak_buffer: u32,
        null_buffer: u32,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            tolerance_v: check_tolerance(tolerance_v)?,
            gain: check_gain(gain)?,
            quad_buffer: check_buffer("quad_buffer", quad_buffer)?,
            peak_buffer: check_buffer("peak_buffer", peak_buffer)?,
            null_buffer: check_buffer("null_buffer", null_buffer)?,
        })
    }

    pub fn tolerance_v(&self) -> f32 {
        self.tolerance_v
    }
    pub fn gain(&self) -> u32 {
        self.gain
    }
    pub fn quad_buffer(&self) -> u32 {
        self.quad_buffer
    }
    pub fn peak_buffer(&self) -> u32 {
        self.peak_buffer
    }
    pub fn null_buffer(&self) -> u32 {
        self.null_buffer
    }

    pub fn set_tolerance(&mut self, v: f32) -> Result<(), ConfigError> {
        self.tolerance_v = check_tolerance(v)?;
        Ok(())
    }
    pub fn set_quad_buffer(&mut self, v: u32) -> Result<(), ConfigError> {
        self.quad_buffer = check_buffer("quad_buffer", v)?;
        Ok(())
    }
    pub fn set_peak_buffer(&mut self, v: u32) -> Result<(), ConfigError> {
        self.peak_buffer = check_buffer("peak_buffer", v)?;
        Ok(())
    }
    pub fn set_null_buffer(&mut self, v: u32) -> Result<(), ConfigError> {
        self.null_buffer = check_buffer("null_buffer", v)?;
        Ok(())
    }

    /// Apply a named setter from the command interface. `gain` is not
    /// exposed here.
    pub fn apply(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let value = value.trim();
        match key {
            "tolerance" => {
                let v = value.parse::<f32>().map_err(|_| ConfigError::OutOfRange {
                    field: "tolerance",
                    value: value.to_string(),
                    allowed: TOLERANCE_ALLOWED,
                })?;
                self.set_tolerance(v)
            }
            "quad_buffer" => self.set_quad_buffer(parse_buffer("quad_buffer", value)?),
            "peak_buffer" => self.set_peak_buffer(parse_buffer("peak_buffer", value)?),
            "null_buffer" => self.set_null_buffer(parse_buffer("null_buffer", value)?),
            other => Err(ConfigError::UnknownKey(other.to_string())),
        }
    }
}

fn parse_buffer(field: &'static str, value: &str) -> Result<u32, ConfigError> {
    value.parse::<u32>().map_err(|_| ConfigError::OutOfRange {
        field,
        value: value.to_string(),
        allowed: BUFFER_ALLOWED,
    })
}

impl TryFrom<&TuningCfg> for TuningParams {
    type Error = ConfigError;
    fn try_from(c: &TuningCfg) -> Result<Self, Self::Error> {
        Self::new(
            c.tolerance_v,
            c.gain,
            c.quad_buffer,
            c.peak_buffer,
            c.null_buffer,
        )
    }
}
