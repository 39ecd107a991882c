//! Lock modes, the selected target, and walk direction.

use std::fmt;
use std::str::FromStr;

/// Operating point on the modulator transfer function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LockMode {
    /// Maximum transmission.
    Peak,
    /// Minimum transmission above the noise floor.
    Null,
    /// Half-peak crossing on a rising slope.
    QuadPlus,
    /// Half-peak crossing on a falling slope.
    QuadMinus,
}

impl LockMode {
    pub const ALL: [Self; 4] = [Self::Peak, Self::Null, Self::QuadPlus, Self::QuadMinus];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Peak => "peak",
            Self::Null => "null",
            Self::QuadPlus => "quad-plus",
            Self::QuadMinus => "quad-minus",
        }
    }

    /// Whether a positive dV/dstep is the slope this mode locks on.
    /// Extremum modes have no required slope.
    pub const fn wants_rising(self) -> Option<bool> {
        match self {
            Self::QuadPlus => Some(true),
            Self::QuadMinus => Some(false),
            Self::Peak | Self::Null => None,
        }
    }
}

impl fmt::Display for LockMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown lock mode '{0}' (expected peak, null, quad-plus or quad-minus)")]
pub struct ParseModeError(String);

impl FromStr for LockMode {
    type Err = ParseModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "peak" => Ok(Self::Peak),
            "null" => Ok(Self::Null),
            "quad-plus" | "quad+" | "quadplus" => Ok(Self::QuadPlus),
            "quad-minus" | "quad-" | "quadminus" => Ok(Self::QuadMinus),
            _ => Err(ParseModeError(s.to_string())),
        }
    }
}

/// The selected operating point and the voltage that identifies it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LockTarget {
    pub mode: LockMode,
    pub target_voltage: f32,
}

impl LockTarget {
    #[inline]
    pub fn error(&self, reading: f32) -> f32 {
        reading - self.target_voltage
    }

    #[inline]
    pub fn difference(&self, reading: f32) -> f32 {
        (self.target_voltage - reading).abs()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    #[inline]
    pub const fn sign(self) -> i32 {
        match self {
            Self::Up => 1,
            Self::Down => -1,
        }
    }

    #[inline]
    pub const fn reversed(self) -> Self {
        match self {
            Self::Up => Self::Down,
            Self::Down => Self::Up,
        }
    }

    /// `magnitude` codes in this direction.
    #[inline]
    pub fn delta(self, magnitude: u32) -> i32 {
        i32::try_from(magnitude).unwrap_or(i32::MAX) * self.sign()
    }
}
