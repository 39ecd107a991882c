//! Actuator step arithmetic.
//!
//! A `Step` can only hold a value in `[STEP_MIN, STEP_MAX]`. Every move is
//! either checked (`None` when it would leave the range) or saturating; the
//! range test happens before the new value exists.

use std::fmt;

// Signed view of the `bias_traits` actuator range.
#[allow(clippy::cast_lossless)]
pub const STEP_MIN: i32 = bias_traits::STEP_MIN as i32;
#[allow(clippy::cast_lossless)]
pub const STEP_MAX: i32 = bias_traits::STEP_MAX as i32;
/// Number of distinct actuator codes.
#[allow(clippy::cast_lossless)]
pub const STEP_SPAN: u32 = bias_traits::STEP_MAX as u32 + 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Step(i32);

impl Step {
    pub const MIN: Self = Self(STEP_MIN);
    pub const MAX: Self = Self(STEP_MAX);

    pub fn new(value: i64) -> Option<Self> {
        if (i64::from(STEP_MIN)..=i64::from(STEP_MAX)).contains(&value) {
            i32::try_from(value).ok().map(Self)
        } else {
            None
        }
    }

    #[inline]
    pub const fn get(self) -> i32 {
        self.0
    }

    /// Value as written to the actuator.
    #[inline]
    pub fn code(self) -> u16 {
        u16::try_from(self.0).unwrap_or(u16::MAX)
    }

    pub fn checked_offset(self, delta: i32) -> Option<Self> {
        Self::new(i64::from(self.0) + i64::from(delta))
    }

    pub fn saturating_offset(self, delta: i32) -> Self {
        let v = (i64::from(self.0) + i64::from(delta)).clamp(i64::from(STEP_MIN), i64::from(STEP_MAX));
        Self::new(v).unwrap_or(if delta < 0 { Self::MIN } else { Self::MAX })
    }

    /// Which rail, if any, this step sits on.
    pub fn rail(self) -> Option<Rail> {
        match self.0 {
            STEP_MIN => Some(Rail::Min),
            STEP_MAX => Some(Rail::Max),
            _ => None,
        }
    }
}

impl From<u16> for Step {
    fn from(code: u16) -> Self {
        Self(i32::from(code))
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// End of the actuator range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rail {
    Min,
    Max,
}

impl Rail {
    pub const fn opposite(self) -> Self {
        match self {
            Self::Min => Self::Max,
            Self::Max => Self::Min,
        }
    }

    pub const fn step(self) -> Step {
        match self {
            Self::Min => Step::MIN,
            Self::Max => Step::MAX,
        }
    }
}

impl fmt::Display for Rail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Min => "min",
            Self::Max => "max",
        })
    }
}

/// Coarse step size for a sweep of `resolution` samples over the full span.
pub fn coarse_step(resolution: u32) -> u32 {
    (STEP_SPAN / resolution.clamp(1, STEP_SPAN)).max(1)
}
