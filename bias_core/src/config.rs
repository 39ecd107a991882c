//! Engine-side settings, decoupled from the TOML schema.

use std::time::Duration;

use crate::detect::NOISE_FLOOR_V;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepSettings {
    pub resolution: u32,
    pub noise_floor_v: f32,
}

impl Default for SweepSettings {
    fn default() -> Self {
        Self {
            resolution: 4096,
            noise_floor_v: NOISE_FLOOR_V,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackingSettings {
    /// Fine steps allowed per control cycle.
    pub max_fine_iterations: u32,
    /// Wait between checks while converged.
    pub recheck: Duration,
}

impl Default for TrackingSettings {
    fn default() -> Self {
        Self {
            max_fine_iterations: 2048,
            recheck: Duration::from_millis(100),
        }
    }
}
