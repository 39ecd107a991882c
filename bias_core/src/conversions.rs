//! `From` implementations bridging `bias_config` types to `bias_core` types.

use std::time::Duration;

use crate::config::{SweepSettings, TrackingSettings};
use crate::target::LockMode;

impl From<&bias_config::SweepCfg> for SweepSettings {
    fn from(c: &bias_config::SweepCfg) -> Self {
        Self {
            resolution: c.resolution,
            noise_floor_v: c.noise_floor_v,
        }
    }
}

impl From<&bias_config::TrackingCfg> for TrackingSettings {
    fn from(c: &bias_config::TrackingCfg) -> Self {
        Self {
            max_fine_iterations: c.max_fine_iterations,
            recheck: Duration::from_millis(c.recheck_ms),
        }
    }
}

impl From<bias_config::ModeCfg> for LockMode {
    fn from(m: bias_config::ModeCfg) -> Self {
        match m {
            bias_config::ModeCfg::Peak => Self::Peak,
            bias_config::ModeCfg::Null => Self::Null,
            bias_config::ModeCfg::QuadPlus => Self::QuadPlus,
            bias_config::ModeCfg::QuadMinus => Self::QuadMinus,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracking_recheck_is_milliseconds() {
        let cfg = bias_config::TrackingCfg {
            max_fine_iterations: 10,
            recheck_ms: 250,
            mode: None,
        };
        let t = TrackingSettings::from(&cfg);
        assert_eq!(t.recheck, Duration::from_millis(250));
        assert_eq!(t.max_fine_iterations, 10);
    }

    #[test]
    fn every_mode_maps() {
        assert_eq!(LockMode::from(bias_config::ModeCfg::QuadMinus), LockMode::QuadMinus);
        assert_eq!(LockMode::from(bias_config::ModeCfg::Null), LockMode::Null);
    }
}
