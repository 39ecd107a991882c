//! Extremum and quadrature detection over a swept curve.

use crate::error::DetectionError;
use crate::step::Step;
use crate::sweep::SweepCurve;
use crate::target::{LockMode, LockTarget};

/// Default noise floor: readings below this are amplifier offset.
pub const NOISE_FLOOR_V: f32 = 0.01;

/// Feature voltages found in one sweep.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Detection {
    pub peak_v: f32,
    pub peak_step: Step,
    pub null_v: f32,
    pub null_step: Step,
    /// Half of `peak_v`.
    pub quad_target_v: f32,
}

impl Detection {
    pub fn target_for(&self, mode: LockMode) -> LockTarget {
        let target_voltage = match mode {
            LockMode::Peak => self.peak_v,
            LockMode::Null => self.null_v,
            LockMode::QuadPlus | LockMode::QuadMinus => self.quad_target_v,
        };
        LockTarget {
            mode,
            target_voltage,
        }
    }
}

/// Locate peak, null and quadrature target.
///
/// Ties resolve to the lowest step. Non-finite readings are ignored; a curve
/// with fewer than two usable samples is `InsufficientData`. Samples below
/// `noise_floor` never count as the null.
pub fn detect(curve: &SweepCurve, noise_floor: f32) -> Result<Detection, DetectionError> {
    let usable = || curve.samples().iter().filter(|s| s.voltage.is_finite());
    if usable().take(2).count() < 2 {
        tracing::warn!(samples = curve.len(), "detection aborted: insufficient data");
        return Err(DetectionError::InsufficientData);
    }

    let mut peak: Option<(Step, f32)> = None;
    let mut null: Option<(Step, f32)> = None;
    for s in usable() {
        if peak.is_none_or(|(_, v)| s.voltage > v) {
            peak = Some((s.step, s.voltage));
        }
        if s.voltage >= noise_floor && null.is_none_or(|(_, v)| s.voltage < v) {
            null = Some((s.step, s.voltage));
        }
    }

    let (peak_step, peak_v) = peak.ok_or(DetectionError::InsufficientData)?;
    let Some((null_step, null_v)) = null else {
        tracing::warn!(noise_floor, "detection: no sample above noise floor");
        return Err(DetectionError::NullNotFound);
    };

    let d = Detection {
        peak_v,
        peak_step,
        null_v,
        null_step,
        quad_target_v: peak_v / 2.0,
    };
    tracing::debug!(
        peak_v = d.peak_v,
        peak_step = %d.peak_step,
        null_v = d.null_v,
        null_step = %d.null_step,
        quad_target_v = d.quad_target_v,
        "detection complete"
    );
    Ok(d)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sweep::Sample;

    fn curve(vs: &[f32]) -> SweepCurve {
        SweepCurve::from_samples(
            vs.iter()
                .enumerate()
                .map(|(i, &voltage)| Sample {
                    step: Step::new(i as i64 * 16).unwrap(),
                    voltage,
                })
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn first_occurrence_wins_ties() {
        let d = detect(&curve(&[0.5, 2.0, 0.2, 2.0, 0.2]), 0.01).unwrap();
        assert_eq!(d.peak_step.get(), 16);
        assert_eq!(d.null_step.get(), 32);
    }

    #[test]
    fn readings_under_floor_are_not_the_null() {
        let d = detect(&curve(&[0.005, 1.0, 0.3, 0.0]), 0.01).unwrap();
        assert_eq!(d.null_v, 0.3);
    }

    #[test]
    fn all_below_floor_is_null_not_found() {
        assert_eq!(
            detect(&curve(&[0.001, 0.002, 0.0]), 0.01),
            Err(DetectionError::NullNotFound)
        );
    }

    #[test]
    fn short_curves_are_insufficient() {
        assert_eq!(detect(&curve(&[]), 0.01), Err(DetectionError::InsufficientData));
        assert_eq!(detect(&curve(&[1.0]), 0.01), Err(DetectionError::InsufficientData));
        assert_eq!(
            detect(&curve(&[1.0, f32::NAN]), 0.01),
            Err(DetectionError::InsufficientData)
        );
    }

    #[test]
    fn target_for_each_mode() {
        let d = detect(&curve(&[1.0, 1.8, 0.2]), 0.01).unwrap();
        assert_eq!(d.target_for(LockMode::Peak).target_voltage, 1.8);
        assert_eq!(d.target_for(LockMode::Null).target_voltage, 0.2);
        assert_eq!(d.target_for(LockMode::QuadMinus).target_voltage, 0.9);
    }
}
