//! Characterization sweep.

use bias_traits::{Actuator, Sensor};
use eyre::WrapErr;

use crate::error::{DetectionError, Result};
use crate::plant::Plant;
use crate::step::{Step, coarse_step};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub step: Step,
    pub voltage: f32,
}

/// Response curve with strictly increasing steps.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SweepCurve {
    samples: Vec<Sample>,
}

impl SweepCurve {
    /// Build from recorded samples, e.g. an imported CSV.
    pub fn from_samples(samples: Vec<Sample>) -> std::result::Result<Self, DetectionError> {
        if let Some(i) = samples
            .windows(2)
            .position(|w| w[1].step <= w[0].step)
        {
            return Err(DetectionError::Unordered(i + 1));
        }
        Ok(Self { samples })
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Drive the actuator from `STEP_MIN` upward in `resolution` equal
/// increments, one reading per increment, then return it to `STEP_MIN`.
pub fn sweep<S: Sensor, A: Actuator>(plant: &mut Plant<S, A>, resolution: u32) -> Result<SweepCurve> {
    let stride = i64::from(coarse_step(resolution));
    let mut samples = Vec::with_capacity(resolution as usize);
    for i in 0..i64::from(resolution) {
        let Some(step) = Step::new(i * stride) else {
            break;
        };
        let voltage = plant
            .move_to(step)
            .wrap_err_with(|| format!("sweep sample at step {step}"))?;
        samples.push(Sample { step, voltage });
    }
    plant.write(Step::MIN).wrap_err("return actuator to origin")?;
    tracing::debug!(samples = samples.len(), stride, "sweep complete");
    Ok(SweepCurve { samples })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_unordered_samples() {
        let s = |step: i64| Sample {
            step: Step::new(step).unwrap(),
            voltage: 0.0,
        };
        assert_eq!(
            SweepCurve::from_samples(vec![s(0), s(16), s(16)]),
            Err(DetectionError::Unordered(2))
        );
        assert!(SweepCurve::from_samples(vec![s(0), s(1)]).is_ok());
        assert!(SweepCurve::from_samples(vec![]).unwrap().is_empty());
    }
}
