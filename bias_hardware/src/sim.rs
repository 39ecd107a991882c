//! Simulated modulator: a detector voltage as a function of the drive step.
//!
//! The sensor and actuator halves share one plant so that a write is seen by
//! the next read, the same way the real PWM output feeds the photodiode.

use bias_traits::{Actuator, BoxError, Sensor};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::cell::RefCell;
use std::f64::consts::TAU;
use std::rc::Rc;

/// Number of drive codes across the full actuator span.
const SPAN: f64 = 65_536.0;

/// Sinusoidal transfer parameters, `offset + amplitude * sin(...)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimParams {
    pub offset_v: f32,
    pub amplitude_v: f32,
    /// Full periods across the drive span.
    pub periods: f32,
    pub phase_rad: f32,
    /// Uniform noise half-width.
    pub noise_v: f32,
    pub seed: u64,
}

impl Default for SimParams {
    fn default() -> Self {
        Self {
            offset_v: 1.0,
            amplitude_v: 1.0,
            periods: 3.0,
            phase_rad: 0.0,
            noise_v: 0.0,
            seed: 7,
        }
    }
}

enum Transfer {
    Sinusoid(SimParams),
    Custom(Box<dyn Fn(i64) -> f32>),
}

impl Transfer {
    fn eval(&self, x: i64) -> f32 {
        match self {
            Self::Sinusoid(p) => {
                let arg = TAU * f64::from(p.periods) * (x as f64) / SPAN + f64::from(p.phase_rad);
                p.offset_v + p.amplitude_v * (arg.sin() as f32)
            }
            Self::Custom(f) => f(x),
        }
    }
}

struct Plant {
    transfer: Transfer,
    step: u16,
    drift_steps: i64,
    noise_v: f32,
    quantum_v: Option<f32>,
    rng: StdRng,
    reads: u64,
    writes: u64,
}

impl Plant {
    fn sample(&mut self) -> f32 {
        let x = i64::from(self.step) + self.drift_steps;
        let mut v = self.transfer.eval(x);
        if self.noise_v > 0.0 {
            v += self.rng.gen_range(-self.noise_v..=self.noise_v);
        }
        if let Some(q) = self.quantum_v {
            v = (v / q).round() * q;
        }
        // A photodiode cannot report negative power.
        v.max(0.0)
    }
}

/// Handle on a shared simulated plant. Clones refer to the same plant.
#[derive(Clone)]
pub struct SimulatedModulator {
    plant: Rc<RefCell<Plant>>,
}

impl SimulatedModulator {
    pub fn new(params: SimParams) -> Self {
        Self::build(Transfer::Sinusoid(params), params.noise_v, params.seed)
    }

    /// Plant with an arbitrary noiseless transfer function of the
    /// (drift-shifted) drive code.
    pub fn with_response(f: impl Fn(i64) -> f32 + 'static) -> Self {
        Self::build(Transfer::Custom(Box::new(f)), 0.0, 0)
    }

    fn build(transfer: Transfer, noise_v: f32, seed: u64) -> Self {
        Self {
            plant: Rc::new(RefCell::new(Plant {
                transfer,
                step: 0,
                drift_steps: 0,
                noise_v,
                quantum_v: None,
                rng: StdRng::seed_from_u64(seed),
                reads: 0,
                writes: 0,
            })),
        }
    }

    /// Round every reading to a multiple of `lsb_v`, like an ADC would.
    #[must_use]
    pub fn quantized(self, lsb_v: f32) -> Self {
        if lsb_v > 0.0 {
            self.plant.borrow_mut().quantum_v = Some(lsb_v);
        }
        self
    }

    pub fn split(&self) -> (SimSensor, SimActuator) {
        (
            SimSensor {
                plant: Rc::clone(&self.plant),
            },
            SimActuator {
                plant: Rc::clone(&self.plant),
            },
        )
    }

    /// Shift the transfer curve along the drive axis. Positive drift moves
    /// every feature toward lower codes.
    pub fn set_drift(&self, steps: i64) {
        self.plant.borrow_mut().drift_steps = steps;
    }

    pub fn drift(&self) -> i64 {
        self.plant.borrow().drift_steps
    }

    /// Last code written by the actuator half.
    pub fn step(&self) -> u16 {
        self.plant.borrow().step
    }

    /// Noiseless response at `step` under the current drift.
    pub fn response_at(&self, step: u16) -> f32 {
        let p = self.plant.borrow();
        p.transfer.eval(i64::from(step) + p.drift_steps)
    }

    pub fn reads(&self) -> u64 {
        self.plant.borrow().reads
    }

    pub fn writes(&self) -> u64 {
        self.plant.borrow().writes
    }
}

pub struct SimSensor {
    plant: Rc<RefCell<Plant>>,
}

impl Sensor for SimSensor {
    fn read_response(&mut self) -> Result<f32, BoxError> {
        let mut p = self.plant.borrow_mut();
        p.reads += 1;
        let v = p.sample();
        tracing::trace!(step = p.step, voltage = v, "sim read");
        Ok(v)
    }
}

pub struct SimActuator {
    plant: Rc<RefCell<Plant>>,
}

impl Actuator for SimActuator {
    fn write_actuator(&mut self, step: u16) -> Result<(), BoxError> {
        let mut p = self.plant.borrow_mut();
        p.writes += 1;
        p.step = step;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_plant_is_one_plus_sine() {
        let m = SimulatedModulator::new(SimParams {
            periods: 1.0,
            ..SimParams::default()
        });
        assert!((m.response_at(0) - 1.0).abs() < 1e-6);
        assert!((m.response_at(16_384) - 2.0).abs() < 1e-4);
        assert!(m.response_at(49_152).abs() < 1e-4);
    }

    #[test]
    fn actuator_write_is_seen_by_sensor() {
        let m = SimulatedModulator::with_response(|x| x as f32);
        let (mut s, mut a) = m.split();
        a.write_actuator(1234).unwrap();
        assert_eq!(s.read_response().unwrap(), 1234.0);
        assert_eq!(m.writes(), 1);
        assert_eq!(m.reads(), 1);
    }

    #[test]
    fn drift_shifts_the_curve() {
        let m = SimulatedModulator::with_response(|x| x as f32);
        m.set_drift(100);
        assert_eq!(m.response_at(50), 150.0);
    }

    #[test]
    fn readings_are_clamped_and_quantized() {
        let m = SimulatedModulator::with_response(|x| if x < 10 { -1.0 } else { 0.123 })
            .quantized(0.05);
        let (mut s, mut a) = m.split();
        assert_eq!(s.read_response().unwrap(), 0.0);
        a.write_actuator(20).unwrap();
        assert!((s.read_response().unwrap() - 0.1).abs() < 1e-6);
    }

    #[test]
    fn seeded_noise_is_reproducible() {
        let p = SimParams {
            noise_v: 0.01,
            ..SimParams::default()
        };
        let read_n = |m: &SimulatedModulator| {
            let (mut s, _) = m.split();
            (0..8).map(|_| s.read_response().unwrap()).collect::<Vec<_>>()
        };
        let a = read_n(&SimulatedModulator::new(p));
        let b = read_n(&SimulatedModulator::new(p));
        assert_eq!(a, b);
        assert!(a.iter().all(|v| (v - 1.0).abs() <= 0.01 + 1e-6));
    }
}
