//! Collaborator seams for the bias controller.
//!
//! The engine never touches registers directly: it drives an `Actuator`,
//! reads a `Sensor`, and persists tuning through an `NvStorage` medium.

pub mod clock;

pub use clock::{Clock, MonotonicClock};

/// Error type returned across every trait boundary in this crate.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Lowest actuator code.
pub const STEP_MIN: u16 = 0;
/// Highest actuator code; the bias DAC is 16 bits wide.
pub const STEP_MAX: u16 = u16::MAX;

/// Photodetector channel. Each call yields one calibrated voltage; any
/// averaging of raw ADC samples happens behind this call.
pub trait Sensor {
    fn read_response(&mut self) -> Result<f32, BoxError>;
}

/// Bias DAC channel. Implementations clamp to the 16-bit range and are
/// responsible for settling before the next `Sensor::read_response`.
pub trait Actuator {
    fn write_actuator(&mut self, step: u16) -> Result<(), BoxError>;
}

/// Erase-before-write non-volatile medium (flash block or an emulation of one).
///
/// Erased bytes read back as `0xFF`.
pub trait NvStorage {
    fn read(&mut self, offset: usize, buf: &mut [u8]) -> Result<(), BoxError>;
    fn erase(&mut self, offset: usize, len: usize) -> Result<(), BoxError>;
    fn program(&mut self, offset: usize, data: &[u8]) -> Result<(), BoxError>;
}

impl<T: Sensor + ?Sized> Sensor for Box<T> {
    fn read_response(&mut self) -> Result<f32, BoxError> {
        (**self).read_response()
    }
}

impl<T: Actuator + ?Sized> Actuator for Box<T> {
    fn write_actuator(&mut self, step: u16) -> Result<(), BoxError> {
        (**self).write_actuator(step)
    }
}

impl<T: NvStorage + ?Sized> NvStorage for Box<T> {
    fn read(&mut self, offset: usize, buf: &mut [u8]) -> Result<(), BoxError> {
        (**self).read(offset, buf)
    }
    fn erase(&mut self, offset: usize, len: usize) -> Result<(), BoxError> {
        (**self).erase(offset, len)
    }
    fn program(&mut self, offset: usize, data: &[u8]) -> Result<(), BoxError> {
        (**self).program(offset, data)
    }
}
