use std::thread;
use std::time::Duration;

use bias_traits::{Actuator, BoxError, Sensor};
use rppal::pwm::{Channel, Polarity, Pwm};
use rppal::spi::{Bus, Mode, SlaveSelect, Spi};
use tracing::trace;

use crate::error::{HwError, Result};

const ADC_FULL_SCALE: f32 = 4096.0;

/// Bias drive: a hardware PWM channel feeding an RC filter. The duty cycle
/// is the step scaled onto `[0, 1]`.
pub struct PwmActuator {
    pwm: Pwm,
    settle: Duration,
}

impl PwmActuator {
    pub fn new(channel: u8, frequency_hz: f64, settle_us: u64) -> Result<Self> {
        let channel = match channel {
            0 => Channel::Pwm0,
            1 => Channel::Pwm1,
            other => return Err(HwError::Pwm(format!("no PWM channel {other}"))),
        };
        let pwm = Pwm::with_frequency(channel, frequency_hz, 0.0, Polarity::Normal, true)
            .map_err(|e| HwError::Pwm(e.to_string()))?;
        Ok(Self {
            pwm,
            settle: Duration::from_micros(settle_us),
        })
    }
}

impl Actuator for PwmActuator {
    fn write_actuator(&mut self, step: u16) -> std::result::Result<(), BoxError> {
        let duty = f64::from(step) / f64::from(u16::MAX);
        self.pwm
            .set_duty_cycle(duty)
            .map_err(|e| HwError::Pwm(e.to_string()))?;
        // Let the filter output settle before anyone reads the detector.
        if !self.settle.is_zero() {
            thread::sleep(self.settle);
        }
        Ok(())
    }
}

/// Photodiode voltage through an MCP3208 12-bit ADC on SPI.
pub struct Mcp3208Sensor {
    spi: Spi,
    channel: u8,
    vref: f32,
    average: u32,
}

impl Mcp3208Sensor {
    pub fn new(
        bus: u8,
        slave_select: u8,
        clock_hz: u32,
        channel: u8,
        vref: f32,
        average: u32,
    ) -> Result<Self> {
        let bus = match bus {
            0 => Bus::Spi0,
            1 => Bus::Spi1,
            other => return Err(HwError::Spi(format!("no SPI bus {other}"))),
        };
        let ss = match slave_select {
            0 => SlaveSelect::Ss0,
            1 => SlaveSelect::Ss1,
            2 => SlaveSelect::Ss2,
            other => return Err(HwError::Spi(format!("no slave select {other}"))),
        };
        if channel > 7 {
            return Err(HwError::Spi(format!("no ADC channel {channel}")));
        }
        let spi = Spi::new(bus, ss, clock_hz, Mode::Mode0).map_err(|e| HwError::Spi(e.to_string()))?;
        Ok(Self {
            spi,
            channel,
            vref,
            average: average.max(1),
        })
    }

    /// One single-ended conversion, 0..4095.
    pub fn read_raw(&mut self) -> Result<u16> {
        let tx = [0x06 | (self.channel >> 2), (self.channel & 0x03) << 6, 0];
        let mut rx = [0u8; 3];
        self.spi
            .transfer(&mut rx, &tx)
            .map_err(|e| HwError::Spi(e.to_string()))?;
        let raw = ((u16::from(rx[1]) & 0x0F) << 8) | u16::from(rx[2]);
        trace!(raw, "mcp3208 raw read");
        Ok(raw)
    }
}

impl Sensor for Mcp3208Sensor {
    fn read_response(&mut self) -> std::result::Result<f32, BoxError> {
        let mut sum = 0u32;
        for _ in 0..self.average {
            sum += u32::from(self.read_raw()?);
        }
        #[allow(clippy::cast_precision_loss)]
        let mean = sum as f32 / self.average as f32;
        Ok(mean * self.vref / ADC_FULL_SCALE)
    }
}
