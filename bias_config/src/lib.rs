#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schemas, tuning parameters and their persisted record.
//!
//! - `Config` and sub-structs are deserialized from TOML and validated.
//! - `TuningParams` is the runtime-tunable controller configuration; every
//!   write goes through a range-checked setter.
//! - `record` and `store` encode the tuning into a checksummed block on a
//!   non-volatile medium.
//! - `curve_csv` imports/exports swept response curves.
use serde::Deserialize;

pub mod curve_csv;
pub mod error;
pub mod record;
pub mod store;
pub mod tuning;

pub use curve_csv::{CurveRow, load_curve_csv, write_curve_csv};
pub use error::ConfigError;
pub use store::{ConfigStore, TuningSource};
pub use tuning::TuningParams;

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SweepCfg {
    /// Number of samples taken across the full actuator span.
    pub resolution: u32,
    /// Readings below this are amplifier offset, not a transmission null.
    pub noise_floor_v: f32,
}

impl Default for SweepCfg {
    fn default() -> Self {
        Self {
            resolution: 4096,
            noise_floor_v: 0.01,
        }
    }
}

/// Boot defaults for `TuningParams`; overridden by a valid stored record.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct TuningCfg {
    pub tolerance_v: f32,
    /// Fine-loop step in actuator codes. Install-time constant.
    pub gain: u32,
    pub quad_buffer: u32,
    pub peak_buffer: u32,
    pub null_buffer: u32,
}

impl Default for TuningCfg {
    fn default() -> Self {
        let d = TuningParams::default();
        Self {
            tolerance_v: d.tolerance_v(),
            gain: d.gain(),
            quad_buffer: d.quad_buffer(),
            peak_buffer: d.peak_buffer(),
            null_buffer: d.null_buffer(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ModeCfg {
    Peak,
    Null,
    QuadPlus,
    QuadMinus,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct TrackingCfg {
    /// Upper bound on fine steps per control cycle.
    pub max_fine_iterations: u32,
    /// Wait between drift checks once converged (ms).
    pub recheck_ms: u64,
    /// Operating point to lock. No built-in default: the rising and falling
    /// quadrature crossings are equally valid, so the operator must choose.
    pub mode: Option<ModeCfg>,
}

impl Default for TrackingCfg {
    fn default() -> Self {
        Self {
            max_fine_iterations: 2048,
            recheck_ms: 100,
            mode: None,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct StorageCfg {
    /// File emulating the flash block that holds the tuning record.
    pub path: String,
    /// Byte offset of the record inside the block.
    pub offset: usize,
    pub block_size: usize,
}

impl Default for StorageCfg {
    fn default() -> Self {
        Self {
            path: "bias_tuning.bin".to_string(),
            offset: 0,
            block_size: 4096,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

/// Synthetic modulator used when no hardware backend is compiled in.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SimCfg {
    pub offset_v: f32,
    pub amplitude_v: f32,
    /// Transfer-function periods across the full actuator span.
    pub periods: f32,
    pub phase_rad: f32,
    /// Peak uniform noise added to each reading.
    pub noise_v: f32,
    pub seed: u64,
}

impl Default for SimCfg {
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

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct HardwareCfg {
    /// Raspberry Pi hardware PWM channel (0 or 1)
    pub pwm_channel: u8,
    pub pwm_frequency_hz: f64,
    /// Settling delay after each actuator write (us)
    pub settle_us: u64,
    pub spi_bus: u8,
    pub spi_ss: u8,
    pub spi_clock_hz: u32,
    /// MCP3208 input channel
    pub adc_channel: u8,
    pub adc_vref: f32,
    /// Raw conversions averaged per reading
    pub adc_average: u32,
}

impl Default for HardwareCfg {
    fn default() -> Self {
        Self {
            pwm_channel: 0,
            pwm_frequency_hz: 1_000.0,
            settle_us: 2_000,
            spi_bus: 0,
            spi_ss: 0,
            spi_clock_hz: 1_000_000,
            adc_channel: 0,
            adc_vref: 3.3,
            adc_average: 4,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub sweep: SweepCfg,
    pub tuning: TuningCfg,
    pub tracking: TrackingCfg,
    pub storage: StorageCfg,
    pub logging: Logging,
    pub sim: SimCfg,
    pub hardware: HardwareCfg,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Sweep
        if !(2..=65_536).contains(&self.sweep.resolution) {
            eyre::bail!("sweep.resolution must be in [2, 65536]");
        }
        if !self.sweep.noise_floor_v.is_finite() || self.sweep.noise_floor_v < 0.0 {
            eyre::bail!("sweep.noise_floor_v must be >= 0.0");
        }

        // Tuning: reuse the setter ranges so TOML and commands agree
        TuningParams::try_from(&self.tuning).map_err(|e| eyre::eyre!("tuning: {e}"))?;

        // Tracking
        if self.tracking.max_fine_iterations == 0 {
            eyre::bail!("tracking.max_fine_iterations must be >= 1");
        }
        if self.tracking.recheck_ms > 60 * 60 * 1000 {
            eyre::bail!("tracking.recheck_ms is unreasonably large (>1h)");
        }

        // Storage
        if self.storage.path.trim().is_empty() {
            eyre::bail!("storage.path must not be empty");
        }
        if self.storage.block_size < record::RECORD_LEN {
            eyre::bail!(
                "storage.block_size must be >= {} (record size)",
                record::RECORD_LEN
            );
        }
        if self.storage.offset > self.storage.block_size - record::RECORD_LEN {
            eyre::bail!("storage.offset leaves no room for the record inside the block");
        }

        // Logging
        if let Some(r) = self.logging.rotation.as_deref()
            && !matches!(r, "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be one of never|daily|hourly");
        }

        // Simulation
        if !(self.sim.periods.is_finite() && self.sim.periods > 0.0) {
            eyre::bail!("sim.periods must be > 0.0");
        }
        if !self.sim.amplitude_v.is_finite() || self.sim.amplitude_v < 0.0 {
            eyre::bail!("sim.amplitude_v must be >= 0.0");
        }
        if !self.sim.noise_v.is_finite() || self.sim.noise_v < 0.0 {
            eyre::bail!("sim.noise_v must be >= 0.0");
        }

        // Hardware
        if self.hardware.pwm_channel > 1 {
            eyre::bail!("hardware.pwm_channel must be 0 or 1");
        }
        if !(self.hardware.pwm_frequency_hz > 0.0) {
            eyre::bail!("hardware.pwm_frequency_hz must be > 0");
        }
        if self.hardware.adc_channel > 7 {
            eyre::bail!("hardware.adc_channel must be in [0, 7]");
        }
        if !(self.hardware.adc_vref > 0.0) {
            eyre::bail!("hardware.adc_vref must be > 0.0");
        }
        if self.hardware.adc_average == 0 {
            eyre::bail!("hardware.adc_average must be >= 1");
        }

        Ok(())
    }
}
