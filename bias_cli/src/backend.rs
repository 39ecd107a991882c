//! Collaborator assembly: hardware drivers or the simulated modulator, and
//! the tuning store.

use bias_config::{Config, ConfigStore, TuningParams, TuningSource};
use bias_hardware::FileStorage;
use bias_traits::{Actuator, Sensor};
use eyre::WrapErr;

pub type DynSensor = Box<dyn Sensor>;
pub type DynActuator = Box<dyn Actuator>;

/// Test hook: when set, every simulated sensor read fails as an SPI fault.
#[cfg(not(all(feature = "hardware", target_os = "linux")))]
const SENSOR_FAULT_ENV: &str = "BIAS_TEST_SENSOR_FAULT";

#[cfg(not(all(feature = "hardware", target_os = "linux")))]
struct FaultySensor;

#[cfg(not(all(feature = "hardware", target_os = "linux")))]
impl Sensor for FaultySensor {
    fn read_response(&mut self) -> Result<f32, bias_traits::BoxError> {
        Err(Box::new(bias_hardware::HwError::Spi(
            "injected sensor fault".into(),
        )))
    }
}

#[cfg(all(feature = "hardware", target_os = "linux"))]
fn open_failed(e: bias_hardware::HwError) -> eyre::Report {
    eyre::Report::new(bias_core::LockError::HardwareFault(e.to_string()))
}

#[cfg(all(feature = "hardware", target_os = "linux"))]
pub fn make_hw(cfg: &Config) -> eyre::Result<(DynSensor, DynActuator)> {
    let hw = &cfg.hardware;
    let sensor = bias_hardware::Mcp3208Sensor::new(
        hw.spi_bus,
        hw.spi_ss,
        hw.spi_clock_hz,
        hw.adc_channel,
        hw.adc_vref,
        hw.adc_average,
    )
    .map_err(open_failed)
    .wrap_err("open MCP3208 on SPI")?;
    let actuator = bias_hardware::PwmActuator::new(hw.pwm_channel, hw.pwm_frequency_hz, hw.settle_us)
        .map_err(open_failed)
        .wrap_err("open bias PWM")?;
    tracing::info!(
        pwm_channel = hw.pwm_channel,
        spi_bus = hw.spi_bus,
        adc_channel = hw.adc_channel,
        "hardware backend ready"
    );
    Ok((Box::new(sensor), Box::new(actuator)))
}

#[cfg(not(all(feature = "hardware", target_os = "linux")))]
pub fn make_hw(cfg: &Config) -> eyre::Result<(DynSensor, DynActuator)> {
    let s = &cfg.sim;
    let sim = bias_hardware::SimulatedModulator::new(bias_hardware::SimParams {
        offset_v: s.offset_v,
        amplitude_v: s.amplitude_v,
        periods: s.periods,
        phase_rad: s.phase_rad,
        noise_v: s.noise_v,
        seed: s.seed,
    });
    let (sensor, actuator) = sim.split();
    tracing::info!(
        periods = s.periods,
        amplitude_v = s.amplitude_v,
        noise_v = s.noise_v,
        "simulated modulator backend"
    );
    let sensor: DynSensor = if std::env::var_os(SENSOR_FAULT_ENV).is_some() {
        Box::new(FaultySensor)
    } else {
        Box::new(sensor)
    };
    Ok((sensor, Box::new(actuator)))
}

pub fn open_store(cfg: &Config) -> eyre::Result<ConfigStore<FileStorage>> {
    let storage = FileStorage::open(&cfg.storage.path, cfg.storage.block_size)
        .wrap_err_with(|| format!("open tuning storage {}", cfg.storage.path))?;
    Ok(ConfigStore::new(storage, cfg.storage.offset))
}

/// Stored tuning when a valid record exists, boot defaults from the config otherwise.
pub fn effective_tuning(
    cfg: &Config,
    store: &mut ConfigStore<FileStorage>,
) -> eyre::Result<(TuningParams, TuningSource)> {
    let defaults = TuningParams::try_from(&cfg.tuning).wrap_err(crate::error_fmt::INVALID_CONFIG)?;
    Ok(store.load_or_default(defaults))
}
