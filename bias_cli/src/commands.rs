//! Subcommand bodies. Each returns after printing its result on stdout,
//! either as text or as one JSON line.

use crate::backend::{self, DynActuator, DynSensor};
use crate::cli::json_mode;
use crate::error_fmt::INVALID_CONFIG;
use bias_config::{
    Config, CurveRow, TuningParams, TuningSource, load_curve_csv, write_curve_csv,
};
use bias_core::plant::Plant;
use bias_core::{
    BiasController, ControlFlags, Detection, LockMode, RunParams, Sample, Step, SweepCurve, detect,
    run,
};
use bias_traits::MonotonicClock;
use eyre::WrapErr;
use serde_json::json;
use std::path::Path;
use std::sync::Arc;

/// Drive code used for the self-check write: mid-scale.
const SELF_CHECK_STEP: u16 = 32_768;

fn emit(value: &serde_json::Value, text: &str) {
    if json_mode() {
        println!("{value}");
    } else {
        println!("{text}");
    }
}

fn build_controller(
    cfg: &Config,
    tuning: TuningParams,
) -> eyre::Result<BiasController<DynSensor, DynActuator>> {
    let (sensor, actuator) = backend::make_hw(cfg)?;
    BiasController::builder()
        .with_sensor(sensor)
        .with_actuator(actuator)
        .with_config(cfg)
        .wrap_err(INVALID_CONFIG)?
        .with_tuning(tuning)
        .build()
}

fn controller_with_stored_tuning(
    cfg: &Config,
) -> eyre::Result<BiasController<DynSensor, DynActuator>> {
    let mut store = backend::open_store(cfg)?;
    let (tuning, source) = backend::effective_tuning(cfg, &mut store)?;
    tracing::debug!(source = source.as_str(), "tuning selected");
    build_controller(cfg, tuning)
}

fn print_detection(d: &Detection, samples: usize) {
    emit(
        &json!({
            "peak_v": d.peak_v,
            "peak_step": d.peak_step.get(),
            "null_v": d.null_v,
            "null_step": d.null_step.get(),
            "quad_target_v": d.quad_target_v,
            "samples": samples,
        }),
        &format!(
            "peak:       {:.4} V at step {}\nnull:       {:.4} V at step {}\nquadrature: {:.4} V\nsamples:    {samples}",
            d.peak_v, d.peak_step, d.null_v, d.null_step, d.quad_target_v
        ),
    );
}

pub fn sweep(cfg: &Config, csv: Option<&Path>) -> eyre::Result<()> {
    let mut controller = controller_with_stored_tuning(cfg)?;
    let curve = controller.sweep()?;
    if let Some(path) = csv {
        let rows = curve.samples().iter().map(|s| CurveRow {
            step: i64::from(s.step.get()),
            voltage: s.voltage,
        });
        write_curve_csv(path, rows)?;
        tracing::info!(path = %path.display(), samples = curve.len(), "curve written");
    }
    let d = controller.detect_curve(&curve)?;
    print_detection(&d, curve.len());
    Ok(())
}

pub fn detect_csv(cfg: &Config, csv: &Path) -> eyre::Result<()> {
    let rows = load_curve_csv(csv)?;
    let samples = rows
        .iter()
        .map(|r| {
            Step::new(r.step)
                .map(|step| Sample {
                    step,
                    voltage: r.voltage,
                })
                .ok_or_else(|| eyre::eyre!("step {} outside the drive range", r.step))
        })
        .collect::<eyre::Result<Vec<_>>>()?;
    let curve = SweepCurve::from_samples(samples).map_err(eyre::Report::new)?;
    let d = detect(&curve, cfg.sweep.noise_floor_v)
        .map_err(eyre::Report::new)
        .wrap_err_with(|| format!("detect over {}", csv.display()))?;
    print_detection(&d, curve.len());
    Ok(())
}

pub fn lock(cfg: &Config, mode: Option<LockMode>, cycles: Option<u64>) -> eyre::Result<()> {
    let mode = mode
        .or_else(|| cfg.tracking.mode.map(LockMode::from))
        .ok_or_else(|| {
            eyre::eyre!("no lock mode chosen: pass --mode or set tracking.mode").wrap_err(INVALID_CONFIG)
        })?;
    let mut controller = controller_with_stored_tuning(cfg)?;

    let flags = Arc::new(ControlFlags::new());
    {
        let flags = Arc::clone(&flags);
        ctrlc::set_handler(move || flags.request_shutdown()).wrap_err("install Ctrl-C handler")?;
    }

    let summary = run(
        &mut controller,
        &flags,
        &MonotonicClock::new(),
        RunParams {
            mode,
            max_cycles: cycles,
        },
    )?;

    emit(
        &json!({
            "mode": summary.mode.as_str(),
            "cycles": summary.cycles,
            "converged_cycles": summary.converged_cycles,
            "reacquisitions": summary.reacquisitions,
            "relocks": summary.relocks,
            "final_step": summary.final_step.get(),
            "final_voltage": summary.final_voltage,
        }),
        &format!(
            "{} lock held at step {} ({:.4} V): {} cycles, {} converged, {} reacquisitions",
            summary.mode,
            summary.final_step,
            summary.final_voltage,
            summary.cycles,
            summary.converged_cycles,
            summary.reacquisitions
        ),
    );
    Ok(())
}

fn print_tuning(t: &TuningParams, source: &str) {
    emit(
        &json!({
            "tolerance_v": t.tolerance_v(),
            "gain": t.gain(),
            "quad_buffer": t.quad_buffer(),
            "peak_buffer": t.peak_buffer(),
            "null_buffer": t.null_buffer(),
            "source": source,
        }),
        &format!(
            "tolerance_v = {}\ngain        = {}\nquad_buffer = {}\npeak_buffer = {}\nnull_buffer = {}\nsource      = {source}",
            t.tolerance_v(),
            t.gain(),
            t.quad_buffer(),
            t.peak_buffer(),
            t.null_buffer()
        ),
    );
}

pub fn config_show(cfg: &Config) -> eyre::Result<()> {
    let mut store = backend::open_store(cfg)?;
    let (tuning, source) = backend::effective_tuning(cfg, &mut store)?;
    print_tuning(&tuning, source.as_str());
    Ok(())
}

pub fn config_set(cfg: &Config, key: &str, value: &str, save: bool) -> eyre::Result<()> {
    let mut store = backend::open_store(cfg)?;
    let (mut tuning, source) = backend::effective_tuning(cfg, &mut store)?;
    tuning.apply(key, value)?;
    tracing::info!(key, value, "tuning updated");
    let source = if save {
        store.save(&tuning)?;
        TuningSource::Stored.as_str()
    } else {
        tracing::warn!("change not saved; pass --save to persist it");
        match source {
            TuningSource::Stored => "stored (modified, unsaved)",
            TuningSource::Defaults => "defaults (modified, unsaved)",
        }
    };
    print_tuning(&tuning, source);
    Ok(())
}

pub fn config_save(cfg: &Config) -> eyre::Result<()> {
    let mut store = backend::open_store(cfg)?;
    let (tuning, _) = backend::effective_tuning(cfg, &mut store)?;
    store.save(&tuning)?;
    tracing::info!(path = %cfg.storage.path, "tuning saved");
    print_tuning(&tuning, TuningSource::Stored.as_str());
    Ok(())
}

pub fn self_check(cfg: &Config) -> eyre::Result<()> {
    let (sensor, actuator) = backend::make_hw(cfg)?;
    let mut plant = Plant::new(sensor, actuator);
    let idle_v = plant.read().wrap_err("initial sensor read")?;
    let mid = Step::from(SELF_CHECK_STEP);
    let mid_v = plant.move_to(mid).wrap_err("actuator write")?;
    plant.write(Step::MIN).wrap_err("return actuator to minimum")?;
    tracing::info!(idle_v, mid_v, "self-check ok");
    emit(
        &json!({ "ok": true, "idle_v": idle_v, "mid_step": mid.get(), "mid_v": mid_v }),
        &format!("OK: sensor {idle_v:.4} V idle, {mid_v:.4} V at step {mid}"),
    );
    Ok(())
}
