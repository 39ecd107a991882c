//! Human-readable error descriptions, exit codes and structured JSON errors.

use bias_config::ConfigError;
use bias_core::{BuildError, DetectionError, LockError};

/// Marker context attached by `main` to config loading and validation failures.
pub const INVALID_CONFIG: &str = "invalid configuration";

fn lock_error(err: &eyre::Report) -> Option<&LockError> {
    err.downcast_ref::<LockError>()
}

fn detection_error(err: &eyre::Report) -> Option<&DetectionError> {
    err.downcast_ref::<DetectionError>().or(match lock_error(err) {
        Some(LockError::Detection(d)) => Some(d),
        _ => None,
    })
}

fn is_config_error(err: &eyre::Report) -> bool {
    err.downcast_ref::<ConfigError>().is_some()
        || err.downcast_ref::<BuildError>().is_some()
        || err.downcast_ref::<toml::de::Error>().is_some()
        || err.chain().any(|c| c.to_string().contains(INVALID_CONFIG))
}

fn is_hardware_error(err: &eyre::Report) -> bool {
    matches!(
        lock_error(err),
        Some(LockError::Hardware(_) | LockError::HardwareFault(_) | LockError::Timeout)
    )
}

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    if let Some(de) = detection_error(err) {
        return match de {
            DetectionError::NullNotFound => "What happened: No swept sample rose above the noise floor, so no transmission null was found.\nLikely causes: Laser off, fiber disconnected, photodiode unpowered, or sweep.noise_floor_v set above the real signal.\nHow to fix: Check the optical path and detector supply, or lower sweep.noise_floor_v.".to_string(),
            DetectionError::InsufficientData => "What happened: The swept curve has fewer than two usable samples.\nLikely causes: Empty or truncated CSV, or every reading was not a number.\nHow to fix: Re-record the curve with `bias sweep --csv FILE`.".to_string(),
            DetectionError::Unordered(i) => format!(
                "What happened: Curve steps are not strictly increasing (sample {i}).\nLikely causes: Hand-edited or concatenated CSV.\nHow to fix: Sort the rows by step and remove duplicates."
            ),
        };
    }

    if let Some(le) = lock_error(err) {
        return match le {
            LockError::Unreachable { mode } => format!(
                "What happened: The {mode} setpoint was not reached walking from either rail.\nLikely causes: Drive span covers less than one transfer period, modulator disconnected, or tolerance too tight for the sensor noise.\nHow to fix: Check the bias drive wiring, then raise tuning.tolerance_v or pick another mode."
            ),
            LockError::Timeout => "What happened: Sensor read timed out.\nLikely causes: ADC not wired correctly, no power/ground, or wrong SPI bus.\nHow to fix: Verify the [hardware] spi_* settings and the ADC supply.".to_string(),
            LockError::HardwareFault(msg) | LockError::Hardware(msg) => format!(
                "What happened: Hardware error ({msg}).\nLikely causes: PWM or SPI peripheral disabled, wrong channel, or insufficient permissions.\nHow to fix: Enable the peripherals, check [hardware] in the config, and make sure the process may access /dev/spidev* and the PWM sysfs."
            ),
            LockError::State(msg) => format!(
                "What happened: Controller used out of order ({msg}).\nLikely causes: Internal sequencing error.\nHow to fix: Re-run with --log-level=debug and report the log."
            ),
            LockError::Detection(_) => format!(
                "What happened: {le}.\nLikely causes: See logs.\nHow to fix: Re-run with --log-level=debug."
            ),
        };
    }

    if let Some(ce) = err.downcast_ref::<ConfigError>() {
        return match ce {
            ConfigError::UnknownKey(k) => format!(
                "What happened: Unknown tuning parameter '{k}'.\nLikely causes: Typo, or a value that is fixed at install time (gain).\nHow to fix: Use one of tolerance, quad_buffer, peak_buffer, null_buffer."
            ),
            ConfigError::OutOfRange { field, value, allowed } => format!(
                "What happened: {field} = {value} is out of range.\nLikely causes: Value outside {allowed}.\nHow to fix: Pick a value within {allowed}; the previous value is still in force."
            ),
            ConfigError::Io(msg) => format!(
                "What happened: Tuning storage could not be written ({msg}).\nLikely causes: storage.path not writable or disk full.\nHow to fix: Check permissions on storage.path."
            ),
            other => format!(
                "What happened: {other}.\nLikely causes: Fresh or damaged tuning block.\nHow to fix: Run `bias config save` to write a fresh record."
            ),
        };
    }

    if is_config_error(err) {
        let detail = err
            .chain()
            .last()
            .map(ToString::to_string)
            .unwrap_or_default();
        return format!(
            "What happened: Configuration is invalid or incomplete ({detail}).\nLikely causes: Missing or out-of-range values in the TOML, or no lock mode chosen.\nHow to fix: Edit the config file (see etc/bias_config.toml) and try again."
        );
    }

    let msg = err.to_string();
    if msg.to_ascii_lowercase().contains("curve csv must have headers") {
        return "Invalid headers in curve CSV. Expected 'step,voltage'.".to_string();
    }

    // Generic fallback
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Stable exit codes per failure class; 2 is left to clap usage errors.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    if detection_error(err).is_some() {
        return 4;
    }
    if matches!(lock_error(err), Some(LockError::Unreachable { .. })) {
        return 3;
    }
    if is_hardware_error(err) {
        return 6;
    }
    if is_config_error(err) {
        return 5;
    }
    1
}

pub fn reason_name(err: &eyre::Report) -> &'static str {
    match exit_code_for_error(err) {
        3 => "Unreachable",
        4 => "DetectionFailed",
        5 => "InvalidConfig",
        6 => "Hardware",
        _ => "Error",
    }
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    use serde_json::json;

    let mut obj = json!({
        "reason": reason_name(err),
        "exit_code": exit_code_for_error(err),
        "message": humanize(err),
    });
    if let Some(LockError::Unreachable { mode }) = lock_error(err) {
        obj["details"] = json!({ "mode": mode.as_str() });
    }
    obj.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use bias_core::LockMode;
    use eyre::WrapErr;

    #[test]
    fn exit_codes_follow_wrapped_errors() {
        let r: eyre::Result<()> = Err(eyre::Report::new(LockError::Unreachable {
            mode: LockMode::Null,
        }));
        let r = r.wrap_err("acquire null setpoint").unwrap_err();
        assert_eq!(exit_code_for_error(&r), 3);

        let d = eyre::Report::new(LockError::from(DetectionError::NullNotFound));
        assert_eq!(exit_code_for_error(&d), 4);
        assert!(humanize(&d).contains("noise floor"));

        let c = eyre::eyre!("tracking.mode missing").wrap_err(INVALID_CONFIG);
        assert_eq!(exit_code_for_error(&c), 5);

        let h = eyre::Report::new(LockError::HardwareFault("spi error: bus".into()));
        assert_eq!(exit_code_for_error(&h), 6);

        assert_eq!(exit_code_for_error(&eyre::eyre!("boom")), 1);
    }

    #[test]
    fn json_carries_reason_and_mode() {
        let r = eyre::Report::new(LockError::Unreachable {
            mode: LockMode::QuadPlus,
        });
        let v: serde_json::Value = serde_json::from_str(&format_error_json(&r)).unwrap();
        assert_eq!(v["reason"], "Unreachable");
        assert_eq!(v["exit_code"], 3);
        assert_eq!(v["details"]["mode"], "quad-plus");
    }
}
