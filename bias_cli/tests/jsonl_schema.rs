use assert_cmd::prelude::*;
use rstest::rstest;
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use tempfile::tempdir;

fn write_valid_config(dir: &tempfile::TempDir, sim: &str) -> PathBuf {
    let toml = format!(
        "[tracking]\nrecheck_ms = 0\n\n[storage]\npath = \"{}\"\n\n[sim]\n{sim}\n",
        dir.path()
            .join("tuning.bin")
            .display()
            .to_string()
            .replace('\\', "/")
    );
    let path = dir.path().join("cfg.toml");
    fs::write(&path, toml).unwrap();
    path
}

fn json_line_with(out: &[u8], key: &str) -> serde_json::Value {
    let text = String::from_utf8_lossy(out);
    let line = text
        .lines()
        .find(|l| l.contains(&format!("\"{key}\"")))
        .unwrap_or_else(|| panic!("no JSON line with {key}; output was: {text}"));
    serde_json::from_str(line).expect("line parses as JSON")
}

/// Validate the JSONL schema for a sweep over the default simulated modulator.
#[rstest]
fn jsonl_sweep_schema() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir, "");

    let out = Command::cargo_bin("bias")
        .unwrap()
        .args(["--json", "--log-level", "error", "--config"])
        .arg(&cfg)
        .arg("sweep")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let v = json_line_with(&out, "peak_v");

    let peak = v["peak_v"].as_f64().unwrap();
    let null = v["null_v"].as_f64().unwrap();
    let quad = v["quad_target_v"].as_f64().unwrap();
    assert!(peak > 1.99, "peak {peak}");
    assert!((0.01..0.05).contains(&null), "null {null}");
    assert!((quad - peak / 2.0).abs() < 1e-6);
    assert!(v["peak_step"].is_i64());
    assert!(v["null_step"].is_i64());
    assert_eq!(v["samples"], 4096);
}

#[rstest]
fn jsonl_lock_summary_schema() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir, "");

    let out = Command::cargo_bin("bias")
        .unwrap()
        .args(["--json", "--log-level", "error", "--config"])
        .arg(&cfg)
        .args(["lock", "--mode", "peak", "--cycles", "4"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let v = json_line_with(&out, "final_step");

    assert_eq!(v["mode"], "peak");
    assert_eq!(v["cycles"], 4);
    assert_eq!(v["converged_cycles"], 4);
    assert_eq!(v["reacquisitions"], 0);
    assert!(v["final_voltage"].as_f64().unwrap() > 1.9);
}

#[rstest]
#[case("amplitude_v = 0.0", &["lock", "--mode", "quad-minus", "--cycles", "1"], "Unreachable", 3)]
#[case("offset_v = 0.0\namplitude_v = 0.0", &["sweep"], "DetectionFailed", 4)]
fn jsonl_error_schema(
    #[case] sim: &str,
    #[case] args: &[&str],
    #[case] reason: &str,
    #[case] code: i32,
) {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir, sim);

    let err = Command::cargo_bin("bias")
        .unwrap()
        .args(["--json", "--log-level", "off", "--config"])
        .arg(&cfg)
        .args(args)
        .assert()
        .code(code)
        .get_output()
        .stderr
        .clone();
    let v = json_line_with(&err, "exit_code");

    assert_eq!(v["reason"], reason);
    assert_eq!(v["exit_code"], code);
    assert!(v["message"].as_str().unwrap().starts_with("What happened:"));
}
