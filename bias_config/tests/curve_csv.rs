use bias_config::{CurveRow, load_curve_csv, write_curve_csv};
use bias_traits::STEP_MAX;
use std::fs;

#[test]
fn written_curve_loads_back() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("curve.csv");
    let rows = vec![
        CurveRow { step: 0, voltage: 1.0 },
        CurveRow { step: 16, voltage: 1.5 },
        CurveRow { step: 32, voltage: 0.25 },
    ];
    write_curve_csv(&path, rows.clone()).unwrap();

    let text = fs::read_to_string(&path).unwrap();
    assert!(text.starts_with("step,voltage\n"));
    assert_eq!(load_curve_csv(&path).unwrap(), rows);
}

#[test]
fn wrong_header_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("curve.csv");
    fs::write(&path, "code,volts\n0,1.0\n").unwrap();
    let err = load_curve_csv(&path).unwrap_err();
    assert!(format!("{err}").contains("step,voltage"));
}

#[test]
fn unsorted_steps_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("curve.csv");
    fs::write(&path, "step,voltage\n0,1.0\n32,1.1\n16,1.2\n").unwrap();
    let err = load_curve_csv(&path).unwrap_err();
    assert!(format!("{err}").contains("strictly increasing"));
}

#[test]
fn step_range_follows_the_actuator() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("curve.csv");
    let top = i64::from(STEP_MAX);

    fs::write(&path, format!("step,voltage\n0,1.0\n{top},1.1\n")).unwrap();
    assert_eq!(load_curve_csv(&path).unwrap()[1].step, top);

    fs::write(&path, format!("step,voltage\n0,1.0\n{},1.1\n", top + 1)).unwrap();
    let err = load_curve_csv(&path).unwrap_err();
    assert!(format!("{err}").contains(&format!("outside [0, {top}]")));
}

#[test]
fn malformed_number_names_the_row() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("curve.csv");
    fs::write(&path, "step,voltage\n0,1.0\n16,abc\n").unwrap();
    let err = load_curve_csv(&path).unwrap_err();
    assert!(format!("{err}").contains("row 3"));
}
