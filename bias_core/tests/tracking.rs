use bias_config::TuningParams;
use bias_core::plant::Plant;
use bias_core::tracking::{MAX_SLOPE_CHECKS, TrackOutcome, track};
use bias_core::{ControllerRuntimeState, Direction, LockMode, LockTarget, Rail, Step};
use bias_hardware::{SimActuator, SimSensor, SimulatedModulator};
use bias_traits::{Actuator, BoxError};
use rstest::rstest;

/// Forwards to the simulated actuator and remembers the highest code.
struct Tap {
    inner: SimActuator,
    highest: u16,
}

impl Actuator for Tap {
    fn write_actuator(&mut self, step: u16) -> Result<(), BoxError> {
        self.highest = self.highest.max(step);
        self.inner.write_actuator(step)
    }
}

fn rig(sim: &SimulatedModulator) -> Plant<SimSensor, Tap> {
    let (s, a) = sim.split();
    Plant::new(s, Tap { inner: a, highest: 0 })
}

fn start_at(plant: &mut Plant<SimSensor, Tap>, step: i64) -> ControllerRuntimeState {
    let current_step = Step::new(step).unwrap();
    let current_voltage = plant.move_to(current_step).unwrap();
    ControllerRuntimeState {
        current_step,
        current_voltage,
        ..ControllerRuntimeState::default()
    }
}

fn target(mode: LockMode, v: f32) -> LockTarget {
    LockTarget {
        mode,
        target_voltage: v,
    }
}

fn ramp_up(x: i64) -> f32 {
    2.0 * x as f32 / 65_535.0
}

fn ramp_down(x: i64) -> f32 {
    2.0 - ramp_up(x)
}

fn hill(x: i64) -> f32 {
    let u = (x - 30_000) as f32 / 10_000.0;
    (2.0 - u * u).max(0.0)
}

fn valley(x: i64) -> f32 {
    let u = (x - 30_000) as f32 / 10_000.0;
    0.1 + u * u
}

#[rstest]
#[case(LockMode::QuadPlus, ramp_up as fn(i64) -> f32, 20_000)]
#[case(LockMode::QuadPlus, ramp_up as fn(i64) -> f32, 50_000)]
#[case(LockMode::QuadMinus, ramp_down as fn(i64) -> f32, 20_000)]
#[case(LockMode::QuadMinus, ramp_down as fn(i64) -> f32, 50_000)]
fn quadrature_law_converges_in_distance_over_gain(
    #[case] mode: LockMode,
    #[case] response: fn(i64) -> f32,
    #[case] start: i64,
) {
    let sim = SimulatedModulator::with_response(response);
    let mut p = rig(&sim);
    let mut st = start_at(&mut p, start);
    let tuning = TuningParams::default();
    let out = track(&mut p, &mut st, &target(mode, 1.0), &tuning, 4096).unwrap();

    let TrackOutcome::Converged { iterations } = out else {
        panic!("expected convergence, got {out:?}");
    };
    let distance = (start - 32_768).unsigned_abs() as u32;
    assert!(iterations <= distance / tuning.gain() + 1, "{iterations}");
    assert!((st.current_voltage - 1.0).abs() <= tuning.tolerance_v());
}

#[test]
fn quadrature_law_on_wrong_slope_saturates() {
    let sim = SimulatedModulator::with_response(ramp_down);
    let mut p = rig(&sim);
    let mut st = start_at(&mut p, 20_000);
    let out = track(
        &mut p,
        &mut st,
        &target(LockMode::QuadPlus, 1.0),
        &TuningParams::default(),
        4096,
    )
    .unwrap();
    assert!(matches!(out, TrackOutcome::Saturated { rail: Rail::Min, .. }));
    assert_eq!(st.current_step, Step::MIN);
}

#[test]
fn quadrature_budget_is_respected() {
    let sim = SimulatedModulator::with_response(ramp_up);
    let mut p = rig(&sim);
    let mut st = start_at(&mut p, 10_000);
    let out = track(
        &mut p,
        &mut st,
        &target(LockMode::QuadPlus, 1.0),
        &TuningParams::default(),
        5,
    )
    .unwrap();
    assert_eq!(out, TrackOutcome::Exhausted);
    assert_eq!(st.current_step.get(), 10_040);
}

#[rstest]
#[case(LockMode::Peak, hill as fn(i64) -> f32, 2.0, 20_000)]
#[case(LockMode::Peak, hill as fn(i64) -> f32, 2.0, 40_000)]
#[case(LockMode::Null, valley as fn(i64) -> f32, 0.1, 20_000)]
#[case(LockMode::Null, valley as fn(i64) -> f32, 0.1, 40_000)]
fn extremum_law_converges_from_either_side(
    #[case] mode: LockMode,
    #[case] response: fn(i64) -> f32,
    #[case] extremum_v: f32,
    #[case] start: i64,
) {
    let sim = SimulatedModulator::with_response(response);
    let mut p = rig(&sim);
    let mut st = start_at(&mut p, start);
    let tuning = TuningParams::default();
    let out = track(&mut p, &mut st, &target(mode, extremum_v), &tuning, 2048).unwrap();

    assert!(matches!(out, TrackOutcome::Converged { .. }), "{out:?}");
    assert!((st.current_voltage - extremum_v).abs() <= tuning.tolerance_v());
    // sqrt(0.05) * 10_000
    assert!((st.current_step.get() - 30_000).abs() <= 2_237);
    let expected = if start < 30_000 {
        Direction::Up
    } else {
        Direction::Down
    };
    assert_eq!(st.direction, Some(expected));
}

#[rstest]
#[case(1, 31_008)]
#[case(4, 31_032)]
fn overshoot_reverses_after_buffer_worsening_steps(#[case] buffer: u32, #[case] highest: u16) {
    let sim = SimulatedModulator::with_response(hill);
    let mut p = rig(&sim);
    let mut st = start_at(&mut p, 31_000);
    let t = target(LockMode::Peak, 2.0);
    st.direction = Some(Direction::Up);
    st.last_difference = Some(t.difference(st.current_voltage));

    let mut tuning = TuningParams::default();
    tuning.set_tolerance(0.001).unwrap();
    tuning.set_peak_buffer(buffer).unwrap();
    let out = track(&mut p, &mut st, &t, &tuning, 2048).unwrap();

    assert!(matches!(out, TrackOutcome::Converged { .. }), "{out:?}");
    let (_, tap) = p.into_parts();
    assert_eq!(tap.highest, highest);
    assert_eq!(st.direction, Some(Direction::Down));
}

#[test]
fn slope_check_repeats_across_a_plateau() {
    // 64-code plateaus on a hill centred at 30_000.
    let sim = SimulatedModulator::with_response(|x| 2.0 - ((x - 30_000).abs() / 64) as f32 * 0.001);
    let mut p = rig(&sim);
    let mut st = start_at(&mut p, 20_000);
    let out = track(
        &mut p,
        &mut st,
        &target(LockMode::Peak, 2.0),
        &TuningParams::default(),
        2048,
    )
    .unwrap();
    assert!(matches!(out, TrackOutcome::Converged { .. }));
    assert_eq!(st.direction, Some(Direction::Up));
}

#[test]
fn slope_check_gives_up_after_bounded_repeats() {
    let sim = SimulatedModulator::with_response(|_| 1.0);
    let mut p = rig(&sim);
    let mut st = start_at(&mut p, 1_000);
    let out = track(
        &mut p,
        &mut st,
        &target(LockMode::Peak, 2.0),
        &TuningParams::default(),
        MAX_SLOPE_CHECKS,
    )
    .unwrap();
    assert_eq!(out, TrackOutcome::Exhausted);
    assert_eq!(st.current_step.get(), 1_000 + 8 * MAX_SLOPE_CHECKS as i32);
    assert_eq!(st.direction, Some(Direction::Down));
}

#[test]
fn slope_check_goes_down_from_the_top_rail() {
    let sim = SimulatedModulator::with_response(|x| x as f32 / 65_535.0);
    let mut p = rig(&sim);
    let mut st = start_at(&mut p, 65_535);
    let out = track(
        &mut p,
        &mut st,
        &target(LockMode::Null, 0.5),
        &TuningParams::default(),
        4096,
    )
    .unwrap();
    assert!(matches!(out, TrackOutcome::Converged { .. }), "{out:?}");
    assert!(st.current_step.get() < 65_535);
}

#[test]
fn already_within_tolerance_does_not_move() {
    let sim = SimulatedModulator::with_response(hill);
    let mut p = rig(&sim);
    let mut st = start_at(&mut p, 30_000);
    let writes = sim.writes();
    let out = track(
        &mut p,
        &mut st,
        &target(LockMode::Peak, 2.0),
        &TuningParams::default(),
        2048,
    )
    .unwrap();
    assert_eq!(out, TrackOutcome::Converged { iterations: 0 });
    assert_eq!(sim.writes(), writes);
}
