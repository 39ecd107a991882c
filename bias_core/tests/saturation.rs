use bias_config::TuningParams;
use bias_core::plant::Plant;
use bias_core::saturation::{acquire_from_rails, recover};
use bias_core::{BiasController, LockError, LockMode, LockStatus, LockTarget, Rail, Step};
use bias_hardware::{SimParams, SimulatedModulator};
use proptest::prelude::*;

#[test]
fn recovery_starts_from_the_opposite_rail() {
    let sim = SimulatedModulator::new(SimParams::default());
    let (s, a) = sim.split();
    let mut p = Plant::new(s, a);
    let t = LockTarget {
        mode: LockMode::QuadPlus,
        target_voltage: 1.0,
    };
    let r = recover(&mut p, &t, Rail::Min, &TuningParams::default(), 16).unwrap();
    // Rising crossing just below the top rail, found walking down.
    assert!(r.step.get() > 65_000, "step {}", r.step);
}

#[test]
fn falls_back_to_the_hit_rail() {
    // A spike only the stride grid anchored at code 0 lands on; walking
    // down from 65535 samples codes 15 mod 16 and misses it.
    let sim = SimulatedModulator::with_response(|x| if (32..=34).contains(&x) { 2.0 } else { 0.5 });
    let (s, a) = sim.split();
    let mut p = Plant::new(s, a);
    let t = LockTarget {
        mode: LockMode::Peak,
        target_voltage: 2.0,
    };
    let r = recover(&mut p, &t, Rail::Min, &TuningParams::default(), 16).unwrap();
    assert_eq!(r.step.get(), 32);
}

#[test]
fn both_rails_failing_is_unreachable_not_a_hang() {
    let sim = SimulatedModulator::with_response(|x| 2.0 - 2.0 * x as f32 / 65_535.0);
    let (s, a) = sim.split();
    let mut p = Plant::new(s, a);
    let t = LockTarget {
        mode: LockMode::QuadPlus,
        target_voltage: 1.0,
    };
    let err = acquire_from_rails(&mut p, &t, Rail::Max, &TuningParams::default(), 16).unwrap_err();
    assert_eq!(
        err.downcast_ref::<LockError>(),
        Some(&LockError::Unreachable {
            mode: LockMode::QuadPlus
        })
    );
    // Two bounded walks and nothing more.
    assert!(sim.writes() <= 2 * 4096);
}

#[test]
fn drift_past_the_rail_reacquires_through_the_controller() {
    let sim = SimulatedModulator::new(SimParams::default());
    let (s, a) = sim.split();
    let mut c = BiasController::builder()
        .with_sensor(s)
        .with_actuator(a)
        .build()
        .unwrap();
    c.lock(LockMode::QuadPlus).unwrap();
    assert!(c.state().current_step.get() < 100);

    sim.set_drift(2_000);
    assert_eq!(c.step().unwrap(), LockStatus::Reacquired);
    assert_eq!(c.step().unwrap(), LockStatus::Converged);
    assert!(c.state().current_step.get() > 60_000);
}

fn any_mode() -> impl Strategy<Value = LockMode> {
    prop::sample::select(LockMode::ALL.to_vec())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn step_stays_in_range_under_any_drift(mode in any_mode(), drift in -40_000i64..40_000) {
        let sim = SimulatedModulator::new(SimParams::default());
        let (s, a) = sim.split();
        let mut c = BiasController::builder()
            .with_sensor(s)
            .with_actuator(a)
            .build()
            .unwrap();
        c.lock(mode).unwrap();
        sim.set_drift(drift);
        for _ in 0..3 {
            let status = c.step().unwrap();
            prop_assert!(!matches!(status, LockStatus::Aborted(_)), "{:?}", status);
            let step = c.state().current_step.get();
            prop_assert!((0..=65_535).contains(&step));
            prop_assert_eq!(sim.step(), c.state().current_step.code());
        }
    }

    #[test]
    fn saturating_moves_never_leave_the_range(
        start in 0i64..=65_535,
        deltas in prop::collection::vec(-70_000i32..70_000, 1..64),
    ) {
        let mut s = Step::new(start).unwrap();
        for d in deltas {
            if let Some(next) = s.checked_offset(d) {
                prop_assert!((0..=65_535).contains(&next.get()));
            }
            s = s.saturating_offset(d);
            prop_assert!((0..=65_535).contains(&s.get()));
        }
    }
}
