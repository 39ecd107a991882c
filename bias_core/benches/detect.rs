use bias_core::{Sample, Step, SweepCurve, detect};
use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};

// Three periods of 1 + sin with additive white noise, one sample per 16 codes.
fn synth_curve(n: usize, noise_amp: f32, seed: u32) -> SweepCurve {
    let mut state = seed.max(1);
    let mut next_f32 = || {
        let mut x = state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        state = x;
        (x as f32) / (u32::MAX as f32 + 1.0)
    };
    let stride = 65_536 / n as i64;
    let samples = (0..n)
        .map(|i| {
            let phase = std::f32::consts::TAU * 3.0 * i as f32 / n as f32;
            let noise = (next_f32() * 2.0 - 1.0) * noise_amp;
            Sample {
                step: Step::new(i as i64 * stride).unwrap_or(Step::MAX),
                voltage: (1.0 + phase.sin() + noise).max(0.0),
            }
        })
        .collect();
    SweepCurve::from_samples(samples).unwrap()
}

pub fn bench_detect(c: &mut Criterion) {
    let clean = synth_curve(4096, 0.0, 1);
    let noisy = synth_curve(4096, 0.02, 7);

    c.bench_function("detect_4096_clean", |b| {
        b.iter(|| detect(black_box(&clean), black_box(0.01)))
    });
    c.bench_function("detect_4096_noisy", |b| {
        b.iter_batched(
            || noisy.clone(),
            |curve| detect(black_box(&curve), black_box(0.01)),
            BatchSize::SmallInput,
        )
    });
}

criterion_group!(benches, bench_detect);
criterion_main!(benches);
