// ─────────────────────────────────────────────────────────────────────
// SCPN Beam Core — Integrator Benchmark
// © 1998–2026 Miroslav Šotek. All rights reserved.
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────

use beam_core::factory::{FieldContext, FieldObjects};
use beam_core::integrator::{IntegratorSet, IntegratorType};
use beam_core::recipe::FieldRecipe;
use beam_field::types::FieldType;
use beam_types::config::{StepperSettings, Units};
use beam_types::state::{Particle, PhaseState};
use beam_types::strength::StrengthTable;
use criterion::{criterion_group, criterion_main, Criterion};
use nalgebra::Vector3;
use std::hint::black_box;

const BRHO: f64 = 4.333;

fn build(field_type: FieldType, strength: &[(&str, f64)], integrator: Option<IntegratorType>) -> FieldObjects {
    let ctx = FieldContext::new(Units::default(), StepperSettings::default(), IntegratorSet::BdsimTwo)
        .expect("default settings are valid");
    let mut recipe = FieldRecipe::new("bench", field_type)
        .with_brho(BRHO)
        .with_strength(StrengthTable::from_pairs(strength.iter().copied()).expect("valid keys"));
    if let Some(integrator) = integrator {
        recipe = recipe.with_integrator(integrator);
    }
    ctx.build(&recipe).expect("recipe should build")
}

fn start() -> (Particle, PhaseState) {
    let particle = Particle::proton();
    let p = particle.momentum_for_rigidity(BRHO);
    let y = PhaseState::new(
        Vector3::new(0.002, -0.001, 0.0),
        Vector3::new(0.001, 0.0005, 1.0).normalize() * p,
    );
    (particle, y)
}

fn bench_steps(c: &mut Criterion) {
    let mut group = c.benchmark_group("integrator_step");
    let (particle, y) = start();
    let dydx = PhaseState::zero();

    let quad = build(FieldType::Quadrupole, &[("k1", 0.34)], None);
    group.bench_function("quadrupole", |b| {
        b.iter(|| black_box(quad.integrator.step(&particle, black_box(&y), &dydx, 0.1)))
    });

    let solenoid = build(FieldType::Solenoid, &[("ks", 0.2)], None);
    group.bench_function("solenoid", |b| {
        b.iter(|| black_box(solenoid.integrator.step(&particle, black_box(&y), &dydx, 0.1)))
    });

    let thin = build(
        FieldType::Multipole,
        &[("k1", 0.05), ("k2", 1.0), ("k3", 10.0)],
        Some(IntegratorType::MultipoleThin),
    );
    group.bench_function("multipole_thin", |b| {
        b.iter(|| black_box(thin.integrator.step(&particle, black_box(&y), &dydx, 1e-6)))
    });

    let rk4 = build(FieldType::Quadrupole, &[("k1", 0.34)], Some(IntegratorType::Rk4));
    group.bench_function("rk4_fallback", |b| {
        b.iter(|| black_box(rk4.integrator.step(&particle, black_box(&y), &dydx, 0.1)))
    });

    group.finish();
}

fn bench_tracking(c: &mut Criterion) {
    let mut group = c.benchmark_group("integrator_track");
    let (particle, y0) = start();
    let dydx = PhaseState::zero();
    let quad = build(FieldType::Quadrupole, &[("k1", 0.34), ("length", 0.5)], None);

    group.bench_function("quadrupole_100_steps", |b| {
        b.iter(|| {
            let mut y = y0;
            for _ in 0..100 {
                y = quad.integrator.step(&particle, &y, &dydx, 0.005).state;
            }
            black_box(y.position.x)
        })
    });

    group.finish();
}

criterion_group!(benches, bench_steps, bench_tracking);
criterion_main!(benches);
