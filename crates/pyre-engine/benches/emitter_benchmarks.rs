//! Update-loop benchmarks at realistic populations.
//!
//! Measures one 16 ms step of a warmed-up emitter at steady-state populations
//! of 1K and 10K particles, with and without neighbour-aware rules (collision
//! is O(n^2) against the frame snapshot and dominates at scale).
//!
//! Run with: `cargo bench --bench emitter_benchmarks`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use glam::Vec3;
use pyre_engine::prelude::*;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Build an emitter and warm it up to roughly `population` live particles.
fn warmed_emitter(population: u64, with_collision: bool) -> (Emitter, Pool<Particle>) {
    let mut pool = Pool::new();
    let mut emitter = Emitter::new()
        .with_seed(0xBEEF)
        .with_rate(Rate::new(Span::Value(population as f32), Span::Value(0.0)));
    emitter.add_initializer(Initializer::life(Span::Value(f32::INFINITY)));
    emitter.add_initializer(Initializer::position(
        ZoneConfig::Box {
            min: Vec3::splat(-500.0),
            max: Vec3::splat(500.0),
        }
        .build()
        .expect("static zone"),
    ));
    emitter.add_initializer(Initializer::radial_velocity(
        Vec3::Y,
        Span::Range(0.01, 0.1),
        60.0,
    ));
    emitter.add_behaviour(Behaviour::gravity(0.0001));
    emitter.add_behaviour(Behaviour::alpha(Span::Value(1.0), Span::Value(0.0)));
    if with_collision {
        emitter.add_behaviour(Behaviour::collision(0.5, false));
    }
    emitter.emit(Some(population), None);
    emitter.update(0.0, &mut pool);
    assert_eq!(emitter.particle_count() as u64, population);
    (emitter, pool)
}

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

fn bench_update_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("emitter_update");
    for population in [1_000u64, 10_000] {
        group.bench_with_input(
            BenchmarkId::new("kinematic", population),
            &population,
            |b, &population| {
                let (mut emitter, mut pool) = warmed_emitter(population, false);
                b.iter(|| {
                    emitter.update(black_box(16.0), &mut pool);
                });
            },
        );
    }
    // Collision is quadratic; keep it to the small population.
    group.bench_with_input(
        BenchmarkId::new("with_collision", 1_000u64),
        &1_000u64,
        |b, &population| {
            let (mut emitter, mut pool) = warmed_emitter(population, true);
            b.iter(|| {
                emitter.update(black_box(16.0), &mut pool);
            });
        },
    );
    group.finish();
}

fn bench_spawn_burst(c: &mut Criterion) {
    c.bench_function("spawn_1k_burst_from_warm_pool", |b| {
        let (mut emitter, mut pool) = warmed_emitter(1_000, false);
        b.iter(|| {
            // Kill and respawn the whole population through the pool.
            emitter.destroy(&mut pool);
            emitter.emit(Some(1_000), None);
            emitter.update(black_box(0.0), &mut pool);
        });
    });
}

fn bench_json_build(c: &mut Criterion) {
    let json = r#"{
        "seed": 7,
        "rate": { "numPan": [2, 5], "timePan": 50 },
        "initializers": [
            { "type": "Life", "life": [500, 1500] },
            { "type": "Position", "zone": { "type": "Sphere", "center": [0, 0, 0], "radius": 5 } },
            { "type": "RadialVelocity", "direction": [0, 1, 0], "speed": [0.1, 0.4], "theta": 30 }
        ],
        "behaviours": [
            { "type": "Gravity", "gravity": 0.001 },
            { "type": "Alpha", "from": 1.0, "to": 0.0, "easing": "outQuad" }
        ]
    }"#;
    c.bench_function("build_emitter_from_json", |b| {
        b.iter(|| {
            let emitter = Emitter::from_json(black_box(json)).expect("valid recipe");
            black_box(emitter.initializers().len());
        });
    });
}

criterion_group!(
    benches,
    bench_update_step,
    bench_spawn_burst,
    bench_json_build
);
criterion_main!(benches);
