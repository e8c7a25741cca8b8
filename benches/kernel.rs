//! Benchmarks for the CPU reference kernel and the jellyfish world.
//!
//! Run with: `cargo bench --bench kernel`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::SeedableRng;

use plasma_lab::kernel::{
    field_columns, seed_instances, step_drift, step_particle, MassInstance,
};
use plasma_lab::mass::{MassTable, MASS_CAPACITY};
use plasma_lab::spawner::Spawner;
use plasma_lab::systems::{jellyfish_schedule, jellyfish_world, JellyfishSettings};
use plasma_lab::Vec2;

const DT: f32 = 1.0 / 60.0;

fn ring_masses(count: usize) -> Vec<MassInstance> {
    (0..count)
        .map(|i| {
            let angle = i as f32 / count as f32 * std::f32::consts::TAU;
            MassInstance {
                pos: Vec2::new(angle.cos(), angle.sin()) * 0.5,
                mass: if i % 2 == 0 { 0.3 } else { -0.2 },
            }
        })
        .collect()
}

fn bench_step_particle(c: &mut Criterion) {
    let mut group = c.benchmark_group("step_particle");
    let spawner = Spawner::default();

    for mass_count in [0, 4, MASS_CAPACITY] {
        group.bench_with_input(
            BenchmarkId::new("masses", mass_count),
            &mass_count,
            |b, &mass_count| {
                let masses = ring_masses(mass_count);
                let mut rng = StdRng::seed_from_u64(7);
                let mut particles = seed_instances(10_000, &spawner, &mut rng);
                b.iter(|| {
                    for p in particles.iter_mut() {
                        step_particle(p, &masses, Vec2::ZERO, &spawner, DT, &mut rng);
                    }
                    black_box(&particles);
                })
            },
        );
    }

    group.finish();
}

fn bench_step_drift(c: &mut Criterion) {
    let masses = ring_masses(8);
    let mut rng = StdRng::seed_from_u64(11);
    let mut particles = field_columns(10_000, &mut rng);

    c.bench_function("step_drift", |b| {
        b.iter(|| {
            for p in particles.iter_mut() {
                step_drift(p, &masses, DT);
            }
            black_box(&particles);
        })
    });
}

fn bench_mass_table_pack(c: &mut Criterion) {
    let masses = ring_masses(MASS_CAPACITY);
    let mut table = MassTable::new();

    c.bench_function("mass_table_pack", |b| {
        b.iter(|| black_box(table.pack(masses.iter().copied())))
    });
}

fn bench_jellyfish_tick(c: &mut Criterion) {
    let mut world = jellyfish_world(JellyfishSettings::default(), 3);
    let mut schedule = jellyfish_schedule();
    // Let a population build up first
    for _ in 0..600 {
        schedule.run(&mut world);
    }

    c.bench_function("jellyfish_tick", |b| b.iter(|| schedule.run(&mut world)));
}

criterion_group!(
    benches,
    bench_step_particle,
    bench_step_drift,
    bench_mass_table_pack,
    bench_jellyfish_tick,
);
criterion_main!(benches);
