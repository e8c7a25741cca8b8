//! # Headless Kernel
//!
//! Runs the CPU reference kernel and the jellyfish world without a window
//! and logs what the populations look like after a few simulated seconds.
//! Handy for checking tuning changes on a machine without a GPU.
//!
//! Run with: `RUST_LOG=debug cargo run --example headless_kernel`

use plasma_lab::components::{Cell, TrailParticle};
use plasma_lab::kernel::{seed_instances, step_particle};
use plasma_lab::mass::MassTable;
use plasma_lab::prelude::*;
use plasma_lab::systems::{jellyfish_schedule, jellyfish_world, JellyfishSettings};
use rand::rngs::StdRng;
use rand::SeedableRng;

const DT: f32 = 1.0 / 60.0;
const SECONDS: usize = 10;

fn run_plasma(config: &LabConfig, rng: &mut StdRng) {
    let mut table = MassTable::new();
    table.pack(config.plasma.masses.iter().map(|m| MassInstance {
        pos: m.pos,
        mass: m.mass.0,
    }));
    let masses: Vec<MassInstance> = table.active().collect();

    for (i, sc) in config.plasma.spawners.iter().enumerate() {
        let mut particles = seed_instances(4096, &sc.spawner, rng);
        for _ in 0..SECONDS * 60 {
            for p in particles.iter_mut() {
                step_particle(p, &masses, sc.pos, &sc.spawner, DT, rng);
            }
        }

        let born: Vec<_> = particles.iter().filter(|p| p.born != 0).collect();
        let mean_speed =
            born.iter().map(|p| p.vel.length()).sum::<f32>() / born.len().max(1) as f32;
        log::info!(
            "spawner {}: {}/{} born, mean speed {:.3}",
            i + 1,
            born.len(),
            particles.len(),
            mean_speed
        );
    }
}

fn run_jellyfish(seed: u64) {
    let mut world = jellyfish_world(JellyfishSettings::default(), seed);
    let mut schedule = jellyfish_schedule();

    for second in 1..=SECONDS {
        for _ in 0..60 {
            schedule.run(&mut world);
        }
        let cells = world.query::<&Cell>().iter(&world).count();
        let trails = world.query::<&TrailParticle>().iter(&world).count();
        log::debug!("t={}s cells={} trails={}", second, cells, trails);
    }

    let cells = world.query::<&Cell>().iter(&world).count();
    let trails = world.query::<&TrailParticle>().iter(&world).count();
    log::info!("jellyfish after {}s: {} cells, {} trails", SECONDS, cells, trails);
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = LabConfig::default();
    let mut rng = StdRng::seed_from_u64(1);
    run_plasma(&config, &mut rng);
    run_jellyfish(1);
}
