//! # Plasma Ring
//!
//! Four spawners around a repelling center mass, with a pair of attractors
//! pulling the streams into loops.
//!
//! ## Controls
//!
//! - `S` / `M` add a spawner / mass at the pointer
//! - `X` / `Y` mirror the selected spawner
//! - `Tab` cycles the selection, `Delete` removes it
//! - hold the left or right button to pull particles towards the pointer
//!
//! Run with: `cargo run --example plasma --release`
//! (add `--features egui` for the control panels)

use std::f32::consts::FRAC_PI_2;

use plasma_lab::config::{MassConfig, PlasmaConfig, SpawnerConfig};
use plasma_lab::prelude::*;

fn ring_spawner(index: usize) -> SpawnerConfig {
    let angle = index as f32 * FRAC_PI_2;
    SpawnerConfig {
        pos: Vec2::new(angle.cos(), angle.sin()) * 0.7,
        spawner: Spawner {
            initial_vel: InitialVelocity {
                // Tangent to the ring
                direction: angle + FRAC_PI_2,
                spread: 0.3,
                min_speed: 0.2,
                max_speed: 0.45,
            },
            radius: 0.04,
            lifetime: 8.0,
        },
    }
}

fn main() -> Result<(), AppError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = LabConfig {
        scene: SceneKind::Plasma,
        seed: Some(42),
        plasma: PlasmaConfig {
            particles_per_spawner: 32_768,
            spawners: (0..4).map(ring_spawner).collect(),
            masses: vec![
                MassConfig {
                    pos: Vec2::ZERO,
                    mass: Mass(-0.2),
                },
                MassConfig {
                    pos: Vec2::new(0.4, 0.4),
                    mass: Mass(0.35),
                },
                MassConfig {
                    pos: Vec2::new(-0.4, -0.4),
                    mass: Mass(0.35),
                },
            ],
        },
        ..LabConfig::default()
    };

    plasma_lab::app::run(config)
}
