//! # Jellyfish Rockets
//!
//! Cells grow, launch in a random direction and burn out, leaving an
//! exhaust trail that fades from red to blue.
//!
//! Pass a spawn chance per tick as the first argument (default `0.15`).
//!
//! Run with: `cargo run --example jellyfish_rockets --release -- 0.3`

use plasma_lab::config::JellyfishConfig;
use plasma_lab::prelude::*;

fn main() -> Result<(), AppError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let spawn_chance = std::env::args()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(0.15);

    let config = LabConfig {
        scene: SceneKind::JellyfishRockets,
        jellyfish: JellyfishConfig {
            spawn_chance,
            ..JellyfishConfig::default()
        },
        ..LabConfig::default()
    };

    plasma_lab::app::run(config)
}
