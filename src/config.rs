//! Run configuration.
//!
//! Everything here can be loaded from a JSON file; missing keys fall back to
//! the defaults, so a config only needs the values it changes:
//!
//! ```json
//! {
//!   "scene": "plasma-field",
//!   "time_scale": 0.5,
//!   "plasma_field": { "particle_count": 65536 }
//! }
//! ```

use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::f32::consts::PI;
use std::fs;
use std::path::Path;

use crate::kernel::{DriftInstance, ParticleInstance};
use crate::mass::Mass;
use crate::scenes::SceneKind;
use crate::shaders::WORKGROUP_SIZE;
use crate::spawner::{InitialVelocity, Spawner};
use crate::{ConfigError, GpuInstance};

/// Complete run configuration.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LabConfig {
    pub scene: SceneKind,
    pub window: WindowConfig,
    /// Simulation speed multiplier (1.0 = normal, 0.5 = half speed).
    pub time_scale: f32,
    /// Seed for every scene RNG. `None` seeds from entropy.
    pub seed: Option<u64>,
    /// Pull of the pointer while hovering; doubled while a button is held.
    pub mouse_strength: f32,
    pub plasma: PlasmaConfig,
    pub plasma_field: PlasmaFieldConfig,
    pub explosions: ExplosionConfig,
    pub jellyfish: JellyfishConfig,
}

impl Default for LabConfig {
    fn default() -> Self {
        Self {
            scene: SceneKind::Plasma,
            window: WindowConfig::default(),
            time_scale: 1.0,
            seed: None,
            mouse_strength: 1.0,
            plasma: PlasmaConfig::default(),
            plasma_field: PlasmaFieldConfig::default(),
            explosions: ExplosionConfig::default(),
            jellyfish: JellyfishConfig::default(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "plasma-lab".into(),
            width: 1000,
            height: 1000,
        }
    }
}

/// A spawner placed at startup.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct SpawnerConfig {
    pub pos: Vec2,
    #[serde(flatten)]
    pub spawner: Spawner,
}

/// A mass placed at startup.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct MassConfig {
    pub pos: Vec2,
    #[serde(default)]
    pub mass: Mass,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PlasmaConfig {
    pub particles_per_spawner: u32,
    pub spawners: Vec<SpawnerConfig>,
    pub masses: Vec<MassConfig>,
}

impl Default for PlasmaConfig {
    fn default() -> Self {
        let left = Spawner {
            initial_vel: InitialVelocity {
                direction: PI / 2.0,
                spread: 0.4,
                min_speed: 0.3,
                max_speed: 0.6,
            },
            radius: 0.05,
            lifetime: 10.0,
        };
        Self {
            particles_per_spawner: 65_535,
            spawners: vec![
                SpawnerConfig {
                    pos: Vec2::new(-0.5, -0.5),
                    spawner: left,
                },
                SpawnerConfig {
                    pos: Vec2::new(0.5, -0.5),
                    spawner: left.mirrored_x(),
                },
            ],
            masses: vec![MassConfig {
                pos: Vec2::new(0.0, 0.3),
                mass: Mass(0.5),
            }],
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PlasmaFieldConfig {
    pub particle_count: u32,
    pub masses: Vec<MassConfig>,
}

impl Default for PlasmaFieldConfig {
    fn default() -> Self {
        Self {
            particle_count: 65_535 * 4,
            masses: vec![MassConfig {
                pos: Vec2::ZERO,
                mass: Mass(0.25),
            }],
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ExplosionConfig {
    pub particle_count: u32,
    /// Largest per-frame velocity component of a burst particle.
    pub spread: f32,
}

impl Default for ExplosionConfig {
    fn default() -> Self {
        Self {
            particle_count: 65_535,
            spread: 0.002,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct JellyfishConfig {
    pub spawn_chance: f32,
    pub trail_page_size: usize,
    pub cell_capacity: usize,
}

impl Default for JellyfishConfig {
    fn default() -> Self {
        Self {
            spawn_chance: 0.06,
            trail_page_size: 1000,
            cell_capacity: 200,
        }
    }
}

/// Most records of `T` one storage buffer can hold and one dispatch can
/// cover under the default device limits.
pub fn max_particles<T: GpuInstance>() -> u32 {
    let limits = wgpu::Limits::default();
    let by_binding = u64::from(limits.max_storage_buffer_binding_size) / u64::from(T::SIZE);
    let by_dispatch =
        u64::from(limits.max_compute_workgroups_per_dimension) * u64::from(WORKGROUP_SIZE);
    by_binding.min(by_dispatch).min(u64::from(u32::MAX)) as u32
}

fn check_count(field: &'static str, count: u32, max: u32) -> Result<(), ConfigError> {
    if count > max {
        return Err(ConfigError::TooManyParticles { field, count, max });
    }
    Ok(())
}

impl LabConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject particle counts the GPU buffers or dispatches cannot hold.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_count(
            "plasma.particles_per_spawner",
            self.plasma.particles_per_spawner,
            max_particles::<ParticleInstance>(),
        )?;
        check_count(
            "plasma_field.particle_count",
            self.plasma_field.particle_count,
            max_particles::<DriftInstance>(),
        )?;
        check_count(
            "explosions.particle_count",
            self.explosions.particle_count,
            max_particles::<DriftInstance>(),
        )
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load a configuration from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Save this configuration to a JSON file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = LabConfig::from_json(
            r#"{ "scene": "plasma-field", "plasma_field": { "particle_count": 1024 } }"#,
        )
        .unwrap();
        assert_eq!(config.scene, SceneKind::PlasmaField);
        assert_eq!(config.plasma_field.particle_count, 1024);
        assert_eq!(config.plasma_field.masses.len(), 1);
        assert_eq!(config.time_scale, 1.0);
        assert_eq!(config.jellyfish.cell_capacity, 200);
    }

    #[test]
    fn test_spawner_entries_are_flat() {
        let config = LabConfig::from_json(
            r#"{ "plasma": { "spawners": [
                { "pos": [0.1, 0.2], "radius": 0.1, "initial_vel": { "direction": 1.0 } }
            ] } }"#,
        )
        .unwrap();
        let entry = config.plasma.spawners[0];
        assert_eq!(entry.pos, Vec2::new(0.1, 0.2));
        assert_eq!(entry.spawner.radius, 0.1);
        assert_eq!(entry.spawner.lifetime, 25.0);
        assert_eq!(entry.spawner.initial_vel.direction, 1.0);
        assert_eq!(entry.spawner.initial_vel.max_speed, 0.1);
        assert_eq!(config.plasma.particles_per_spawner, 65_535);
    }

    #[test]
    fn test_mass_defaults_to_one() {
        let config =
            LabConfig::from_json(r#"{ "plasma": { "masses": [ { "pos": [0.0, 0.0] } ] } }"#)
                .unwrap();
        assert_eq!(config.plasma.masses[0].mass, Mass(1.0));
    }

    #[test]
    fn test_unknown_scene_is_rejected() {
        let err = LabConfig::from_json(r#"{ "scene": "fireworks" }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
    }

    #[test]
    fn test_json_survives_save_and_load() {
        let path = std::env::temp_dir().join("plasma_lab_config_test.json");
        let mut config = LabConfig::default();
        config.seed = Some(7);
        config.scene = SceneKind::JellyfishRockets;
        config.save(&path).unwrap();

        let loaded = LabConfig::load(&path).unwrap();
        let _ = fs::remove_file(&path);
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_particle_limits() {
        assert_eq!(max_particles::<ParticleInstance>(), 4_194_304);
        assert_eq!(max_particles::<DriftInstance>(), 8_388_608);
        assert!(LabConfig::default().validate().is_ok());
    }

    #[test]
    fn test_oversized_particle_counts_are_rejected() {
        let err =
            LabConfig::from_json(r#"{ "plasma": { "particles_per_spawner": 4194305 } }"#)
                .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::TooManyParticles {
                field: "plasma.particles_per_spawner",
                count: 4_194_305,
                max: 4_194_304,
            }
        ));

        let err = LabConfig::from_json(r#"{ "explosions": { "particle_count": 4000000000 } }"#)
            .unwrap_err();
        assert!(matches!(err, ConfigError::TooManyParticles { .. }));

        let config =
            LabConfig::from_json(r#"{ "plasma_field": { "particle_count": 8388608 } }"#).unwrap();
        assert_eq!(config.plasma_field.particle_count, 8_388_608);
    }

    #[test]
    fn test_default_spawners_are_mirrored() {
        let plasma = PlasmaConfig::default();
        let [left, right] = [plasma.spawners[0], plasma.spawners[1]];
        assert_eq!(right.pos, Vec2::new(-left.pos.x, left.pos.y));
        assert!((right.spawner.initial_vel.direction - PI / 2.0).abs() < 1e-5);
    }
}
